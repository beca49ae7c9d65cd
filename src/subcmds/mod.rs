pub(crate) mod browse;
pub(crate) mod find;
pub(crate) mod flow;
pub(crate) mod ls;
pub(crate) mod otp;
pub(crate) mod show;
pub(crate) mod unclip;
