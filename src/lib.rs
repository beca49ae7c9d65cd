pub mod browser;
pub mod cli;
pub mod clipboard;
pub mod consts;
pub mod error;
pub mod event;
pub mod filter;
pub mod launcher;
pub mod node;
pub mod provider;
pub mod selection;
pub mod store;
pub mod subcmds;
pub mod tree;
pub mod ui;
pub mod unlock;
pub mod util;

pub use error::{Result, VaultError};
