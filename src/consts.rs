//! Runtime constants
//!
//! # consts
//!
//! This module houses constants used throughout the code. Many of these are
//! just lazily-evaluated environment variables.

use std::env;

use once_cell::sync::Lazy;

pub const VERSION: &str = env!("KEYVIEW_VERSION");

// forwarded to every `key` invocation
pub const KEY_DATABASE_URL: &str = "KEY_DATABASE_URL";
pub const KEY_KEYFILE: &str = "KEY_KEYFILE";
pub const KEY_PASSWORD: &str = "KEY_PASSWORD";
pub const KEY_S3_ACCESS_KEY: &str = "KEY_S3_ACCESS_KEY";
pub const KEY_S3_SECRET_KEY: &str = "KEY_S3_SECRET_KEY";

pub const DEFAULT_BIN: &str = "key";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const UNTITLED: &str = "Untitled";
pub const ICON_PATH: &str = "Images\\key.png";
pub const UNCLIP_HASH_VAR: &str = "KEYVIEW_UNCLIP_HASH";

pub static KEY_LOG: Lazy<Option<String>> =
    Lazy::new(|| env::var("KEY_LOG").ok().filter(|level| !level.is_empty()));
pub static KEYVIEW_UNCLIP_HASH: Lazy<String> =
    Lazy::new(|| env::var(UNCLIP_HASH_VAR).unwrap_or_default());
pub static KEYVIEW_CLIP_TIME: Lazy<u64> = Lazy::new(|| {
    env::var("KEYVIEW_CLIP_TIME")
        .ok()
        .and_then(|secs| secs.parse::<u64>().ok())
        .unwrap_or(45)
});
pub static KEYVIEW_X_SELECTION: Lazy<String> =
    Lazy::new(|| match env::var("KEYVIEW_X_SELECTION") {
        Ok(sel) => match sel.as_ref() {
            "p" | "primary" => "primary".to_owned(),
            "sec" | "secondary" => "secondary".to_owned(),
            _ => "clipboard".to_owned(),
        },
        Err(_) => "clipboard".to_owned(),
    });
