use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::clipboard;
use crate::consts::KEYVIEW_UNCLIP_HASH;

/// Waits `timeout` seconds, then clears the clipboard if it still holds the
/// value whose digest was handed over in the environment.
pub fn unclip(timeout: u64, force: bool) -> Result<()> {
    if KEYVIEW_UNCLIP_HASH.is_empty() && !force {
        eprintln!(
            "Unclip is spawned in the background when you copy to your clipboard. \
             This should not be called by a user."
        );
        return Ok(());
    }

    thread::sleep(Duration::from_secs(timeout));

    let current = clipboard::digest_hex(clipboard::paste()?);
    if current != *KEYVIEW_UNCLIP_HASH && !force {
        debug!("clipboard changed since copying, leaving it alone");
        return Ok(());
    }

    clipboard::clear()?;
    info!("clipboard cleared");

    Ok(())
}
