use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use data_encoding::HEXLOWER;
use ring::digest;
use tracing::debug;

use crate::consts::{KEYVIEW_X_SELECTION, UNCLIP_HASH_VAR};
use crate::error::VaultError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Wayland,
    X11,
    MacOs,
}

fn backend() -> Option<Backend> {
    if env::var_os("WAYLAND_DISPLAY").is_some() {
        Some(Backend::Wayland)
    } else if env::var_os("DISPLAY").is_some() {
        Some(Backend::X11)
    } else if cfg!(target_os = "macos") {
        Some(Backend::MacOs)
    } else {
        None
    }
}

pub fn clip<S>(contents: S) -> Result<()>
where
    S: AsRef<[u8]>,
{
    let mut cmd = match backend() {
        Some(Backend::Wayland) => {
            let mut cmd = Command::new("wl-copy");
            cmd.arg("--trim-newline");
            cmd
        }
        Some(Backend::X11) => {
            let mut cmd = Command::new("xclip");
            cmd.args(&["-in", "-selection", KEYVIEW_X_SELECTION.as_str()]);
            cmd
        }
        Some(Backend::MacOs) => Command::new("pbcopy"),
        None => return Err(VaultError::ClipFailed.into()),
    };

    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;
    child
        .stdin
        .take()
        .with_context(|| "stdin wasn't captured")?
        .write_all(contents.as_ref())?;
    // wl-copy and xclip fork to keep serving the selection; the parent exits
    child.wait()?;

    Ok(())
}

pub fn paste() -> Result<Vec<u8>> {
    let output = match backend() {
        Some(Backend::Wayland) => Command::new("wl-paste")
            .arg("--no-newline")
            .output()
            .with_context(|| "Failed to spawn wl-paste")?,
        Some(Backend::X11) => Command::new("xclip")
            .args(&["-out", "-selection", KEYVIEW_X_SELECTION.as_str()])
            .output()
            .with_context(|| "Failed to spawn xclip")?,
        Some(Backend::MacOs) => Command::new("pbpaste")
            .output()
            .with_context(|| "Failed to spawn pbpaste")?,
        None => return Err(VaultError::PasteFailed.into()),
    };

    Ok(output.stdout)
}

pub fn clear() -> Result<()> {
    match backend() {
        Some(Backend::Wayland) => {
            Command::new("wl-copy")
                .arg("--clear")
                .status()
                .with_context(|| "Failed to spawn wl-copy")?;
        }
        _ => clip("")?,
    }

    Ok(())
}

/// Hex-encoded SHA-256 of `contents`, so the unclip process can tell whether
/// the clipboard still holds what we put there without ever seeing it.
pub fn digest_hex<S>(contents: S) -> String
where
    S: AsRef<[u8]>,
{
    HEXLOWER.encode(digest::digest(&digest::SHA256, contents.as_ref()).as_ref())
}

/// Copies `contents` and spawns `keyview unclip <timeout>` in the background
/// to clear it again.
pub fn clip_and_clear<S>(contents: S, timeout: u64) -> Result<()>
where
    S: AsRef<[u8]>,
{
    let contents = contents.as_ref();
    clip(contents)?;

    let hash = digest_hex(contents);
    let exe = env::current_exe().with_context(|| "Failed to locate the keyview executable")?;
    Command::new(exe)
        .args(&["unclip", &timeout.to_string()])
        .env(UNCLIP_HASH_VAR, hash)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| "Failed to spawn unclip")?;
    debug!(timeout, "clipboard clear scheduled");

    Ok(())
}
