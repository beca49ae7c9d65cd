use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Error: `{command}` failed: {reason}")]
    Provider { command: String, reason: String },
    #[error("Error: `{command}` timed out after {timeout:?}")]
    ProviderTimeout { command: String, timeout: Duration },
    #[error("Error: Malformed provider output: {0}")]
    Decode(String),
    #[error("Error: Invalid filter pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
    #[error("Error: {0} is not in the visible list")]
    Selection(String),
    #[error("Error: Nothing is selected")]
    NoSelection,
    #[error("Error: Failed to unlock: {0}")]
    UnlockFailure(String),
    #[error("Error: Unlock already in progress")]
    UnlockPending,
    #[error("Error: No matches found for '{0}'")]
    NoMatchesFound(String),
    #[error("Error: {0} is a group, not an entry")]
    NotAnEntry(String),
    #[error("Error: {0} has no password")]
    NoPassword(String),
    #[error("Error: {0} has no one-time password")]
    NoOtp(String),
    #[error("Error: {0} has no title the provider can address")]
    Untitled(String),
    #[error("Error: Failed to copy to the clipboard")]
    ClipFailed,
    #[error("Error: Failed to paste from the clipboard")]
    PasteFailed,
    #[error("Error: Unknown launcher method '{0}'")]
    UnknownMethod(String),
}

impl VaultError {
    /// Whether retrying the same provider call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::ProviderTimeout { .. })
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_keep_sub_second_precision() {
        let err = VaultError::ProviderTimeout {
            command: "key list --output json".into(),
            timeout: Duration::from_millis(200),
        };

        assert_eq!(
            err.to_string(),
            "Error: `key list --output json` timed out after 200ms"
        );
    }
}
