use tracing::{info, warn};

use crate::error::{Result, VaultError};
use crate::provider::CredentialProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockState {
    Locked,
    Unlocking,
    Unlocked,
    Failed(String),
}

/// Password gate in front of the vault.
///
/// The password only passes through [`UnlockGate::submit`] (or the
/// caller's own provider call between [`UnlockGate::begin`] and
/// [`UnlockGate::resolve`]); the gate itself never holds on to it. Once
/// unlocked it stays unlocked for the session.
#[derive(Debug)]
pub struct UnlockGate {
    state: UnlockState,
}

impl UnlockGate {
    pub fn locked() -> Self {
        UnlockGate {
            state: UnlockState::Locked,
        }
    }

    /// A gate for a session whose password was configured up front.
    pub fn unlocked() -> Self {
        UnlockGate {
            state: UnlockState::Unlocked,
        }
    }

    pub fn state(&self) -> &UnlockState {
        &self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == UnlockState::Unlocked
    }

    /// The failure reason to show next to the password form.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            UnlockState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Starts a submission. Only `Locked` and `Failed` accept one; returns
    /// whether the caller should go ahead and call the provider.
    pub fn begin(&mut self) -> bool {
        match self.state {
            UnlockState::Locked | UnlockState::Failed(_) => {
                self.state = UnlockState::Unlocking;
                true
            }
            UnlockState::Unlocking | UnlockState::Unlocked => false,
        }
    }

    /// Finishes the submission started by [`UnlockGate::begin`].
    pub fn resolve(&mut self, result: &Result<()>) {
        if self.state != UnlockState::Unlocking {
            return;
        }

        self.state = match result {
            Ok(()) => {
                info!("vault unlocked");
                UnlockState::Unlocked
            }
            Err(e) => {
                warn!("unlock failed: {}", e);
                UnlockState::Failed(e.to_string())
            }
        };
    }

    /// Submits `password` to the provider and waits for the answer.
    ///
    /// Submitting to an unlocked gate is a no-op that never reaches the
    /// provider.
    pub fn submit(&mut self, provider: &dyn CredentialProvider, password: &str) -> Result<()> {
        if self.is_unlocked() {
            return Ok(());
        }
        if !self.begin() {
            return Err(VaultError::UnlockPending);
        }

        let result = provider.unlock(password);
        self.resolve(&result);

        result
    }
}
