use std::sync::Arc;

use anyhow::Result;

use crate::provider::KeyBinary;
use crate::ui;
use crate::unlock::UnlockGate;

pub fn browse(provider: Arc<KeyBinary>) -> Result<()> {
    let gate = if provider.has_password() {
        UnlockGate::unlocked()
    } else {
        UnlockGate::locked()
    };

    ui::browse(provider, gate)
}
