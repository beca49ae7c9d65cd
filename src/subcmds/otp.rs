use anyhow::Result;

use crate::browser::Secret;
use crate::clipboard;
use crate::consts::KEYVIEW_CLIP_TIME;
use crate::error::VaultError;
use crate::provider::CredentialProvider;
use crate::util;

pub fn otp(provider: &dyn CredentialProvider, name: String, clip: bool) -> Result<()> {
    let nodes = provider.list()?;
    let entry = util::resolve(&nodes, &name)?;
    if !entry.has_otp {
        return Err(VaultError::NoOtp(entry.display_title().to_owned()).into());
    }

    let code = util::secret(provider, &entry.uuid, Secret::Otp)?;
    if clip {
        clipboard::clip_and_clear(&code, *KEYVIEW_CLIP_TIME)?;
        println!(
            "Copied OTP code for {} to the clipboard, which will clear in {} seconds.",
            entry.display_title(),
            *KEYVIEW_CLIP_TIME
        );
    } else {
        println!("{}", code);
    }

    Ok(())
}
