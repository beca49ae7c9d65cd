use anyhow::Result;

use crate::browser::Secret;
use crate::clipboard;
use crate::consts::KEYVIEW_CLIP_TIME;
use crate::provider::CredentialProvider;
use crate::util;

pub fn show(provider: &dyn CredentialProvider, name: String, clip: bool) -> Result<()> {
    let nodes = provider.list()?;
    let entry = util::resolve(&nodes, &name)?;
    let password = util::secret(provider, &entry.uuid, Secret::Password)?;

    if clip {
        clipboard::clip_and_clear(&password, *KEYVIEW_CLIP_TIME)?;
        println!(
            "Copied {} to the clipboard, which will clear in {} seconds.",
            entry.display_title(),
            *KEYVIEW_CLIP_TIME
        );
    } else {
        println!("{}", password);
    }

    Ok(())
}
