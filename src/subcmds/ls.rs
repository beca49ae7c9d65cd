use anyhow::Result;

use crate::filter::{self, FilterMode};
use crate::provider::CredentialProvider;
use crate::tree;

pub fn ls(provider: &dyn CredentialProvider, filter: Option<String>, literal: bool) -> Result<()> {
    let nodes = provider.list()?;
    let nodes = match filter {
        Some(text) => {
            let mode = if literal { FilterMode::Literal } else { FilterMode::Pattern };
            // report a bad pattern instead of printing an empty tree
            filter::matcher(&text, mode)?;
            filter::visible_with(&nodes, text, mode)
        }
        None => nodes,
    };

    if nodes.is_empty() {
        // we don't show single-element trees
        return Ok(());
    }

    if termion::is_tty(&std::io::stdout()) {
        print!("{}", tree::tree(&nodes));
    } else {
        print!("{}", tree::tree(&nodes).plain());
    }

    Ok(())
}
