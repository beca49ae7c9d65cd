use anyhow::Result;
use termion::style;

use crate::error::VaultError;
use crate::filter::{self, FilterMode};
use crate::node;
use crate::provider::CredentialProvider;

pub fn find(provider: &dyn CredentialProvider, pattern: String, literal: bool) -> Result<()> {
    let mode = if literal { FilterMode::Literal } else { FilterMode::Pattern };
    let matcher = filter::matcher(&pattern, mode)?;

    let nodes = provider.list()?;
    let matches = node::entries(&nodes)
        .into_iter()
        .filter(|entry| {
            entry
                .title
                .as_deref()
                .map_or(pattern.is_empty(), |title| matcher.matches_title(title))
        })
        .collect::<Vec<_>>();

    if matches.is_empty() {
        return Err(VaultError::NoMatchesFound(pattern).into());
    }

    // following gopass: straight up print the matches to stdout
    for entry in matches {
        match entry.user.as_deref() {
            Some(user) => println!(
                "{} {faint}{}{reset}",
                entry.display_title(),
                user,
                faint = style::Faint,
                reset = style::Reset
            ),
            None => println!("{}", entry.display_title()),
        }
    }

    Ok(())
}
