use tracing_subscriber::EnvFilter;

use crate::browser::Secret;
use crate::consts::KEY_LOG;
use crate::error::{Result, VaultError};
use crate::node::{Entry, Node};
use crate::provider::CredentialProvider;

/// Installs the stderr subscriber. `KEY_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = KEY_LOG
        .as_deref()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    // a second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Finds the entry a user named on the command line: by uuid first, then
/// by exact title anywhere in the hierarchy.
pub fn resolve<'a, S>(nodes: &'a [Node], name: S) -> Result<&'a Entry>
where
    S: AsRef<str>,
{
    let name = name.as_ref();
    let node = crate::node::find(nodes, name)
        .or_else(|| find_by_title(nodes, name))
        .ok_or_else(|| VaultError::NoMatchesFound(name.to_owned()))?;

    node.as_entry()
        .ok_or_else(|| VaultError::NotAnEntry(node.display_title().to_owned()))
}

fn find_by_title<'a>(nodes: &'a [Node], title: &str) -> Option<&'a Node> {
    nodes.iter().find_map(|node| {
        if node.title() == Some(title) {
            return Some(node);
        }
        match node {
            Node::Group(group) => find_by_title(&group.entries, title),
            Node::Entry(_) => None,
        }
    })
}

/// Fetches the password or current one-time password of entry `uuid`.
pub fn secret(provider: &dyn CredentialProvider, uuid: &str, which: Secret) -> Result<String> {
    match which {
        Secret::Password => {
            let entry = provider.get(uuid)?;
            entry
                .password
                .ok_or_else(|| VaultError::NoPassword(entry.title.unwrap_or_else(|| uuid.to_owned())))
        }
        Secret::Otp => provider.otp(uuid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Group;

    fn nodes() -> Vec<Node> {
        vec![
            Node::Group(Group {
                uuid: "g1".into(),
                title: Some("Work".into()),
                entries: vec![Node::Entry(Entry {
                    uuid: "e1".into(),
                    title: Some("GitHub".into()),
                    ..Entry::default()
                })],
            }),
            Node::Entry(Entry {
                uuid: "GitHub".into(),
                title: Some("Bank".into()),
                ..Entry::default()
            }),
        ]
    }

    #[test]
    fn resolves_uuid_before_title() {
        let nodes = nodes();

        assert_eq!(resolve(&nodes, "e1").unwrap().uuid, "e1");
        // "GitHub" is both a uuid and a title
        assert_eq!(resolve(&nodes, "GitHub").unwrap().uuid, "GitHub");
        assert_eq!(resolve(&nodes, "Bank").unwrap().uuid, "GitHub");
    }

    #[test]
    fn resolve_errors() {
        let nodes = nodes();

        assert!(matches!(
            resolve(&nodes, "Work"),
            Err(VaultError::NotAnEntry(title)) if title == "Work"
        ));
        assert!(matches!(
            resolve(&nodes, "github"),
            Err(VaultError::NoMatchesFound(_))
        ));
    }
}
