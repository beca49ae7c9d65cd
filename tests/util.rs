use keyview::browser::Secret;
use keyview::error::{Result, VaultError};
use keyview::node::{self, Entry, Node};
use keyview::provider::CredentialProvider;
use keyview::util;

struct Fixed(Vec<Node>);

impl CredentialProvider for Fixed {
    fn list(&self) -> Result<Vec<Node>> {
        Ok(self.0.clone())
    }

    fn get(&self, uuid: &str) -> Result<Entry> {
        node::find(&self.0, uuid)
            .and_then(Node::as_entry)
            .cloned()
            .ok_or_else(|| VaultError::NoMatchesFound(uuid.to_owned()))
    }

    fn otp(&self, uuid: &str) -> Result<String> {
        Ok(format!("otp-{}", uuid))
    }

    fn unlock(&self, _: &str) -> Result<()> {
        Ok(())
    }
}

fn provider() -> Fixed {
    Fixed(
        node::decode_snapshot(
            r#"[
                {"type": "group", "uuid": "g1", "title": "Personal", "entries": [
                    {"type": "entry", "uuid": "e1", "title": "Bank", "password": "b4nk"}
                ]},
                {"type": "entry", "uuid": "e2", "title": "Forum"}
            ]"#,
        )
        .unwrap(),
    )
}

#[test]
fn resolve_by_title_then_fetch() {
    let provider = provider();
    let nodes = provider.list().unwrap();

    let entry = util::resolve(&nodes, "Bank").unwrap();
    assert_eq!(entry.uuid, "e1");
    assert_eq!(
        util::secret(&provider, &entry.uuid, Secret::Password).unwrap(),
        "b4nk"
    );
    assert_eq!(
        util::secret(&provider, "e1", Secret::Otp).unwrap(),
        "otp-e1"
    );
}

#[test]
fn missing_password_is_an_error() {
    let provider = provider();

    assert!(matches!(
        util::secret(&provider, "e2", Secret::Password),
        Err(VaultError::NoPassword(title)) if title == "Forum"
    ));
}

#[test]
fn groups_cannot_be_shown() {
    let nodes = provider().list().unwrap();

    assert!(matches!(
        util::resolve(&nodes, "g1"),
        Err(VaultError::NotAnEntry(title)) if title == "Personal"
    ));
    assert!(matches!(
        util::resolve(&nodes, "bank"),
        Err(VaultError::NoMatchesFound(name)) if name == "bank"
    ));
}
