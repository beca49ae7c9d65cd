//! Credential hierarchy as reported by `key list --output json`.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::UNTITLED;
use crate::error::{Result, VaultError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Group(Group),
    Entry(Entry),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    // older front ends spelled this "entires"
    #[serde(default, alias = "entires")]
    pub entries: Vec<Node>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub has_otp: bool,
}

impl Node {
    pub fn uuid(&self) -> &str {
        match self {
            Node::Group(group) => &group.uuid,
            Node::Entry(entry) => &entry.uuid,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Node::Group(group) => group.title.as_deref(),
            Node::Entry(entry) => entry.title.as_deref(),
        }
    }

    /// The title, or "Untitled" when the provider did not report one.
    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNTITLED)
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Node::Entry(entry) => Some(entry),
            Node::Group(_) => None,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.as_entry().is_some()
    }

    /// Depth-first search through this node and its descendants.
    pub fn find(&self, uuid: &str) -> Option<&Node> {
        if self.uuid() == uuid {
            return Some(self);
        }

        match self {
            Node::Group(group) => group.entries.iter().find_map(|child| child.find(uuid)),
            Node::Entry(_) => None,
        }
    }
}

impl Entry {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED)
    }
}

// `{:?}` on an entry ends up in log lines and test failures
impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Entry")
            .field("uuid", &self.uuid)
            .field("title", &self.title)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("website", &self.website)
            .field("notes", &self.notes.as_ref().map(|_| "<redacted>"))
            .field("has_otp", &self.has_otp)
            .finish()
    }
}

/// Finds `uuid` anywhere in `nodes`, including inside groups.
pub fn find<'a>(nodes: &'a [Node], uuid: &str) -> Option<&'a Node> {
    nodes.iter().find_map(|node| node.find(uuid))
}

/// Every entry in `nodes`, groups flattened, in snapshot order.
pub fn entries(nodes: &[Node]) -> Vec<&Entry> {
    let mut out = Vec::new();
    collect_entries(nodes, &mut out);

    out
}

fn collect_entries<'a>(nodes: &'a [Node], out: &mut Vec<&'a Entry>) {
    for node in nodes {
        match node {
            Node::Group(group) => collect_entries(&group.entries, out),
            Node::Entry(entry) => out.push(entry),
        }
    }
}

/// Parses one `list` snapshot.
///
/// The top level must be a JSON array and every uuid must be unique across
/// the whole hierarchy, since the uuid is what joins a list row to its
/// detail fetch.
pub fn decode_snapshot<V>(bytes: V) -> Result<Vec<Node>>
where
    V: AsRef<[u8]>,
{
    let nodes: Vec<Node> = serde_json::from_slice(bytes.as_ref())?;
    let mut seen = HashSet::new();
    check_unique(&nodes, &mut seen)?;

    Ok(nodes)
}

fn check_unique<'a>(nodes: &'a [Node], seen: &mut HashSet<&'a str>) -> Result<()> {
    for node in nodes {
        if !seen.insert(node.uuid()) {
            return Err(VaultError::Decode(format!(
                "duplicate uuid {} in snapshot",
                node.uuid()
            )));
        }

        if let Node::Group(group) = node {
            check_unique(&group.entries, seen)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"[
        {"type": "group", "uuid": "g1", "title": "Root", "entries": [
            {"type": "entry", "uuid": "e3", "title": "Nested"}
        ]},
        {"type": "entry", "uuid": "e1", "title": "GitHub", "user": "alice", "has_otp": true},
        {"type": "entry", "uuid": "e2"}
    ]"#;

    #[test]
    fn decodes_tagged_nodes() {
        let nodes = decode_snapshot(SNAPSHOT).unwrap();

        assert_eq!(nodes.len(), 3);
        assert!(!nodes[0].is_entry());
        assert_eq!(nodes[0].title(), Some("Root"));

        let github = nodes[1].as_entry().unwrap();
        assert_eq!(github.user.as_deref(), Some("alice"));
        assert!(github.has_otp);

        let untitled = nodes[2].as_entry().unwrap();
        assert!(!untitled.has_otp);
        assert_eq!(nodes[2].display_title(), "Untitled");
    }

    #[test]
    fn finds_nested_nodes() {
        let nodes = decode_snapshot(SNAPSHOT).unwrap();

        assert_eq!(find(&nodes, "e3").map(Node::display_title), Some("Nested"));
        assert!(find(&nodes, "missing").is_none());

        let titles: Vec<_> = entries(&nodes).iter().map(|e| e.display_title()).collect();
        assert_eq!(titles, ["Nested", "GitHub", "Untitled"]);
    }

    #[test]
    fn accepts_misspelled_children() {
        let nodes = decode_snapshot(
            r#"[{"type": "group", "uuid": "g", "entires": [{"type": "entry", "uuid": "e"}]}]"#,
        )
        .unwrap();

        assert!(find(&nodes, "e").is_some());
    }

    #[test]
    fn rejects_malformed_output() {
        for bad in &[
            "not json",
            r#"{"type": "entry", "uuid": "e1"}"#,
            r#"[{"type": "folder", "uuid": "f1"}]"#,
            r#"[{"type": "entry", "uuid": "e1", "has_otp": "yes"}]"#,
            r#"[{"type": "entry", "uuid": "e1"}, {"type": "entry", "uuid": "e1"}]"#,
        ] {
            match decode_snapshot(bad) {
                Err(VaultError::Decode(_)) => {}
                other => panic!("expected a decode error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let entry = Entry {
            uuid: "e1".into(),
            password: Some("hunter2".into()),
            notes: Some("pin 1234".into()),
            ..Entry::default()
        };
        let debug = format!("{:?}", entry);

        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("1234"));
        assert!(debug.contains("<redacted>"));
    }
}
