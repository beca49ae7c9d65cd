//! Flow Launcher JSON-RPC plugin
//!
//! # launcher
//!
//! Flow Launcher runs the plugin once per request, passing a JSON object
//! `{"method": ..., "parameters": [...]}` as the first argument, and reads
//! the response from stdout. Two methods are served: `query`, which lists
//! the entries whose title contains the typed text, and
//! `copy_to_clipboard`, which Flow calls back with the uuid of the result
//! the user picked.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::browser::Secret;
use crate::clipboard;
use crate::consts::{ICON_PATH, KEYVIEW_CLIP_TIME};
use crate::error::VaultError;
use crate::filter::{self, FilterMode};
use crate::node::Node;
use crate::provider::CredentialProvider;
use crate::util;

pub const QUERY: &str = "query";
pub const COPY_TO_CLIPBOARD: &str = "copy_to_clipboard";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl Request {
    /// The first parameter as a string; missing or non-string parameters
    /// read as empty.
    pub fn first_param(&self) -> &str {
        self.parameters
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub result: Vec<ResultItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultItem {
    pub title: String,
    pub sub_title: String,
    #[serde(rename = "JsonRPCAction", skip_serializing_if = "Option::is_none")]
    pub json_rpc_action: Option<Action>,
    pub ico_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub method: String,
    pub parameters: Vec<String>,
}

/// One result per visible entry, in snapshot order.
pub fn query<S>(nodes: &[Node], text: S) -> Response
where
    S: AsRef<str>,
{
    let result = filter::visible_with(nodes, text.as_ref().trim(), FilterMode::Literal)
        .iter()
        .filter_map(Node::as_entry)
        .map(|entry| ResultItem {
            title: entry.display_title().to_owned(),
            sub_title: entry.user.clone().unwrap_or_default(),
            json_rpc_action: Some(Action {
                method: COPY_TO_CLIPBOARD.to_owned(),
                parameters: vec![entry.uuid.clone()],
            }),
            ico_path: ICON_PATH.to_owned(),
        })
        .collect();

    Response { result }
}

/// A single non-actionable result carrying the error message.
pub fn error_response(err: &anyhow::Error) -> Response {
    Response {
        result: vec![ResultItem {
            title: format!("{:#}", err),
            sub_title: "keyview".to_owned(),
            json_rpc_action: None,
            ico_path: ICON_PATH.to_owned(),
        }],
    }
}

/// Serves one request. `copy_to_clipboard` has nothing to show and answers
/// `None`.
pub fn handle(provider: &dyn CredentialProvider, request: &Request) -> anyhow::Result<Option<Response>> {
    debug!(method = %request.method, "launcher request");

    match request.method.as_str() {
        QUERY => {
            let nodes = provider.list()?;
            Ok(Some(query(&nodes, request.first_param())))
        }
        COPY_TO_CLIPBOARD => {
            let password = util::secret(provider, request.first_param(), Secret::Password)?;
            clipboard::clip_and_clear(password, *KEYVIEW_CLIP_TIME)?;
            Ok(None)
        }
        other => Err(VaultError::UnknownMethod(other.to_owned()).into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::{Entry, Group};

    fn nodes() -> Vec<Node> {
        vec![
            Node::Group(Group {
                uuid: "g1".into(),
                title: Some("Git things".into()),
                entries: Vec::new(),
            }),
            Node::Entry(Entry {
                uuid: "e1".into(),
                title: Some("GitHub".into()),
                user: Some("alice".into()),
                ..Entry::default()
            }),
            Node::Entry(Entry {
                uuid: "e2".into(),
                title: Some("Bank (old)".into()),
                ..Entry::default()
            }),
        ]
    }

    #[test]
    fn query_lists_matching_entries() {
        let response = query(&nodes(), "git");

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "result": [{
                    "Title": "GitHub",
                    "SubTitle": "alice",
                    "JsonRPCAction": {
                        "method": "copy_to_clipboard",
                        "parameters": ["e1"]
                    },
                    "IcoPath": "Images\\key.png"
                }]
            })
        );
    }

    #[test]
    fn query_is_a_plain_substring_match() {
        let titles: Vec<_> = query(&nodes(), "(old")
            .result
            .into_iter()
            .map(|item| item.title)
            .collect();
        assert_eq!(titles, ["Bank (old)"]);

        assert_eq!(query(&nodes(), "").result.len(), 2);
        assert_eq!(query(&nodes(), "  ").result.len(), 2);
    }

    #[test]
    fn parses_requests() {
        let request: Request =
            serde_json::from_str(r#"{"method":"query","parameters":["gi"]}"#).unwrap();
        assert_eq!(request.method, QUERY);
        assert_eq!(request.first_param(), "gi");

        let request: Request = serde_json::from_str(r#"{"method":"query"}"#).unwrap();
        assert_eq!(request.first_param(), "");
    }

    #[test]
    fn errors_become_a_result_item() {
        let err = anyhow::Error::from(VaultError::UnknownMethod("context_menu".into()));
        let value = serde_json::to_value(error_response(&err)).unwrap();

        assert_eq!(
            value["result"][0]["Title"],
            "Error: Unknown launcher method 'context_menu'"
        );
        assert!(value["result"][0].get("JsonRPCAction").is_none());
    }
}
