use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{Result, VaultError};
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// The filter text is a case-insensitive regular expression.
    Pattern,
    /// The filter text is matched as a plain case-insensitive substring.
    Literal,
}

impl Default for FilterMode {
    fn default() -> FilterMode {
        FilterMode::Pattern
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    All,
    Title(Regex),
}

impl Matcher {
    /// Only the title is considered; a node without one matches nothing
    /// but the empty filter.
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Title(_) => node.title().map_or(false, |title| self.matches_title(title)),
        }
    }

    pub fn matches_title(&self, title: &str) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Title(re) => re.is_match(title),
        }
    }
}

pub fn matcher<S>(text: S, mode: FilterMode) -> Result<Matcher>
where
    S: AsRef<str>,
{
    let text = text.as_ref();
    if text.is_empty() {
        return Ok(Matcher::All);
    }

    let pattern = match mode {
        FilterMode::Pattern => text.to_owned(),
        FilterMode::Literal => regex::escape(text),
    };

    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Matcher::Title)
        .map_err(|e| VaultError::Pattern {
            pattern: text.to_owned(),
            reason: e.to_string(),
        })
}

/// The nodes of `nodes` whose title matches `text`, in snapshot order.
pub fn visible<S>(nodes: &[Node], text: S) -> Vec<Node>
where
    S: AsRef<str>,
{
    visible_with(nodes, text, FilterMode::Pattern)
}

/// Like [`visible`], with an explicit [`FilterMode`]. An invalid pattern
/// matches nothing.
pub fn visible_with<S>(nodes: &[Node], text: S, mode: FilterMode) -> Vec<Node>
where
    S: AsRef<str>,
{
    match matcher(text, mode) {
        Ok(Matcher::All) => nodes.to_vec(),
        Ok(m) => nodes.iter().filter(|node| m.matches(node)).cloned().collect(),
        Err(e) => {
            debug!("{}", e);
            Vec::new()
        }
    }
}
