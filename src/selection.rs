use tracing::debug;

use crate::error::{Result, VaultError};
use crate::node::Node;

/// Tracks the highlighted node over the visible (filtered) list.
///
/// The selection is kept when a filter hides it; navigating from a hidden
/// selection starts over at the top of the visible list.
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Option<String>,
    visible: Vec<String>,
}

impl SelectionController {
    pub fn new() -> Self {
        SelectionController::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn visible_ids(&self) -> &[String] {
        &self.visible
    }

    /// Records the last computed visible list.
    pub fn set_visible(&mut self, nodes: &[Node]) {
        self.visible = nodes.iter().map(|node| node.uuid().to_owned()).collect();
    }

    /// Index of the selection within the visible list, if it is listed.
    pub fn position(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.visible.iter().position(|id| id == selected)
    }

    /// Picks the first entry of a freshly loaded snapshot, unless something
    /// is already selected. Returns the new selection.
    pub fn init(&mut self, snapshot: &[Node]) -> Option<&str> {
        if self.selected.is_some() {
            return None;
        }

        self.selected = snapshot
            .iter()
            .find(|node| node.is_entry())
            .map(|node| node.uuid().to_owned());
        debug!(selected = ?self.selected, "initial selection");

        self.selected.as_deref()
    }

    /// Moves one row down, stopping at the last row. Returns the selection
    /// if it changed.
    pub fn move_next(&mut self) -> Option<&str> {
        let target = match self.position() {
            Some(i) => (i + 1).min(self.visible.len().saturating_sub(1)),
            None => 0,
        };

        self.move_to(target)
    }

    /// Moves one row up, stopping at the first row. Returns the selection
    /// if it changed.
    pub fn move_prev(&mut self) -> Option<&str> {
        let target = match self.position() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };

        self.move_to(target)
    }

    fn move_to(&mut self, index: usize) -> Option<&str> {
        let target = self.visible.get(index)?;
        if self.selected.as_ref() == Some(target) {
            return None;
        }
        self.selected = Some(target.clone());

        self.selected.as_deref()
    }

    /// Selects `uuid`, which must be in the visible list.
    pub fn select(&mut self, uuid: &str) -> Result<()> {
        if !self.visible.iter().any(|id| id == uuid) {
            return Err(VaultError::Selection(uuid.to_owned()));
        }
        self.selected = Some(uuid.to_owned());

        Ok(())
    }
}
