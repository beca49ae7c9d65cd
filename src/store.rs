//! Snapshot and detail state
//!
//! # store
//!
//! [`VaultStore`] owns the last `list` snapshot and the detail of the
//! selected entry. Detail fetches are split into [`VaultStore::begin_fetch`]
//! and [`VaultStore::apply_detail`] so the provider call can run elsewhere;
//! every fetch carries a generation number and only the newest one is
//! allowed to land.

use tracing::{debug, info};

use crate::error::Result;
use crate::node::{self, Entry, Node};
use crate::provider::CredentialProvider;

/// Identifies one detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub uuid: String,
}

#[derive(Debug, Default)]
pub struct VaultStore {
    snapshot: Vec<Node>,
    loaded: bool,
    selected: Option<String>,
    detail: Option<Entry>,
    generation: u64,
}

impl VaultStore {
    pub fn new() -> Self {
        VaultStore::default()
    }

    pub fn snapshot(&self) -> &[Node] {
        &self.snapshot
    }

    /// Whether any snapshot has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn detail(&self) -> Option<&Entry> {
        self.detail.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find(&self, uuid: &str) -> Option<&Node> {
        node::find(&self.snapshot, uuid)
    }

    /// Replaces the snapshot with a fresh `list`. On error the old snapshot
    /// stays in place.
    pub fn refresh(&mut self, provider: &dyn CredentialProvider) -> Result<&[Node]> {
        let nodes = provider.list()?;
        self.replace_snapshot(nodes);

        Ok(&self.snapshot)
    }

    pub fn replace_snapshot(&mut self, nodes: Vec<Node>) {
        info!(nodes = nodes.len(), "snapshot replaced");
        self.snapshot = nodes;
        self.loaded = true;
    }

    /// Marks `uuid` as selected and hands out the ticket for its detail
    /// fetch. The previous detail is dropped unless it belongs to the same
    /// entry.
    pub fn begin_fetch(&mut self, uuid: &str) -> FetchTicket {
        self.generation += 1;
        self.selected = Some(uuid.to_owned());
        if self.detail.as_ref().map_or(false, |d| d.uuid != uuid) {
            self.detail = None;
        }
        debug!(generation = self.generation, uuid, "detail fetch started");

        FetchTicket {
            generation: self.generation,
            uuid: uuid.to_owned(),
        }
    }

    /// Clears selection and detail without fetching anything, e.g. when a
    /// group is selected. Outstanding fetches become stale.
    pub fn clear_detail(&mut self, uuid: Option<&str>) {
        self.generation += 1;
        self.selected = uuid.map(ToOwned::to_owned);
        self.detail = None;
    }

    /// Applies the outcome of the fetch behind `ticket`.
    ///
    /// Returns `Ok(false)` for a stale ticket, whose result is discarded
    /// whatever it is. A failure of the newest fetch is returned and leaves
    /// the detail untouched.
    pub fn apply_detail(&mut self, ticket: &FetchTicket, result: Result<Entry>) -> Result<bool> {
        if ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                "stale detail discarded"
            );
            return Ok(false);
        }

        self.detail = Some(result?);

        Ok(true)
    }

    /// Selects `uuid` and fetches its detail right away.
    pub fn select_node(&mut self, provider: &dyn CredentialProvider, uuid: &str) -> Result<()> {
        let ticket = self.begin_fetch(uuid);
        let result = provider.get(uuid);
        self.apply_detail(&ticket, result)?;

        Ok(())
    }
}
