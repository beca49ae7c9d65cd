//! Vault browser state
//!
//! # browser
//!
//! [`Browser`] is the single owner of everything the browser shows: the
//! unlock gate, the snapshot and detail, the filter and the selection.
//! Front ends feed it [`Msg`]s one at a time through [`Browser::update`] and
//! carry out the [`Command`]s it hands back; provider results come back in
//! as further messages. Nothing in here blocks or talks to the provider.

use tracing::debug;

use crate::error::{Result, VaultError};
use crate::filter::{self, FilterMode};
use crate::node::{Entry, Node};
use crate::selection::SelectionController;
use crate::store::{FetchTicket, VaultStore};
use crate::unlock::UnlockGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    Password,
    Otp,
}

impl Secret {
    pub fn describe(self) -> &'static str {
        match self {
            Secret::Password => "password",
            Secret::Otp => "one-time password",
        }
    }
}

#[derive(Debug)]
pub enum Msg {
    // unlock form
    PasswordInput(char),
    PasswordBackspace,
    SubmitPassword,
    // list
    FilterInput(char),
    FilterBackspace,
    SetFilter(String),
    ToggleLiteral,
    Next,
    Prev,
    Select(String),
    Refresh,
    Copy(Secret),
    // provider results
    Unlocked(Result<()>),
    Loaded(Result<Vec<Node>>),
    Detail(FetchTicket, Result<Entry>),
    Copied(Secret, anyhow::Result<()>),
}

/// Side effects for the front end to run.
pub enum Command {
    Unlock(String),
    Refresh,
    FetchDetail(FetchTicket),
    Copy { uuid: String, secret: Secret },
}

// the unlock password must not end up in logs
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Command::Unlock(_) => f.write_str("Unlock(<redacted>)"),
            Command::Refresh => f.write_str("Refresh"),
            Command::FetchDetail(ticket) => f.debug_tuple("FetchDetail").field(ticket).finish(),
            Command::Copy { uuid, secret } => f
                .debug_struct("Copy")
                .field("uuid", uuid)
                .field("secret", secret)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug)]
pub struct Browser {
    gate: UnlockGate,
    store: VaultStore,
    selection: SelectionController,
    filter: String,
    mode: FilterMode,
    visible: Vec<Node>,
    filter_error: Option<String>,
    password: String,
    loading: bool,
    status: Option<Status>,
}

impl Browser {
    pub fn new(gate: UnlockGate) -> Self {
        Browser {
            gate,
            store: VaultStore::new(),
            selection: SelectionController::new(),
            filter: String::new(),
            mode: FilterMode::default(),
            visible: Vec::new(),
            filter_error: None,
            password: String::new(),
            loading: false,
            status: None,
        }
    }

    /// Commands to run when the view mounts.
    pub fn start(&mut self) -> Vec<Command> {
        if self.gate.is_unlocked() {
            self.loading = true;
            vec![Command::Refresh]
        } else {
            Vec::new()
        }
    }

    pub fn gate(&self) -> &UnlockGate {
        &self.gate
    }

    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    pub fn visible(&self) -> &[Node] {
        &self.visible
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.selected()
    }

    /// Row of the selection in [`Browser::visible`], if it is listed.
    pub fn selected_row(&self) -> Option<usize> {
        self.selection.position()
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.store.find(self.selected()?)
    }

    /// Detail of the selected entry, once its fetch has landed.
    pub fn detail(&self) -> Option<&Entry> {
        self.store.detail()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Why the current filter text matches nothing, if it does not compile.
    pub fn filter_error(&self) -> Option<&str> {
        self.filter_error.as_deref()
    }

    /// Length of the password typed so far, for masking.
    pub fn password_len(&self) -> usize {
        self.password.chars().count()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::PasswordInput(c) => {
                self.password.push(c);
                Vec::new()
            }
            Msg::PasswordBackspace => {
                self.password.pop();
                Vec::new()
            }
            Msg::SubmitPassword => self.submit_password(),
            Msg::Unlocked(result) => {
                self.gate.resolve(&result);
                if self.gate.is_unlocked() {
                    self.status = None;
                    self.loading = true;
                    vec![Command::Refresh]
                } else {
                    Vec::new()
                }
            }
            _ if !self.gate.is_unlocked() => {
                debug!("ignoring message while locked");
                Vec::new()
            }
            Msg::FilterInput(c) => {
                self.filter.push(c);
                self.refilter();
                Vec::new()
            }
            Msg::FilterBackspace => {
                self.filter.pop();
                self.refilter();
                Vec::new()
            }
            Msg::SetFilter(text) => {
                self.filter = text;
                self.refilter();
                Vec::new()
            }
            Msg::ToggleLiteral => {
                self.mode = match self.mode {
                    FilterMode::Pattern => FilterMode::Literal,
                    FilterMode::Literal => FilterMode::Pattern,
                };
                self.refilter();
                Vec::new()
            }
            Msg::Next => {
                let moved = self.selection.move_next().map(ToOwned::to_owned);
                moved.map(|uuid| self.select_node(&uuid)).unwrap_or_default()
            }
            Msg::Prev => {
                let moved = self.selection.move_prev().map(ToOwned::to_owned);
                moved.map(|uuid| self.select_node(&uuid)).unwrap_or_default()
            }
            Msg::Select(uuid) => match self.selection.select(&uuid) {
                Ok(()) => self.select_node(&uuid),
                Err(e) => {
                    debug!("{}", e);
                    Vec::new()
                }
            },
            // one list at a time, so snapshots land in the order they were asked for
            Msg::Refresh if self.loading => Vec::new(),
            Msg::Refresh => {
                self.loading = true;
                vec![Command::Refresh]
            }
            Msg::Loaded(_) if !self.loading => {
                debug!("ignoring unrequested snapshot");
                Vec::new()
            }
            Msg::Loaded(result) => self.loaded(result),
            Msg::Detail(ticket, result) => {
                if let Err(e) = self.store.apply_detail(&ticket, result) {
                    self.status = Some(Status::Error(e.to_string()));
                }
                Vec::new()
            }
            Msg::Copy(secret) => self.copy(secret),
            Msg::Copied(secret, result) => {
                self.status = Some(match result {
                    Ok(()) => Status::Info(format!("Copied {} to clipboard", secret.describe())),
                    Err(e) => Status::Error(format!("{:#}", e)),
                });
                Vec::new()
            }
        }
    }

    fn submit_password(&mut self) -> Vec<Command> {
        if self.password.is_empty() || !self.gate.begin() {
            return Vec::new();
        }

        vec![Command::Unlock(std::mem::take(&mut self.password))]
    }

    fn loaded(&mut self, result: Result<Vec<Node>>) -> Vec<Command> {
        self.loading = false;
        let nodes = match result {
            Ok(nodes) => nodes,
            Err(e) => {
                self.status = Some(Status::Error(e.to_string()));
                return Vec::new();
            }
        };

        self.store.replace_snapshot(nodes);
        self.status = None;
        self.refilter();

        let initial = self.selection.init(self.store.snapshot()).map(ToOwned::to_owned);
        match initial {
            Some(uuid) => self.select_node(&uuid),
            None => Vec::new(),
        }
    }

    /// Selecting an entry always fetches its detail, even when it is
    /// already the selected one. Groups have no detail to fetch.
    fn select_node(&mut self, uuid: &str) -> Vec<Command> {
        match self.store.find(uuid) {
            Some(Node::Entry(_)) => vec![Command::FetchDetail(self.store.begin_fetch(uuid))],
            _ => {
                self.store.clear_detail(Some(uuid));
                Vec::new()
            }
        }
    }

    fn copy(&mut self, secret: Secret) -> Vec<Command> {
        let entry = match self.selected_node() {
            Some(Node::Entry(entry)) => entry,
            Some(node) => {
                let err = VaultError::NotAnEntry(node.display_title().to_owned());
                self.status = Some(Status::Error(err.to_string()));
                return Vec::new();
            }
            None => {
                let err = match self.selected() {
                    Some(uuid) => VaultError::NoMatchesFound(uuid.to_owned()),
                    None => VaultError::NoSelection,
                };
                self.status = Some(Status::Error(err.to_string()));
                return Vec::new();
            }
        };

        if secret == Secret::Otp && !entry.has_otp {
            let err = VaultError::NoOtp(entry.display_title().to_owned());
            self.status = Some(Status::Error(err.to_string()));
            return Vec::new();
        }

        vec![Command::Copy {
            uuid: entry.uuid.clone(),
            secret,
        }]
    }

    fn refilter(&mut self) {
        self.visible = filter::visible_with(self.store.snapshot(), &self.filter, self.mode);
        self.selection.set_visible(&self.visible);
        self.filter_error = filter::matcher(&self.filter, self.mode)
            .err()
            .map(|e| e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uuid: &str, title: &str, has_otp: bool) -> Node {
        Node::Entry(Entry {
            uuid: uuid.into(),
            title: Some(title.into()),
            has_otp,
            ..Entry::default()
        })
    }

    fn snapshot() -> Vec<Node> {
        vec![
            Node::Group(crate::node::Group {
                uuid: "g1".into(),
                title: Some("Root".into()),
                entries: Vec::new(),
            }),
            entry("e1", "GitHub", true),
            entry("e2", "Bank", false),
        ]
    }

    fn loaded() -> Browser {
        let mut browser = Browser::new(UnlockGate::unlocked());
        browser.start();
        browser.update(Msg::Loaded(Ok(snapshot())));
        browser
    }

    fn fetched(commands: &[Command]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::FetchDetail(ticket) => Some(ticket.uuid.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unlocked_start_refreshes() {
        let mut browser = Browser::new(UnlockGate::unlocked());
        let commands = browser.start();

        assert!(matches!(commands.as_slice(), [Command::Refresh]));
        assert!(browser.is_loading());
    }

    #[test]
    fn locked_start_waits_for_password() {
        let mut browser = Browser::new(UnlockGate::locked());
        assert!(browser.start().is_empty());

        // list messages are ignored until unlocked
        assert!(browser.update(Msg::Refresh).is_empty());
        assert!(browser.update(Msg::SubmitPassword).is_empty());

        for c in "pw".chars() {
            browser.update(Msg::PasswordInput(c));
        }
        assert_eq!(browser.password_len(), 2);

        match browser.update(Msg::SubmitPassword).as_slice() {
            [Command::Unlock(pw)] => assert_eq!(pw, "pw"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(browser.password_len(), 0);

        let failed = Err(VaultError::UnlockFailure("invalid credentials".into()));
        assert!(browser.update(Msg::Unlocked(failed)).is_empty());
        assert!(browser.gate().failure().is_some());

        browser.update(Msg::PasswordInput('x'));
        assert_eq!(browser.update(Msg::SubmitPassword).len(), 1);
        let commands = browser.update(Msg::Unlocked(Ok(())));
        assert!(matches!(commands.as_slice(), [Command::Refresh]));
    }

    #[test]
    fn first_load_selects_first_entry() {
        let mut browser = Browser::new(UnlockGate::unlocked());
        browser.start();
        let commands = browser.update(Msg::Loaded(Ok(snapshot())));

        assert_eq!(browser.selected(), Some("e1"));
        assert_eq!(fetched(&commands), ["e1"]);
        assert!(!browser.is_loading());
    }

    #[test]
    fn failed_load_keeps_snapshot() {
        let mut browser = loaded();
        browser.update(Msg::Refresh);
        let err = VaultError::Provider {
            command: "key list --output json".into(),
            reason: "database locked".into(),
        };
        browser.update(Msg::Loaded(Err(err)));

        assert_eq!(browser.visible().len(), 3);
        assert!(matches!(browser.status(), Some(Status::Error(msg)) if msg.contains("database locked")));
    }

    #[test]
    fn filtering_keeps_selection() {
        let mut browser = loaded();
        for c in "bank".chars() {
            browser.update(Msg::FilterInput(c));
        }

        let uuids: Vec<_> = browser.visible().iter().map(Node::uuid).collect();
        assert_eq!(uuids, ["e2"]);
        assert_eq!(browser.selected(), Some("e1"));
        assert_eq!(browser.selected_row(), None);

        let commands = browser.update(Msg::Next);
        assert_eq!(fetched(&commands), ["e2"]);
        assert_eq!(browser.selected_row(), Some(0));
    }

    #[test]
    fn invalid_pattern_reports_and_recovers() {
        let mut browser = loaded();
        browser.update(Msg::SetFilter("(".into()));

        assert!(browser.visible().is_empty());
        assert!(browser.filter_error().is_some());

        browser.update(Msg::ToggleLiteral);
        assert_eq!(browser.filter_error(), None);
        assert_eq!(browser.mode(), FilterMode::Literal);
    }

    #[test]
    fn selecting_a_group_fetches_nothing() {
        let mut browser = loaded();
        let commands = browser.update(Msg::Select("g1".into()));

        assert!(commands.is_empty());
        assert_eq!(browser.selected(), Some("g1"));
        assert!(browser.detail().is_none());
    }

    #[test]
    fn selection_outside_filter_is_ignored() {
        let mut browser = loaded();
        browser.update(Msg::SetFilter("git".into()));

        assert!(browser.update(Msg::Select("e2".into())).is_empty());
        assert_eq!(browser.selected(), Some("e1"));
    }

    #[test]
    fn reselecting_refetches() {
        let mut browser = loaded();

        assert_eq!(fetched(&browser.update(Msg::Select("e1".into()))), ["e1"]);
        assert_eq!(fetched(&browser.update(Msg::Select("e1".into()))), ["e1"]);
    }

    #[test]
    fn copy_checks_otp_capability() {
        let mut browser = loaded();
        match browser.update(Msg::Copy(Secret::Otp)).as_slice() {
            [Command::Copy { uuid, secret }] => {
                assert_eq!(uuid, "e1");
                assert_eq!(*secret, Secret::Otp);
            }
            other => panic!("unexpected {:?}", other),
        }

        browser.update(Msg::Select("e2".into()));
        assert!(browser.update(Msg::Copy(Secret::Otp)).is_empty());
        assert!(matches!(browser.status(), Some(Status::Error(_))));
        assert_eq!(browser.update(Msg::Copy(Secret::Password)).len(), 1);

        browser.update(Msg::Copied(Secret::Password, Ok(())));
        assert_eq!(
            browser.status(),
            Some(&Status::Info("Copied password to clipboard".into()))
        );
    }

    #[test]
    fn one_refresh_in_flight() {
        let mut browser = loaded();
        let newer = vec![entry("e3", "Mail", false)];

        assert!(matches!(browser.update(Msg::Refresh).as_slice(), [Command::Refresh]));
        assert!(browser.update(Msg::Refresh).is_empty());

        // the answer lands, then a straggler from an earlier list
        browser.update(Msg::Loaded(Ok(newer.clone())));
        assert!(browser.update(Msg::Loaded(Ok(snapshot()))).is_empty());

        assert_eq!(browser.store().snapshot(), newer.as_slice());
        assert!(!browser.is_loading());
        assert_eq!(browser.update(Msg::Refresh).len(), 1);
    }

    #[test]
    fn copy_reports_a_vanished_selection() {
        let mut browser = Browser::new(UnlockGate::unlocked());
        browser.start();
        browser.update(Msg::Loaded(Ok(Vec::new())));
        assert!(browser.update(Msg::Copy(Secret::Password)).is_empty());
        assert_eq!(
            browser.status(),
            Some(&Status::Error("Error: Nothing is selected".into()))
        );

        let mut browser = loaded();
        browser.update(Msg::Refresh);
        browser.update(Msg::Loaded(Ok(vec![entry("e2", "Bank", false)])));
        assert_eq!(browser.selected(), Some("e1"));

        assert!(browser.update(Msg::Copy(Secret::Password)).is_empty());
        assert_eq!(
            browser.status(),
            Some(&Status::Error("Error: No matches found for 'e1'".into()))
        );
    }
}
