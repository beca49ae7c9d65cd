use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use ratatui::backend::TermionBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use termion::event::Key;
use termion::raw::IntoRawMode;
use termion::screen::IntoAlternateScreen;
use tracing::debug;

use crate::browser::{Browser, Command, Msg, Secret, Status};
use crate::clipboard;
use crate::consts::KEYVIEW_CLIP_TIME;
use crate::event::{Event, Events};
use crate::filter::FilterMode;
use crate::node::{Entry, Node};
use crate::provider::CredentialProvider;
use crate::unlock::{UnlockGate, UnlockState};
use crate::util;

const HINTS: &str = "<↑/↓> select, <Enter> copy password, <^O> copy OTP, <^R> refresh, <^L> literal, <Esc> quit";
const MASK: &str = "••••••••";

#[derive(Debug)]
pub enum Action {
    Quit,
    Update(Msg),
}

/// What a key press means in the browser's current state.
pub fn key_to_action(browser: &Browser, key: Key) -> Option<Action> {
    let msg = match key {
        Key::Esc | Key::Ctrl('c') => return Some(Action::Quit),
        _ if !browser.gate().is_unlocked() => match key {
            Key::Char('\n') => Msg::SubmitPassword,
            Key::Char(c) => Msg::PasswordInput(c),
            Key::Backspace => Msg::PasswordBackspace,
            _ => return None,
        },
        Key::Char('\n') => Msg::Copy(Secret::Password),
        Key::Ctrl('o') => Msg::Copy(Secret::Otp),
        Key::Ctrl('r') => Msg::Refresh,
        Key::Ctrl('l') => Msg::ToggleLiteral,
        Key::Up => Msg::Prev,
        Key::Down => Msg::Next,
        Key::Backspace => Msg::FilterBackspace,
        Key::Char(c) if !c.is_control() => Msg::FilterInput(c),
        _ => return None,
    };

    Some(Action::Update(msg))
}

/// +-Filter (regex)-------------+-------------------------------+
/// | git                                                        |
/// +----------------------------+-------------------------------+
/// | > GitHub                   | Title     GitHub              |
/// |   GitLab                   | User      alice               |
/// |                            | Password  ••••••••            |
/// +----------------------------+-------------------------------+
/// <↑/↓> select, <Enter> copy password, ...
pub fn browse(provider: Arc<dyn CredentialProvider>, gate: UnlockGate) -> Result<()> {
    let mut browser = Browser::new(gate);
    let events = Events::new();
    let mut list = ListState::default();

    // `terminal` gets dropped at the end of the scope, restoring the screen
    {
        let stdout = io::stdout().into_raw_mode()?.into_alternate_screen()?;
        let backend = TermionBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;

        dispatch(&provider, &events.sender(), browser.start());
        loop {
            list.select(browser.selected_row());
            terminal.draw(|frame| draw(frame, &browser, &mut list))?;

            let msg = match events.next()? {
                Event::Input(key) => match key_to_action(&browser, key) {
                    Some(Action::Quit) => break,
                    Some(Action::Update(msg)) => msg,
                    None => continue,
                },
                Event::Message(msg) => msg,
                Event::Tick => continue,
            };
            let commands = browser.update(msg);
            dispatch(&provider, &events.sender(), commands);
        }

        terminal.show_cursor()?;
    }

    Ok(())
}

/// Runs each command on its own worker thread and posts the outcome back.
fn dispatch(provider: &Arc<dyn CredentialProvider>, tx: &Sender<Event>, commands: Vec<Command>) {
    for command in commands {
        debug!(?command, "dispatch");
        let provider = Arc::clone(provider);
        let tx = tx.clone();

        thread::spawn(move || {
            let msg = match command {
                Command::Unlock(password) => Msg::Unlocked(provider.unlock(&password)),
                Command::Refresh => Msg::Loaded(provider.list()),
                Command::FetchDetail(ticket) => {
                    let result = provider.get(&ticket.uuid);
                    Msg::Detail(ticket, result)
                }
                Command::Copy { uuid, secret } => {
                    let result = util::secret(&*provider, &uuid, secret)
                        .map_err(anyhow::Error::from)
                        .and_then(|value| clipboard::clip_and_clear(value, *KEYVIEW_CLIP_TIME));
                    Msg::Copied(secret, result)
                }
            };
            // the receiver is gone once the user quit
            let _ = tx.send(Event::Message(msg));
        });
    }
}

pub fn draw(frame: &mut Frame, browser: &Browser, list: &mut ListState) {
    if browser.gate().is_unlocked() {
        draw_browser(frame, browser, list);
    } else {
        draw_unlock(frame, browser);
    }
}

fn draw_unlock(frame: &mut Frame, browser: &Browser) {
    let area = centered(frame.area(), 50, 7);

    let mut lines = vec![Line::from(vec![
        Span::raw("Password: "),
        Span::raw("*".repeat(browser.password_len())),
    ])];
    match browser.gate().state() {
        UnlockState::Unlocking => lines.push(Line::styled(
            "Unlocking...",
            Style::default().fg(Color::Yellow),
        )),
        UnlockState::Failed(reason) => {
            lines.push(Line::styled(reason.as_str(), Style::default().fg(Color::Red)))
        }
        UnlockState::Locked | UnlockState::Unlocked => {}
    }
    lines.push(Line::styled(
        "<Enter> unlock, <Esc> quit",
        Style::default().add_modifier(Modifier::DIM),
    ));

    let form = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Unlock vault ")
                .title_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(form, area);
}

fn draw_browser(frame: &mut Frame, browser: &Browser, list: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // filter
            Constraint::Min(3),    // list and detail
            Constraint::Length(1), // status
        ])
        .split(frame.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    draw_filter(frame, browser, chunks[0]);
    draw_list(frame, browser, list, body[0]);
    draw_detail(frame, browser, body[1]);
    draw_status(frame, browser, chunks[2]);
}

fn draw_filter(frame: &mut Frame, browser: &Browser, area: Rect) {
    let mode = match browser.mode() {
        FilterMode::Pattern => "regex",
        FilterMode::Literal => "literal",
    };
    let (title, style) = match browser.filter_error() {
        Some(_) => (format!(" Filter ({}, invalid) ", mode), Style::default().fg(Color::Red)),
        None => (format!(" Filter ({}) ", mode), Style::default()),
    };

    let filter = Paragraph::new(browser.filter())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(filter, area);
}

fn draw_list(frame: &mut Frame, browser: &Browser, list: &mut ListState, area: Rect) {
    let items: Vec<ListItem> = browser
        .visible()
        .iter()
        .map(|node| match node {
            Node::Group(_) => ListItem::new(Line::styled(
                format!("{}/", node.display_title()),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            )),
            Node::Entry(_) => ListItem::new(node.display_title()),
        })
        .collect();

    let title = format!(" {} of {} ", items.len(), browser.store().snapshot().len());
    let widget = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(widget, area, list);
}

fn field<'a>(name: &'a str, value: Option<&'a str>) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", name), Style::default().fg(Color::Cyan)),
        Span::raw(value.unwrap_or("")),
    ])
}

fn entry_lines<'a>(entry: &'a Entry, loading: bool) -> Vec<Line<'a>> {
    let password = match (&entry.password, loading) {
        (_, true) => Some("..."),
        (Some(_), false) => Some(MASK),
        (None, false) => None,
    };

    let mut lines = vec![
        field("Title", Some(entry.display_title())),
        field("User", entry.user.as_deref()),
        field("Password", password),
        field("Website", entry.website.as_deref()),
        field("OTP", Some(if entry.has_otp { "yes" } else { "no" })),
    ];
    if let Some(notes) = entry.notes.as_deref() {
        lines.push(Line::from(""));
        lines.extend(notes.lines().map(Line::from));
    }

    lines
}

fn draw_detail(frame: &mut Frame, browser: &Browser, area: Rect) {
    let lines = match browser.selected_node() {
        Some(Node::Group(group)) => vec![
            field("Group", Some(group.title.as_deref().unwrap_or(crate::consts::UNTITLED))),
            Line::from(format!("{} item(s)", group.entries.len())),
        ],
        Some(Node::Entry(listed)) => match browser.detail() {
            Some(detail) if detail.uuid == listed.uuid => entry_lines(detail, false),
            _ => entry_lines(listed, true),
        },
        None if browser.is_loading() => vec![Line::from("Loading...")],
        None => Vec::new(),
    };

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    frame.render_widget(detail, area);
}

fn draw_status(frame: &mut Frame, browser: &Browser, area: Rect) {
    let line = match browser.status() {
        Some(Status::Error(msg)) => Line::styled(msg.as_str(), Style::default().fg(Color::Red)),
        Some(Status::Info(msg)) => Line::styled(msg.as_str(), Style::default().fg(Color::Green)),
        None if browser.is_loading() => Line::styled("Loading...", Style::default().fg(Color::Yellow)),
        None => Line::styled(HINTS, Style::default().add_modifier(Modifier::DIM)),
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;

    fn render(browser: &Browser) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let mut list = ListState::default();
        list.select(browser.selected_row());
        terminal
            .draw(|frame| draw(frame, browser, &mut list))
            .unwrap();

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn loaded() -> Browser {
        let mut browser = Browser::new(UnlockGate::unlocked());
        browser.start();
        browser.update(Msg::Loaded(Ok(vec![
            Node::Entry(Entry {
                uuid: "e1".into(),
                title: Some("GitHub".into()),
                user: Some("alice".into()),
                ..Entry::default()
            }),
            Node::Entry(Entry {
                uuid: "e2".into(),
                title: Some("Bank".into()),
                ..Entry::default()
            }),
        ])));
        browser
    }

    #[test]
    fn locked_keys_edit_the_password() {
        let browser = Browser::new(UnlockGate::locked());

        assert!(matches!(
            key_to_action(&browser, Key::Char('a')),
            Some(Action::Update(Msg::PasswordInput('a')))
        ));
        assert!(matches!(
            key_to_action(&browser, Key::Char('\n')),
            Some(Action::Update(Msg::SubmitPassword))
        ));
        assert!(key_to_action(&browser, Key::Up).is_none());
        assert!(matches!(key_to_action(&browser, Key::Esc), Some(Action::Quit)));
    }

    #[test]
    fn unlocked_keys_drive_the_list() {
        let browser = loaded();

        assert!(matches!(
            key_to_action(&browser, Key::Char('g')),
            Some(Action::Update(Msg::FilterInput('g')))
        ));
        assert!(matches!(
            key_to_action(&browser, Key::Down),
            Some(Action::Update(Msg::Next))
        ));
        assert!(matches!(
            key_to_action(&browser, Key::Char('\n')),
            Some(Action::Update(Msg::Copy(Secret::Password)))
        ));
        assert!(matches!(
            key_to_action(&browser, Key::Ctrl('o')),
            Some(Action::Update(Msg::Copy(Secret::Otp)))
        ));
        assert!(matches!(key_to_action(&browser, Key::Ctrl('c')), Some(Action::Quit)));
    }

    #[test]
    fn renders_list_and_pending_detail() {
        let screen = render(&loaded());

        assert!(screen.contains("> GitHub"));
        assert!(screen.contains("Bank"));
        assert!(screen.contains("alice"));
        assert!(screen.contains("2 of 2"));
        assert!(screen.contains("Filter (regex)"));
    }

    #[test]
    fn renders_unlock_failure() {
        let mut browser = Browser::new(UnlockGate::locked());
        browser.update(Msg::PasswordInput('x'));
        browser.update(Msg::SubmitPassword);
        browser.update(Msg::Unlocked(Err(crate::VaultError::UnlockFailure(
            "invalid credentials".into(),
        ))));

        let screen = render(&browser);
        assert!(screen.contains("Unlock vault"));
        assert!(screen.contains("invalid credentials"));
    }
}
