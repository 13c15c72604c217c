//! Terminal view model.
//!
//! `App` is the sink the tick driver writes into when running with the
//! terminal UI; `ui::draw` renders it every frame.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::render::{Field, Sink};
use crate::status::TrackStatus;

/// What a key press asks the runtime to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    Reload,
}

/// Map a key press to an action. Unbound keys map to `None`.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('r') => Some(Action::Reload),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct App {
    fields: HashMap<Field, String>,
    /// Playback state of the active record; `None` while idle.
    pub state: Option<String>,
    pub poll_url: String,
    pub relay_addr: Option<SocketAddr>,
    /// Last notice shown in the header (reload results and the like).
    pub notice: Option<String>,
}

impl App {
    pub fn new(poll_url: impl Into<String>, relay_addr: Option<SocketAddr>) -> Self {
        Self {
            poll_url: poll_url.into(),
            relay_addr,
            ..Self::default()
        }
    }

    /// The last value written for `field`, or an empty string.
    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    /// The `positionPercent` field as a gauge value.
    pub fn percent(&self) -> u16 {
        self.field(Field::PositionPercent)
            .trim()
            .parse::<u16>()
            .map(|p| p.min(100))
            .unwrap_or(0)
    }

    pub fn set_active(&mut self, active: Option<&TrackStatus>) {
        self.state = active.map(|s| {
            if s.status.trim().is_empty() {
                "playing".to_string()
            } else {
                s.status.to_ascii_lowercase()
            }
        });
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_none()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }
}

impl Sink for App {
    fn write(&mut self, field: Field, value: &str) -> io::Result<()> {
        self.fields.insert(field, value.to_string());
        Ok(())
    }
}
