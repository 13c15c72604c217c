//! UI rendering for the terminal view.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::render::Field;

const CONTROLS: [(&str, &str); 2] = [("r", "reload config"), ("q/esc", "quit")];

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn header_text(app: &App) -> String {
    let mut parts = vec![format!("feed: {}", app.poll_url)];
    match app.relay_addr {
        Some(addr) => parts.push(format!("relay: http://{addr}/relay")),
        None => parts.push("relay: off".to_string()),
    }
    if let Some(notice) = &app.notice {
        parts.push(notice.clone());
    }
    parts.join(" • ")
}

fn now_playing_lines(app: &App) -> String {
    let state = app.state.as_deref().unwrap_or("idle");
    [
        format!("Player:   {} ({state})", app.field(Field::PlayerName)),
        format!("Title:    {}", app.field(Field::Title)),
        format!("Artist:   {}", app.field(Field::Artist)),
        format!("Album:    {}", app.field(Field::Album)),
        format!("Cover:    {}", app.field(Field::CoverUrl)),
    ]
    .join("\n")
}

/// Render the entire UI into the provided `frame`.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(7),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(app))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" segue ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let padding = Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    };

    let mut now_playing = Paragraph::new(now_playing_lines(app))
        .block(Block::bordered().padding(padding).title(" now playing "))
        .wrap(Wrap { trim: true });
    if app.is_idle() {
        now_playing = now_playing.dim();
    }
    frame.render_widget(now_playing, chunks[1]);

    let label = format!(
        "{} / {} ({}%)",
        app.field(Field::Position),
        app.field(Field::Duration),
        app.percent()
    );
    let gauge = Gauge::default()
        .block(Block::bordered().title(" position "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .percent(app.percent())
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    let formatted = Paragraph::new(app.field(Field::Formatted))
        .block(Block::bordered().padding(padding).title(" formatted "))
        .wrap(Wrap { trim: true });
    frame.render_widget(formatted, chunks[3]);

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(padding),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
