use std::time::Instant;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{Action, App, action_for_key};
use crate::ui;

use super::reload::ConfigWatcher;
use super::reload_settings;
use super::services::Services;

/// Main terminal event loop: ticks the driver into `app`, redraws and
/// handles input until quit is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    services: &mut Services,
    app: &mut App,
    watcher: &mut ConfigWatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut next_tick = Instant::now();
    loop {
        let now = Instant::now();
        if now >= next_tick {
            let active = services.driver.tick(app);
            app.set_active(active.as_ref());
            next_tick = now + services.tick_period();
        }

        if watcher.poll(now) {
            apply_reload(services, app);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        // Wait for input until the next tick is due.
        let wait = next_tick.saturating_duration_since(Instant::now());
        if event::poll(wait)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match action_for_key(key) {
                    Some(Action::Quit) => break,
                    Some(Action::Reload) => apply_reload(services, app),
                    None => {}
                }
            }
        }
    }

    Ok(())
}

fn apply_reload(services: &mut Services, app: &mut App) {
    let notice = reload_settings(services);
    app.poll_url = services.settings().poll.url.clone();
    app.relay_addr = services.relay_addr();
    app.set_notice(notice);
}
