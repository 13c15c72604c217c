use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::config::{self, OutputMode};
use crate::render::FileSink;

mod event_loop;
mod headless;
mod reload;
mod services;
mod settings;
mod startup;

pub use startup::{Options, USAGE};

use reload::ConfigWatcher;
use services::Services;

pub fn run(options: Options) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, load_warning) = match settings::try_load_settings() {
        Ok(s) => (s, None),
        Err(msg) => (config::Settings::default(), Some(msg)),
    };

    if options.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    let mode = if options.headless {
        OutputMode::Files
    } else {
        settings.output.mode
    };

    let log_path = startup::init_logging(&settings.logging, mode)?;
    if let Some(msg) = load_warning {
        warn!("{msg}; using defaults");
    }
    info!(?mode, log = ?log_path, "segue starting");

    let mut watcher = ConfigWatcher::new(config::resolve_config_path());
    let mut services = Services::start(&settings);

    let run_result = match mode {
        OutputMode::Files => {
            let dir = startup::output_dir(&settings.output)?;
            let mut sink = FileSink::new(&dir)?;
            info!(dir = %sink.dir().display(), "writing fields to files");
            let stop_rx = headless::shutdown_signal()?;
            headless::run(&mut services, &mut sink, &mut watcher, &stop_rx)
        }
        OutputMode::Terminal => run_terminal(&mut services, &mut watcher),
    };

    services.stop();
    info!("segue stopped");
    run_result
}

fn run_terminal(services: &mut Services, watcher: &mut ConfigWatcher) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(services.settings().poll.url.clone(), services.relay_addr());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, services, &mut app, watcher);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

/// Reload settings from disk and apply them. Returns a short notice.
fn reload_settings(services: &mut Services) -> String {
    match settings::try_load_settings() {
        Ok(settings) => {
            services.apply(settings);
            info!("configuration reloaded");
            "config reloaded".to_string()
        }
        Err(msg) => {
            warn!("{msg}; keeping current settings");
            "config invalid, kept previous".to_string()
        }
    }
}
