use std::io;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;

use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::render::FileSink;
use crate::worker::wait_for_stop;

use super::reload::ConfigWatcher;
use super::reload_settings;
use super::services::Services;

/// Tick and write fields to files until `stop_rx` fires or disconnects.
pub fn run(
    services: &mut Services,
    sink: &mut FileSink,
    watcher: &mut ConfigWatcher,
    stop_rx: &Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut next_tick = Instant::now();
    loop {
        let now = Instant::now();
        if now >= next_tick {
            services.driver.tick(sink);
            next_tick = now + services.tick_period();
        }

        if watcher.poll(now) {
            reload_settings(services);
        }

        if wait_for_stop(stop_rx, next_tick.saturating_duration_since(Instant::now())) {
            info!("shutdown requested");
            return Ok(());
        }
    }
}

/// Receiver that fires once on Ctrl-C or SIGTERM.
///
/// A small current-thread runtime waits for the signals on its own thread.
pub fn shutdown_signal() -> io::Result<Receiver<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("segue-signals".to_string())
        .spawn(move || {
            runtime.block_on(wait_for_signal());
            let _ = tx.send(());
        })?;
    Ok(rx)
}

async fn wait_for_signal() {
    let interrupt = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = interrupt => info!("interrupt received"),
                _ = terminate.recv() => info!("terminate received"),
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM; only Ctrl-C stops segue");
            if let Err(e) = interrupt.await {
                warn!(error = %e, "cannot listen for Ctrl-C either");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::render::Field;
    use std::time::Duration;

    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.local.enabled = false;
        settings.relay.enabled = false;
        settings.poll.url = "http://127.0.0.1:9/".to_string();
        settings
    }

    #[test]
    fn run_ticks_then_returns_when_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path()).unwrap();
        let mut services = Services::start(&quiet_settings());
        let mut watcher = ConfigWatcher::new(None);
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();

        let started = Instant::now();
        run(&mut services, &mut sink, &mut watcher, &rx).unwrap();
        services.stop();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(sink.path_for(Field::Title).exists());
    }

    #[test]
    fn run_stops_when_the_sender_goes_away() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::new(dir.path()).unwrap();
        let mut services = Services::start(&quiet_settings());
        let mut watcher = ConfigWatcher::new(None);
        let (tx, rx) = mpsc::channel::<()>();

        let dropper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            drop(tx);
        });
        run(&mut services, &mut sink, &mut watcher, &rx).unwrap();
        dropper.join().unwrap();
        services.stop();
    }
}
