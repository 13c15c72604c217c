use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PollSettings;
use crate::fusion::SnapshotStore;
use crate::worker::Worker;

use super::feed::{HttpFeed, StatusFeed};
use super::thread::{Publisher, run_poll_loop};

/// Shortest wait between two polls.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Extra time `stop` allows past the request timeout before detaching the
/// worker.
const JOIN_GRACE: Duration = Duration::from_secs(1);

/// Everything a running poll loop depends on. A change restarts the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl PollerConfig {
    /// The wait between polls, never below `MIN_INTERVAL`.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_INTERVAL)
    }

    /// How long `stop` waits for a loop that may be inside a request.
    pub fn join_timeout(&self) -> Duration {
        self.timeout + JOIN_GRACE
    }
}

impl From<&PollSettings> for PollerConfig {
    fn from(settings: &PollSettings) -> Self {
        Self {
            url: settings.url.clone(),
            interval: Duration::from_millis(settings.interval_ms),
            timeout: Duration::from_millis(settings.timeout_ms),
            user_agent: settings.user_agent.clone(),
        }
    }
}

/// Builds the feed a freshly started loop will poll.
pub type FeedFactory = Box<dyn Fn(&PollerConfig) -> Box<dyn StatusFeed>>;

struct RunningLoop {
    worker: Worker,
    live: Arc<AtomicBool>,
    join_timeout: Duration,
}

impl RunningLoop {
    fn stop(self, store: &SnapshotStore) {
        self.live.store(false, Ordering::SeqCst);
        self.worker.stop(self.join_timeout);
        // Nothing is refreshing the slot any more.
        store.write_polled(None);
    }
}

/// Start/stop handle for the polling thread. Stopped on drop.
///
/// Each started loop gets its own publishing generation. Stopping retires it
/// first, so a loop left detached behind a slow request never writes the
/// polled slot again.
pub struct Poller {
    store: Arc<SnapshotStore>,
    config: PollerConfig,
    make_feed: FeedFactory,
    running: Option<RunningLoop>,
}

impl Poller {
    /// A stopped poller that fetches `config.url` over HTTP.
    pub fn new(store: Arc<SnapshotStore>, config: PollerConfig) -> Self {
        Self::with_feed(
            store,
            config,
            Box::new(|c: &PollerConfig| {
                Box::new(HttpFeed::new(&c.url, c.timeout, &c.user_agent)) as Box<dyn StatusFeed>
            }),
        )
    }

    pub fn with_feed(store: Arc<SnapshotStore>, config: PollerConfig, make_feed: FeedFactory) -> Self {
        Self {
            store,
            config,
            make_feed,
            running: None,
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.worker.is_finished())
    }

    /// Start polling. Does nothing when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("poller already running");
            return;
        }
        // Reap a worker that exited on its own.
        if let Some(stale) = self.running.take() {
            stale.stop(&self.store);
        }

        let feed = (self.make_feed)(&self.config);
        let (publisher, live) = Publisher::new(self.store.clone());
        let interval = self.config.effective_interval();

        match Worker::spawn("segue-poller", move |stop_rx| {
            run_poll_loop(feed, publisher, interval, stop_rx)
        }) {
            Ok(worker) => {
                info!(url = %self.config.url, "polling remote status feed");
                self.running = Some(RunningLoop {
                    worker,
                    live,
                    join_timeout: self.config.join_timeout(),
                });
            }
            Err(e) => warn!(error = %e, "failed to spawn poller thread"),
        }
    }

    /// Signal the loop to stop and join it with a bounded wait.
    ///
    /// The loop notices the signal at its next wait, so an in-flight request
    /// finishes (or times out) first. A loop still stuck after the join
    /// timeout is detached and can no longer publish.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop(&self.store);
        }
    }

    /// Apply new settings. A running poller restarts when anything changed.
    pub fn reconfigure(&mut self, config: PollerConfig) {
        if config == self.config {
            return;
        }
        let running = self.is_running();
        info!(
            url = %config.url,
            interval_ms = config.effective_interval().as_millis() as u64,
            restart = running,
            "poller settings changed"
        );
        self.config = config;
        if running {
            self.stop();
            self.start();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
