use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::fusion::{Extrapolator, SnapshotStore};
use crate::status::{TrackStatus, normalize_polled};
use crate::worker::wait_for_stop;

use super::feed::StatusFeed;

/// Write access to the polled slot for one loop generation.
///
/// `Poller::stop` retires the generation before it waits for the thread, so
/// a loop that outlives its join timeout can no longer publish.
pub(super) struct Publisher {
    store: Arc<SnapshotStore>,
    live: Arc<AtomicBool>,
}

impl Publisher {
    pub(super) fn new(store: Arc<SnapshotStore>) -> (Self, Arc<AtomicBool>) {
        let live = Arc::new(AtomicBool::new(true));
        (
            Self {
                store,
                live: live.clone(),
            },
            live,
        )
    }

    /// Returns `false` once this generation has been retired.
    pub(super) fn publish(&self, status: Option<TrackStatus>) -> bool {
        self.store
            .write_polled_if(status, || self.live.load(Ordering::SeqCst))
    }
}

/// Body of the poller thread: fetch, publish, wait, until stopped.
///
/// The extrapolator lives on this thread's stack, so it has exactly one writer.
pub(super) fn run_poll_loop(
    feed: Box<dyn StatusFeed>,
    publisher: Publisher,
    interval: Duration,
    stop_rx: Receiver<()>,
) {
    info!(interval_ms = interval.as_millis() as u64, "poller started");
    let mut extrapolator = Extrapolator::new();

    loop {
        if !poll_once(feed.as_ref(), &mut extrapolator, &publisher, Instant::now) {
            debug!("poller retired while fetching; dropping sample");
            break;
        }
        if wait_for_stop(&stop_rx, interval) {
            break;
        }
    }
    info!("poller stopped");
}

/// One poll iteration. Fetch failures publish an absent status and reset the
/// extrapolator; they never end the loop.
///
/// `clock` is read once the fetch has returned, so request latency does not
/// leak into the extrapolation anchor. Returns `false` when the publisher has
/// been retired.
pub(super) fn poll_once(
    feed: &dyn StatusFeed,
    extrapolator: &mut Extrapolator,
    publisher: &Publisher,
    clock: impl FnOnce() -> Instant,
) -> bool {
    let sample = match feed.fetch() {
        Ok(payload) => normalize_polled(&payload),
        Err(e) => {
            debug!(error = %e, "status fetch failed");
            None
        }
    };

    let adjusted = extrapolator.apply(sample, clock());
    publisher.publish(adjusted)
}
