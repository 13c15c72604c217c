//! Background threads with cooperative shutdown and a bounded join.
//!
//! The thread body receives a stop receiver; it should wait on it (for
//! example with `recv_timeout`) between units of work. `Worker::stop`
//! signals, then waits up to a timeout for the thread to finish. A thread
//! that does not exit in time is logged and left detached.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

pub struct Worker {
    name: &'static str,
    stop_tx: Sender<()>,
    // Never sent on; disconnects when the thread body returns or unwinds.
    done_rx: Receiver<()>,
    join: JoinHandle<()>,
}

impl Worker {
    pub fn spawn<F>(name: &'static str, body: F) -> std::io::Result<Self>
    where
        F: FnOnce(Receiver<()>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let _done = done_tx;
                body(stop_rx);
            })?;

        Ok(Self {
            name,
            stop_tx,
            done_rx,
            join,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal the thread and wait up to `timeout` for it to exit.
    ///
    /// Returns `true` when the thread was joined.
    pub fn stop(self, timeout: Duration) -> bool {
        let _ = self.stop_tx.send(());

        match self.done_rx.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.join.join().is_err() {
                    warn!(worker = self.name, "worker thread panicked");
                } else {
                    debug!(worker = self.name, "worker thread stopped");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    worker = self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "worker thread still alive after join timeout; detaching"
                );
                false
            }
        }
    }
}

/// Wait for `period` or until a stop is requested. Returns `true` to stop.
pub fn wait_for_stop(stop_rx: &Receiver<()>, period: Duration) -> bool {
    match stop_rx.recv_timeout(period) {
        Err(RecvTimeoutError::Timeout) => false,
        Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn stop_joins_a_cooperative_thread() {
        let worker = Worker::spawn("test-worker", |stop_rx| {
            while !wait_for_stop(&stop_rx, Duration::from_millis(10)) {}
        })
        .unwrap();
        assert!(!worker.is_finished());
        assert!(worker.stop(Duration::from_secs(2)));
    }

    #[test]
    fn stop_gives_up_after_timeout() {
        let worker = Worker::spawn("test-stuck", |_stop_rx| {
            thread::sleep(Duration::from_millis(500));
        })
        .unwrap();
        let started = Instant::now();
        assert!(!worker.stop(Duration::from_millis(50)));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn wait_for_stop_reports_disconnect_as_stop() {
        let (tx, rx) = mpsc::channel::<()>();
        assert!(!wait_for_stop(&rx, Duration::from_millis(1)));
        drop(tx);
        assert!(wait_for_stop(&rx, Duration::from_millis(1)));
    }
}
