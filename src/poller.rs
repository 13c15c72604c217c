//! Background polling of the remote now-playing endpoint.
//!
//! `Poller` owns a worker thread that fetches the configured URL on a fixed
//! interval, normalizes and extrapolates the payload, and publishes the result
//! into the polled slot of the `SnapshotStore`.

mod control;
mod feed;
mod thread;

pub use control::{Poller, PollerConfig};
