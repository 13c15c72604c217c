use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::status::TrackStatus;

#[derive(Debug, Default)]
struct Slots {
    local: Option<TrackStatus>,
    polled: Option<TrackStatus>,
}

/// Latest normalized status from each feed.
///
/// The tick driver owns writes to the local slot and the poller owns writes
/// to the polled slot. Both slots sit behind one lock that is only held for
/// the assignment or the copy-out, never across I/O.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slots: Mutex<Slots>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_local(&self, status: Option<TrackStatus>) {
        self.lock().local = status;
    }

    pub fn write_polled(&self, status: Option<TrackStatus>) {
        self.lock().polled = status;
    }

    /// Replace the polled slot only if `allowed` holds while the lock is held.
    pub fn write_polled_if(&self, status: Option<TrackStatus>, allowed: impl FnOnce() -> bool) -> bool {
        let mut slots = self.lock();
        if !allowed() {
            return false;
        }
        slots.polled = status;
        true
    }

    /// Copy out both slots as `(local, polled)` under a single lock.
    pub fn read_both(&self) -> (Option<TrackStatus>, Option<TrackStatus>) {
        let slots = self.lock();
        (slots.local.clone(), slots.polled.clone())
    }

    // A writer that panicked mid-assignment cannot leave a slot half-written,
    // so the data is still usable after poisoning.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
