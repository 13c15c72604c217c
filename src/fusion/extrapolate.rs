//! Smoothing of the polled feed's playback position.
//!
//! The remote endpoint is polled far less often than the display refreshes
//! and its reported position is stale by up to one poll period. Between
//! samples of the same track the position is advanced by the monotonic time
//! elapsed since the previous sample. The estimate only ever moves forward
//! and never past the reported duration.
//!
//! A seek backwards within the same track is hidden for one poll cycle: the
//! forward-only rule keeps the larger expected value until the reported
//! position catches up or the track identity changes.

use std::time::Instant;

use crate::status::{TrackIdentity, TrackStatus, position_percent};

#[derive(Debug, Clone)]
struct Anchor {
    identity: TrackIdentity,
    progress_sec: f64,
    sampled_at: Instant,
}

/// Extrapolation state for the polled feed. Owned by a single poller loop.
#[derive(Debug, Default)]
pub struct Extrapolator {
    last: Option<Anchor>,
}

impl Extrapolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous sample.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Adjust `sample` taken at `now` against the previous sample.
    ///
    /// `None` resets the state. A sample whose identity differs from the
    /// previous one passes through with its own progress.
    pub fn apply(&mut self, sample: Option<TrackStatus>, now: Instant) -> Option<TrackStatus> {
        let Some(mut sample) = sample else {
            self.reset();
            return None;
        };

        let identity = sample.identity();
        if let Some(anchor) = self.last.as_ref().filter(|a| a.identity == identity) {
            let elapsed = now.saturating_duration_since(anchor.sampled_at).as_secs_f64();
            let expected = anchor.progress_sec + elapsed;
            if expected > sample.progress_sec {
                sample.progress_sec = if sample.duration_sec > 0.0 {
                    expected.min(sample.duration_sec)
                } else {
                    expected
                };
            }
        }

        sample.position_percent = position_percent(sample.progress_sec, sample.duration_sec);
        self.last = Some(Anchor {
            identity,
            progress_sec: sample.progress_sec,
            sampled_at: now,
        });
        Some(sample)
    }

    #[cfg(test)]
    pub fn is_tracking(&self) -> bool {
        self.last.is_some()
    }
}
