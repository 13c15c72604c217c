//! `TrackStatus`, the record shared by every stage of the pipeline, and
//! the identity key used to detect track changes.

/// Playback states that mark a status as not playing (compared case-insensitively).
const INACTIVE_STATES: [&str; 2] = ["stopped", "paused"];

/// Normalized now-playing information from either feed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackStatus {
    pub player_name: String,
    pub title: String,
    /// Display form of the contributors, e.g. `"A, B"`.
    pub artist: String,
    /// Individual contributors split out of `artist`.
    pub artists: Vec<String>,
    pub album: String,
    pub duration_sec: f64,
    pub progress_sec: f64,
    /// Derived from progress and duration; never authoritative.
    pub position_percent: u8,
    /// Absolute `http(s)://` or `file://` URI, or empty.
    pub cover_url: String,
    /// Free-form playback state as reported by the source.
    pub status: String,
    pub track_url: String,
}

impl TrackStatus {
    /// A status is playing when it has a title, a positive duration and a
    /// state other than stopped/paused. An empty state counts as playing.
    pub fn is_playing(&self) -> bool {
        if self.title.is_empty() || !(self.duration_sec > 0.0) {
            return false;
        }
        let state = self.status.trim();
        !INACTIVE_STATES
            .iter()
            .any(|inactive| state.eq_ignore_ascii_case(inactive))
    }

    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity {
            title: self.title.trim().to_string(),
            artist: self.artist.trim().to_string(),
            track_url: self.track_url.trim().to_string(),
            duration_sec: self.duration_sec,
        }
    }
}

/// Key used to decide whether two polled samples describe the same track.
///
/// Any difference (including duration) counts as a track change.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackIdentity {
    pub title: String,
    pub artist: String,
    pub track_url: String,
    pub duration_sec: f64,
}

/// Percentage of `duration` covered by `progress`, rounded and capped at 100.
///
/// Returns 0 when the duration is unknown (zero, negative or not finite).
pub fn position_percent(progress_sec: f64, duration_sec: f64) -> u8 {
    if !(duration_sec > 0.0) || !duration_sec.is_finite() || !progress_sec.is_finite() {
        return 0;
    }
    let pct = (progress_sec / duration_sec * 100.0).min(100.0).round();
    if pct <= 0.0 { 0 } else { pct as u8 }
}
