use crate::status::TrackStatus;

/// Pick the status to display for this tick.
///
/// The local bridge wins whenever it is playing; the polled feed is only a
/// fallback for when the local side is idle.
pub fn select_active<'a>(
    local: Option<&'a TrackStatus>,
    polled: Option<&'a TrackStatus>,
) -> Option<&'a TrackStatus> {
    local
        .filter(|s| s.is_playing())
        .or_else(|| polled.filter(|s| s.is_playing()))
}
