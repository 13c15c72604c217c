use std::collections::HashMap;

use zvariant::{OwnedValue, Value};

use crate::status::{LocalMedia, TimeValue};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Build a `LocalMedia` record from an MPRIS `Metadata` map.
///
/// `position_us` is the player's `Position` property, when it has one.
/// Returns `None` for players without a title.
pub fn media_from_metadata(
    player_name: &str,
    playback_status: &str,
    position_us: Option<i64>,
    metadata: &HashMap<String, OwnedValue>,
) -> Option<LocalMedia> {
    let title = metadata
        .get("xesam:title")
        .and_then(|v| text(v))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())?;

    let artists = metadata.get("xesam:artist").map(|v| texts(v)).unwrap_or_default();
    let length_us = metadata
        .get("mpris:length")
        .and_then(|v| micros(v))
        .filter(|us| *us > 0);

    let position_percent = match (position_us, length_us) {
        (Some(pos), Some(len)) => Some((pos.max(0) as f64 / len as f64 * 100.0).min(100.0)),
        _ => None,
    };

    Some(LocalMedia {
        player_name: Some(player_name.to_string()).filter(|n| !n.is_empty()),
        title: Some(title),
        artist: Some(artists.join(", ")).filter(|a| !a.is_empty()),
        album: metadata.get("xesam:album").and_then(|v| text(v)),
        duration: length_us.map(seconds_text),
        position: position_us.map(|us| seconds_text(us.max(0))),
        position_percent,
        cover_url: metadata.get("mpris:artUrl").and_then(|v| text(v)),
        state: Some(playback_status.to_string()).filter(|s| !s.is_empty()),
        track_url: metadata.get("xesam:url").and_then(|v| text(v)),
    })
}

/// Microseconds as `m:ss.mmm` text.
///
/// A colon form is parsed exactly, so long tracks do not hit the
/// milliseconds heuristic that bare numbers go through.
fn seconds_text(us: i64) -> TimeValue {
    let total = us as f64 / MICROS_PER_SECOND;
    let minutes = (total / 60.0).floor();
    let seconds = total - minutes * 60.0;
    TimeValue::Text(format!("{}:{:06.3}", minutes as u64, seconds))
}

fn text(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::ObjectPath(p) => Some(p.as_str().to_string()),
        Value::Value(inner) => text(inner),
        _ => None,
    }
}

/// A string list, or a lone string as a one-element list.
fn texts(value: &Value<'_>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Value(inner) => texts(inner),
        other => text(other).into_iter().collect(),
    }
}

// Players disagree on the integer type of `mpris:length`.
fn micros(value: &Value<'_>) -> Option<i64> {
    match value {
        Value::I64(n) => Some(*n),
        Value::U64(n) => i64::try_from(*n).ok(),
        Value::I32(n) => Some(i64::from(*n)),
        Value::U32(n) => Some(i64::from(*n)),
        Value::F64(f) if f.is_finite() => Some(*f as i64),
        Value::Value(inner) => micros(inner),
        _ => None,
    }
}
