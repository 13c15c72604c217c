//! Source adapters: raw local-bridge records and polled JSON payloads into
//! `TrackStatus`.
//!
//! The polled payload has no fixed schema, so each logical field is looked up
//! through an ordered list of candidate keys and the first usable value wins.

use serde_json::{Map, Value};

use super::cover::normalize_cover_url;
use super::model::{TrackStatus, position_percent};
use super::time::{TimeValue, parse_seconds};

const DEFAULT_LOCAL_PLAYER: &str = "MPRIS";
const DEFAULT_POLLED_PLAYER: &str = "Tuna";

const TITLE_KEYS: &[&str] = &["title"];
const ARTIST_LIST_KEYS: &[&str] = &["artists"];
const ARTIST_KEYS: &[&str] = &["artist"];
const ALBUM_KEYS: &[&str] = &["album"];
const DURATION_KEYS: &[&str] = &["duration", "duration_ms"];
const PROGRESS_KEYS: &[&str] = &["progress", "position"];
const COVER_KEYS: &[&str] = &["cover_url", "cover"];
const TRACK_URL_KEYS: &[&str] = &["url", "track_url"];
const PLAYER_KEYS: &[&str] = &["player"];
const STATUS_KEYS: &[&str] = &["status", "state"];

/// Raw record read from the local media bridge. Every field may be missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalMedia {
    pub player_name: Option<String>,
    pub title: Option<String>,
    /// Contributors as one string, e.g. `"A, B feat. C"`.
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<TimeValue>,
    pub position: Option<TimeValue>,
    /// Percent as reported by the bridge (0..=100).
    pub position_percent: Option<f64>,
    pub cover_url: Option<String>,
    pub state: Option<String>,
    pub track_url: Option<String>,
}

/// Normalize a local-bridge record. No record or no title means no status.
pub fn normalize_local(media: Option<&LocalMedia>) -> Option<TrackStatus> {
    let media = media?;
    let title = media
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?;

    let duration_sec = parse_seconds(media.duration.as_ref());
    let progress_sec = clamp_progress(parse_seconds(media.position.as_ref()), duration_sec);
    let percent = media
        .position_percent
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(0);

    let artist = media.artist.clone().unwrap_or_default();
    let artists = split_local_artists(&artist);

    Some(TrackStatus {
        player_name: non_empty(media.player_name.as_deref())
            .unwrap_or(DEFAULT_LOCAL_PLAYER)
            .to_string(),
        title: title.to_string(),
        artist,
        artists,
        album: media.album.clone().unwrap_or_default(),
        duration_sec,
        progress_sec,
        position_percent: percent,
        cover_url: normalize_cover_url(media.cover_url.as_deref().unwrap_or_default()),
        status: media.state.clone().unwrap_or_default(),
        track_url: media.track_url.clone().unwrap_or_default(),
    })
}

/// Split a combined artist string on commas and `" feat."`.
///
/// Falls back to the raw string as the single entry when nothing survives.
fn split_local_artists(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw
        .replace(" feat.", ",")
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        vec![raw.to_string()]
    } else {
        parts
    }
}

/// Normalize a polled JSON payload. Non-objects and missing titles yield `None`.
pub fn normalize_polled(payload: &Value) -> Option<TrackStatus> {
    let map = payload.as_object()?;

    let title = first_text(map, TITLE_KEYS);
    if title.is_empty() {
        return None;
    }

    let listed = first_list(map, ARTIST_LIST_KEYS);
    let (artist, artists) = if listed.is_empty() {
        let artist = first_text(map, ARTIST_KEYS);
        let artists = if artist.is_empty() {
            Vec::new()
        } else {
            vec![artist.clone()]
        };
        (artist, artists)
    } else {
        (listed.join(", "), listed)
    };

    let duration_sec = first_seconds(map, DURATION_KEYS);
    let progress_sec = clamp_progress(first_seconds(map, PROGRESS_KEYS), duration_sec);

    let player_name = first_text(map, PLAYER_KEYS);
    let player_name = if player_name.is_empty() {
        DEFAULT_POLLED_PLAYER.to_string()
    } else {
        player_name
    };

    Some(TrackStatus {
        player_name,
        title,
        artist,
        artists,
        album: first_text(map, ALBUM_KEYS),
        duration_sec,
        progress_sec,
        position_percent: position_percent(progress_sec, duration_sec),
        cover_url: normalize_cover_url(&first_text(map, COVER_KEYS)),
        status: first_text(map, STATUS_KEYS),
        track_url: first_text(map, TRACK_URL_KEYS),
    })
}

fn clamp_progress(progress_sec: f64, duration_sec: f64) -> f64 {
    if duration_sec > 0.0 {
        progress_sec.min(duration_sec)
    } else {
        progress_sec
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Scalar JSON values rendered as trimmed text; everything else is empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .map(scalar_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn first_list(map: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .map(scalar_text)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
        })
        .find(|items| !items.is_empty())
        .unwrap_or_default()
}

fn first_seconds(map: &Map<String, Value>, keys: &[&str]) -> f64 {
    keys.iter()
        .filter_map(|key| map.get(*key).and_then(TimeValue::from_json))
        .map(|value| parse_seconds(Some(&value)))
        .find(|seconds| *seconds > 0.0)
        .unwrap_or(0.0)
}
