//! Time parsing and formatting.
//!
//! Feeds report durations as seconds, milliseconds or `H:MM:SS` strings.
//! `parse_seconds` folds all of them into seconds and never fails.

use serde_json::Value;

/// Numbers above this are assumed to be milliseconds.
///
/// Known accuracy boundary: a genuine duration longer than ~2h46m expressed
/// in seconds is read as milliseconds.
const MILLIS_THRESHOLD: f64 = 10_000.0;

/// A raw time value as reported by a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValue {
    Number(f64),
    Text(String),
}

impl TimeValue {
    /// Interpret a JSON value as a time. Only numbers and strings qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(TimeValue::Number),
            Value::String(s) => Some(TimeValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<f64> for TimeValue {
    fn from(value: f64) -> Self {
        TimeValue::Number(value)
    }
}

impl From<&str> for TimeValue {
    fn from(value: &str) -> Self {
        TimeValue::Text(value.to_string())
    }
}

/// Convert a raw time value into seconds. Absent or unparsable input is 0.
pub fn parse_seconds(value: Option<&TimeValue>) -> f64 {
    let seconds = match value {
        None => 0.0,
        Some(TimeValue::Number(n)) => from_number(*n),
        Some(TimeValue::Text(text)) => from_text(text),
    };
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

fn from_number(n: f64) -> f64 {
    if n > MILLIS_THRESHOLD { n / 1000.0 } else { n }
}

fn from_text(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    if text.contains(':') {
        // A segment that does not parse keeps the running total unchanged.
        return text.split(':').fold(0.0, |total, part| {
            match part.trim().parse::<f64>() {
                Ok(v) => total * 60.0 + v,
                Err(_) => total,
            }
        });
    }

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match digits.parse::<f64>() {
        Ok(n) => from_number(n),
        Err(_) => 0.0,
    }
}

/// Format seconds as `m:ss`, truncating partial seconds.
///
/// Negative and non-finite input renders as `0:00`.
pub fn format_mmss(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", secs / 60, secs % 60)
}
