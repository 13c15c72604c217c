use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/segue/config.toml` or `~/.config/segue/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SEGUE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub poll: PollSettings,
    pub local: LocalSettings,
    pub display: DisplaySettings,
    pub output: OutputSettings,
    pub relay: RelaySettings,
    pub logging: LoggingSettings,
}

/// The remote HTTP status endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollSettings {
    /// URL returning the JSON status document.
    pub url: String,
    /// Wait between polls (milliseconds). Values below 100 are raised to 100.
    pub interval_ms: u64,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:1608/".to_string(),
            interval_ms: 600,
            timeout_ms: 2000,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

/// The local MPRIS bridge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalSettings {
    /// Read local players from the session bus.
    pub enabled: bool,
    /// How often the bridge refreshes its snapshot (milliseconds).
    pub refresh_ms: u64,
    /// Players to skip, matched case-insensitively against the bus name suffix.
    ///
    /// Example: ["firefox", "chromium"]
    pub ignore_players: Vec<String>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh_ms: 250,
            ignore_players: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Template for the `formatted` field.
    ///
    /// Placeholders: {title} {artist} {album} {duration} {position}
    /// {positionPercent} {position_percent} {player_name}
    pub template: String,
    /// Cover shown when the active track has none, and while idle.
    pub default_cover_url: String,
    /// Text written to fields with nothing to show.
    pub placeholder: String,
    /// Render tick period (milliseconds).
    pub tick_ms: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            template: "{title} - {artist} ({position}/{duration})".to_string(),
            default_cover_url: String::new(),
            placeholder: "N/A".to_string(),
            tick_ms: 250,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Full-screen terminal view.
    #[serde(alias = "tui")]
    Terminal,
    /// One text file per field, for overlays that read text from files.
    #[serde(alias = "file", alias = "headless")]
    Files,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub mode: OutputMode,
    /// Directory for `files` mode. Defaults to `<data dir>/segue/fields`.
    pub directory: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            mode: OutputMode::Terminal,
            directory: None,
        }
    }
}

/// The local image relay used by browser-based overlays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelaySettings {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1".to_string(),
            port: 65432,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Log file. Terminal mode always logs to a file (this one or the default).
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}
