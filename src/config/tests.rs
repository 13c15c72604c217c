use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_segue_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", "/tmp/segue-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/segue-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("segue")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("segue")
            .join("config.toml")
    );
}

#[test]
fn settings_defaults_match_documented_values() {
    let s = Settings::default();
    assert_eq!(s.poll.url, "http://127.0.0.1:1608/");
    assert_eq!(s.poll.interval_ms, 600);
    assert_eq!(s.poll.timeout_ms, 2000);
    assert_eq!(s.display.tick_ms, 250);
    assert_eq!(s.display.placeholder, "N/A");
    assert_eq!(s.display.template, "{title} - {artist} ({position}/{duration})");
    assert_eq!(s.output.mode, OutputMode::Terminal);
    assert_eq!(s.relay.port, 65432);
    assert!(s.local.enabled);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[poll]
url = "http://10.0.0.2:1608/status"
interval_ms = 900
timeout_ms = 1500
user_agent = "segue-test"

[local]
enabled = false
refresh_ms = 500
ignore_players = ["firefox", "chromium"]

[display]
template = "{artist} :: {title}"
default_cover_url = "https://img.example/none.png"
placeholder = "-"
tick_ms = 100

[output]
mode = "headless"
directory = "/tmp/segue-fields"

[relay]
enabled = false
bind = "0.0.0.0"
port = 8123

[logging]
filter = "segue=debug"
file = "/tmp/segue.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SEGUE__POLL__INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.poll.url, "http://10.0.0.2:1608/status");
    assert_eq!(s.poll.interval_ms, 900);
    assert_eq!(s.poll.timeout_ms, 1500);
    assert_eq!(s.poll.user_agent, "segue-test");
    assert!(!s.local.enabled);
    assert_eq!(s.local.refresh_ms, 500);
    assert_eq!(s.local.ignore_players, vec!["firefox", "chromium"]);
    assert_eq!(s.display.template, "{artist} :: {title}");
    assert_eq!(s.display.default_cover_url, "https://img.example/none.png");
    assert_eq!(s.display.placeholder, "-");
    assert_eq!(s.display.tick_ms, 100);
    assert_eq!(s.output.mode, OutputMode::Files);
    assert_eq!(
        s.output.directory.as_deref(),
        Some(std::path::Path::new("/tmp/segue-fields"))
    );
    assert!(!s.relay.enabled);
    assert_eq!(s.relay.bind, "0.0.0.0");
    assert_eq!(s.relay.port, 8123);
    assert_eq!(s.logging.filter, "segue=debug");
    assert!(s.logging.file.is_some());
}

#[test]
fn settings_partial_file_keeps_other_defaults() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(&cfg_path, "[poll]\ninterval_ms = 50\n").unwrap();

    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("SEGUE__POLL__INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.poll.interval_ms, 50);
    assert_eq!(s.poll.url, PollSettings::default().url);
    assert_eq!(s.display, DisplaySettings::default());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[poll]
interval_ms = 600
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("SEGUE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("SEGUE__POLL__INTERVAL_MS", "250");

    let s = Settings::load().unwrap();
    assert_eq!(s.poll.interval_ms, 250);
}

#[test]
fn validate_rejects_zero_periods_and_empty_url() {
    let mut s = Settings::default();
    s.display.tick_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.poll.timeout_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.local.refresh_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.poll.url = "  ".to_string();
    assert!(s.validate().is_err());
}

#[test]
fn settings_round_trip_through_toml() {
    let mut s = Settings::default();
    s.output.mode = OutputMode::Files;
    s.local.ignore_players = vec!["firefox".to_string()];

    let text = s.to_toml().unwrap();
    assert!(text.contains("[poll]"));
    assert!(text.contains("mode = \"files\""));

    let back: Settings = toml::from_str(&text).unwrap();
    assert_eq!(back, s);
}
