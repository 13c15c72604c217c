use crate::config;

/// Load and validate settings. The error is a message suitable for logging.
pub fn try_load_settings() -> Result<config::Settings, String> {
    let settings = config::Settings::load().map_err(|e| format!("failed to load config: {e}"))?;
    settings
        .validate()
        .map_err(|msg| format!("invalid config: {msg}"))?;
    Ok(settings)
}
