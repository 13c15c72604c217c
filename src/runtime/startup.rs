use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingSettings, OutputMode, OutputSettings};

pub const USAGE: &str = "usage: segue [--headless] [--print-config]

  --headless       write fields to files instead of drawing the terminal UI
  --print-config   print the effective configuration as TOML and exit
  -h, --help       show this help";

/// Command-line switches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub headless: bool,
    pub print_config: bool,
    pub help: bool,
}

impl Options {
    pub fn parse<I, S>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Options::default();
        for arg in args {
            match arg.as_ref() {
                "--headless" => options.headless = true,
                "--print-config" => options.print_config = true,
                "-h" | "--help" => options.help = true,
                other => return Err(format!("unknown argument: {other}")),
            }
        }
        Ok(options)
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `logging.filter`. The terminal UI owns the screen, so
/// in that mode logs always go to a file. Returns the log file path, if any.
pub fn init_logging(
    logging: &LoggingSettings,
    mode: OutputMode,
) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let path = match (&logging.file, mode) {
        (Some(path), _) => Some(path.clone()),
        (None, OutputMode::Terminal) => Some(default_log_path().ok_or("no data directory for the log file")?),
        (None, OutputMode::Files) => None,
    };

    match &path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| e.to_string())?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(path)
}

/// `<data_local_dir>/segue/segue.log`
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("segue").join("segue.log"))
}

/// Directory for file output: the configured one or `<data_local_dir>/segue/fields`.
pub fn output_dir(output: &OutputSettings) -> Result<PathBuf, String> {
    output
        .directory
        .clone()
        .or_else(|| dirs::data_local_dir().map(|d| d.join("segue").join("fields")))
        .ok_or_else(|| "no output directory configured and no data directory found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_known_switches() {
        let o = Options::parse(["--headless", "--print-config"]).unwrap();
        assert!(o.headless);
        assert!(o.print_config);
        assert!(!o.help);

        assert_eq!(Options::parse(Vec::<String>::new()).unwrap(), Options::default());
        assert!(Options::parse(["-h"]).unwrap().help);
    }

    #[test]
    fn options_reject_unknown_arguments() {
        let err = Options::parse(["--verbose"]).unwrap_err();
        assert!(err.contains("--verbose"));
    }

    #[test]
    fn init_logging_opens_the_file_and_rejects_a_second_install() {
        let dir = tempfile::tempdir().unwrap();
        let logging = LoggingSettings {
            filter: "debug".to_string(),
            file: Some(dir.path().join("logs").join("segue.log")),
        };

        let path = init_logging(&logging, OutputMode::Files).unwrap();
        assert_eq!(path, logging.file);
        assert!(dir.path().join("logs").join("segue.log").exists());

        let err = init_logging(&logging, OutputMode::Files).unwrap_err();
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn output_dir_prefers_configured_directory() {
        let output = OutputSettings {
            mode: OutputMode::Files,
            directory: Some(PathBuf::from("/tmp/segue-out")),
        };
        assert_eq!(output_dir(&output).unwrap(), PathBuf::from("/tmp/segue-out"));
    }
}
