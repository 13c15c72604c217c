use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tracing::debug;

const CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Notices edits to the config file by comparing its modification time.
pub struct ConfigWatcher {
    path: Option<PathBuf>,
    seen: Option<SystemTime>,
    next_check: Instant,
}

impl ConfigWatcher {
    pub fn new(path: Option<PathBuf>) -> Self {
        let seen = path.as_ref().and_then(|p| modified(p));
        Self {
            path,
            seen,
            next_check: Instant::now() + CHECK_INTERVAL,
        }
    }

    /// Check at most once per second. `true` when the file changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_check {
            return false;
        }
        self.next_check = now + CHECK_INTERVAL;
        self.check()
    }

    /// Compare the current modification time with the last one seen.
    ///
    /// Creating or deleting the file counts as a change.
    pub fn check(&mut self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let current = modified(path);
        if current == self.seen {
            return false;
        }
        debug!(path = %path.display(), "config file changed");
        self.seen = current;
        true
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &std::path::Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn detects_modification_creation_and_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut watcher = ConfigWatcher::new(Some(path.clone()));
        assert!(!watcher.check());

        std::fs::write(&path, "[poll]\n").unwrap();
        touch(&path, 1_000);
        assert!(watcher.check());
        assert!(!watcher.check());

        touch(&path, 2_000);
        assert!(watcher.check());

        std::fs::remove_file(&path).unwrap();
        assert!(watcher.check());
        assert!(!watcher.check());
    }

    #[test]
    fn poll_is_rate_limited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        touch(&path, 1_000);

        let mut watcher = ConfigWatcher::new(Some(path.clone()));
        touch(&path, 2_000);

        let now = Instant::now();
        assert!(!watcher.poll(now));
        assert!(watcher.poll(now + Duration::from_secs(2)));
    }

    #[test]
    fn no_path_never_changes() {
        let mut watcher = ConfigWatcher::new(None);
        assert!(!watcher.check());
    }
}
