use std::env;
use std::path::{Component, Path, PathBuf};

use url::Url;

const PASSTHROUGH_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// Normalize a cover reference into an absolute URI.
///
/// `http`, `https` and `file` URIs are returned as given. A value without a
/// scheme is treated as a local path (with `~` expansion) and converted into
/// a `file://` URI. Anything else, or a path that cannot be resolved, yields
/// an empty string.
pub fn normalize_cover_url(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    match scheme_of(text) {
        Some(scheme) => {
            let scheme = scheme.to_ascii_lowercase();
            if PASSTHROUGH_SCHEMES.contains(&scheme.as_str()) {
                text.to_string()
            } else {
                String::new()
            }
        }
        None => resolve_local_path(text)
            .and_then(|path| Url::from_file_path(path).ok())
            .map(|url| url.to_string())
            .unwrap_or_default(),
    }
}

/// Extract a URI scheme (`[A-Za-z][A-Za-z0-9+.-]*:`) from the start of `text`.
fn scheme_of(text: &str) -> Option<&str> {
    let (candidate, _) = text.split_once(':')?;
    let mut chars = candidate.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(candidate)
    } else {
        None
    }
}

fn resolve_local_path(text: &str) -> Option<PathBuf> {
    let expanded = if text == "~" {
        dirs::home_dir()?
    } else if let Some(rest) = text.strip_prefix("~/") {
        dirs::home_dir()?.join(rest)
    } else {
        PathBuf::from(text)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir().ok()?.join(expanded)
    };

    Some(clean_components(&absolute))
}

/// Drop `.` segments and fold `..` into their parent without touching the filesystem.
fn clean_components(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
