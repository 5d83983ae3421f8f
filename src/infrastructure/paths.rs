//! Filesystem locations.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TABLESYNC_DATA_DIR";

/// Directory holding the trace file.
///
/// `$TABLESYNC_DATA_DIR` when set and non-empty, otherwise `tablesync`
/// under the system temp directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
}

fn resolve_data_dir(configured: Option<PathBuf>) -> PathBuf {
    configured
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::env::temp_dir().join("tablesync"))
}

/// Expands a leading `~` to `$HOME`. Other paths are returned unchanged.
///
/// ```
/// use tablesync::infrastructure::expand_tilde;
///
/// assert_eq!(expand_tilde("/srv/users.json").to_str(), Some("/srv/users.json"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path, home) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_dir_wins() {
        let dir = resolve_data_dir(Some(PathBuf::from("/var/lib/tablesync")));
        assert_eq!(dir, PathBuf::from("/var/lib/tablesync"));
    }

    #[test]
    fn empty_value_falls_back_to_temp() {
        let dir = resolve_data_dir(Some(PathBuf::new()));
        assert_eq!(dir, std::env::temp_dir().join("tablesync"));
        assert_eq!(resolve_data_dir(None), dir);
    }

    #[test]
    fn absolute_paths_are_untouched() {
        assert_eq!(expand_tilde("/a/b"), PathBuf::from("/a/b"));
        assert_eq!(expand_tilde("rel/b"), PathBuf::from("rel/b"));
    }
}
