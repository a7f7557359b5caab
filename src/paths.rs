//! Resolution of user-typed paths.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Expands a leading `~` to the home directory and makes the path absolute.
///
/// Surrounding whitespace is ignored. `~` is replaced even when it is not
/// followed by a separator, so `~docs` becomes `$HOME/docs`. If no home
/// directory can be determined the `~` is left as-is. Relative paths are
/// resolved against the current working directory; no symlinks are followed
/// and the path does not need to exist.
///
/// # Examples
///
/// ```
/// use filegod::paths::expand_path;
///
/// let resolved = expand_path("/var/log/").unwrap();
/// assert_eq!(resolved, std::path::PathBuf::from("/var/log"));
/// ```
pub fn expand_path(input: &str) -> Result<PathBuf> {
    let trimmed = input.trim();

    let expanded = match (trimmed.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(trimmed),
    };

    let absolute =
        std::path::absolute(&expanded).map_err(|e| Error::io(expanded.clone(), e))?;
    Ok(normalize(&absolute))
}

/// Drops `.` components and trailing separators without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Checks that `path` exists and is a directory.
pub fn require_dir(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::PathNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Checks that `path` exists, whatever its kind.
pub fn require_exists(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|e| Error::PathNotFound {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_path_is_kept() {
        assert_eq!(
            expand_path("  /usr/share/./doc  ").unwrap(),
            PathBuf::from("/usr/share/doc")
        );
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_path("~").unwrap(), home);
        assert_eq!(expand_path("~/Downloads").unwrap(), home.join("Downloads"));
    }

    #[test]
    fn test_relative_path_becomes_absolute() {
        let resolved = expand_path("some/dir").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("some/dir"));
    }

    #[test]
    fn test_require_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(require_dir(temp_dir.path()).is_ok());
        assert!(matches!(require_dir(&file), Err(Error::NotADirectory(_))));
        assert!(matches!(
            require_dir(&temp_dir.path().join("missing")),
            Err(Error::PathNotFound { .. })
        ));
    }
}
