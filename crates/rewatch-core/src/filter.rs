//! Restart policy: decides whether a changed path should restart the child.
//!
//! A path is accepted when its extension is in the watched set (an empty set
//! accepts everything) and it does not live under an ignored directory.
//! Ignored directories are resolved against the working directory once, at
//! startup, so the per-event check is a pure component-wise prefix test.

use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// Predicate evaluated by the controller before honoring an FS-change event.
pub trait RestartPolicy: Send + Sync {
    /// Returns true if a change at `path` should trigger a restart.
    ///
    /// `path` is expected to be absolute.
    fn accept(&self, path: &Path) -> bool;
}

/// Extension allow-list combined with ignored directory prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    extensions: Vec<String>,
    ignored: Vec<PathBuf>,
}

impl PathFilter {
    /// Builds a filter from already-validated extensions and ignored
    /// directories, resolving relative directories against `cwd`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(extensions: Vec<String>, ignored: &[P], cwd: &Path) -> Self {
        Self {
            extensions,
            ignored: ignored
                .iter()
                .map(|dir| normalize_path(dir.as_ref(), cwd))
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn ignored(&self) -> &[PathBuf] {
        &self.ignored
    }

    fn allows_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|allowed| allowed == ext)
    }

    /// True if `path` is strictly inside one of the ignored directories.
    fn is_ignored(&self, path: &Path) -> bool {
        self.ignored
            .iter()
            .any(|dir| path != dir && path.starts_with(dir))
    }
}

impl RestartPolicy for PathFilter {
    fn accept(&self, path: &Path) -> bool {
        self.allows_extension(path) && !self.is_ignored(path)
    }
}

/// Checks that an extension is a single word (letters, digits, underscore).
pub fn validate_extension(ext: &str) -> Result<()> {
    let valid = !ext.is_empty() && ext.chars().all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidExtension(ext.to_string()))
    }
}

/// Resolves `path` against `cwd` and removes `.` and `..` lexically.
///
/// Does not touch the filesystem, so it works for paths that do not exist
/// yet and never follows symlinks.
#[must_use]
pub fn normalize_path(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
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
