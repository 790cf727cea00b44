//! File-system change events delivered by the notifier.

use std::fmt;
use std::path::PathBuf;

/// A single changed path.
///
/// Consumed once by the controller. Duplicates are harmless: a restart
/// triggered twice in a row leaves the same single child running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    /// Absolute path of the changed file or directory.
    pub path: PathBuf,
    /// Notifier-specific event kind, kept only for logging.
    pub kind: String,
}

impl FsEvent {
    pub fn new(path: impl Into<PathBuf>, kind: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for FsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.kind)
    }
}
