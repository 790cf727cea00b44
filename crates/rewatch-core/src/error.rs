//! Startup and configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving the startup configuration.
///
/// All of these are fatal: the binary logs them and exits with status 1.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An extension passed via `-e` or the config file is not a plain word.
    #[error("invalid extension {0:?}")]
    InvalidExtension(String),

    /// No command was given to run.
    #[error("no command given; usage: rewatch [FLAGS] <CMD> [ARGS...]")]
    MissingCommand,

    /// The config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The current working directory is not accessible.
    #[error("unable to determine working directory: {0}")]
    Cwd(#[source] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_extension_display() {
        let error = CoreError::InvalidExtension("g.o".to_string());
        assert_eq!(error.to_string(), "invalid extension \"g.o\"");
    }

    #[test]
    fn test_config_read_display_includes_path() {
        let error = CoreError::ConfigRead {
            path: PathBuf::from("/etc/rewatch.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let display = error.to_string();
        assert!(display.contains("/etc/rewatch.toml"));
        assert!(display.contains("denied"));
    }
}
