//! Optional TOML config file.
//!
//! Keys mirror the long command-line flags:
//!
//! ```toml
//! tool = "go"
//! extensions = ["go", "mod", "html"]
//! ignore = [".git", "node_modules"]
//! clear = true
//! raw = true
//! echo = "manual"
//! suffix = ["----"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::options::EchoMode;

/// Name of the project-local config file, looked up in the CWD.
pub const LOCAL_CONFIG_FILE: &str = "rewatch.toml";

/// Settings read from a config file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub tool: Option<String>,
    pub verbose: bool,
    pub clear: bool,
    pub soft_clear: bool,
    pub raw: bool,
    pub echo: Option<EchoMode>,
    pub lazy: bool,
    pub postpone: bool,
    pub prefix: Vec<String>,
    pub suffix: Vec<String>,
    pub extensions: Option<Vec<String>>,
    pub watch: Option<Vec<PathBuf>>,
    pub ignore: Vec<PathBuf>,
}

impl FileConfig {
    /// Parses config text; `path` is only used for error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads and parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Finds and loads the effective config file.
    ///
    /// An explicit path must exist. Otherwise `./rewatch.toml` is tried, then
    /// `<config dir>/rewatch/config.toml`; if neither exists the defaults apply.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidates = [
            Some(cwd.join(LOCAL_CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("rewatch").join("config.toml")),
        ];

        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config file");
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }
}
