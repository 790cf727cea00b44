//! Command-line options.
//!
//! Everything after the first positional argument belongs to the child:
//!
//! ```text
//! rewatch    -c -v          test     -v -count=1    .
//!            ^ flags        ^ cmd    ^ cmd flags    ^ cmd args
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::control::HOTKEY_HELP;

/// How typed characters are echoed while the terminal is in raw mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoMode {
    /// No echo at all.
    #[value(alias = "none")]
    #[serde(alias = "none")]
    Off,
    /// The supervisor echoes forwarded bytes to stdout itself.
    #[default]
    Manual,
    /// Leave the terminal's own echo enabled.
    Preserve,
}

/// Run a command, watch files, and restart it on changes.
#[derive(Parser, Debug, Default)]
#[command(name = "rewatch", version, about, after_help = HOTKEY_HELP)]
pub struct Args {
    /// Program to invoke; CMD and its args are appended [default: go]
    #[arg(short = 'g', long, value_name = "TOOL")]
    pub tool: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Clear terminal (including scrollback) on restart
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Soft-clear terminal on restart, keeping scrollback
    #[arg(short = 's', long)]
    pub soft_clear: bool,

    /// Enable hotkeys via terminal raw mode
    #[arg(short = 'r', long)]
    pub raw: bool,

    /// Stdin echoing in raw mode [default: manual]
    #[arg(long, value_enum, value_name = "MODE")]
    pub echo: Option<EchoMode>,

    /// Lazy mode: restart on file changes only when the command is not running
    #[arg(short = 'l', long)]
    pub lazy: bool,

    /// Postpone first run until a file change or ^R
    #[arg(short = 'p', long)]
    pub postpone: bool,

    /// Text printed before each run; repeatable; supports \n
    #[arg(short = 'P', long, value_name = "TEXT")]
    pub prefix: Vec<String>,

    /// Text printed after each run; repeatable; supports \n
    #[arg(short = 'S', long, value_name = "TEXT")]
    pub suffix: Vec<String>,

    /// Extensions to watch; repeatable or comma-separated [default: go,mod]
    #[arg(short = 'e', long = "ext", value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Directories to watch, relative to CWD; repeatable or comma-separated [default: .]
    #[arg(short = 'w', long, value_delimiter = ',', value_name = "DIR")]
    pub watch: Vec<PathBuf>,

    /// Ignored directories, relative to CWD; repeatable or comma-separated
    #[arg(short = 'i', long, value_delimiter = ',', value_name = "DIR")]
    pub ignore: Vec<PathBuf>,

    /// Config file [default: ./rewatch.toml, then <config dir>/rewatch/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Command and arguments passed to the tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CMD")]
    pub command: Vec<String>,
}

impl Args {
    /// True for `rewatch help`, which prints usage like `--help`.
    #[must_use]
    pub fn wants_help(&self) -> bool {
        self.command.first().is_some_and(|word| word == "help")
    }
}
