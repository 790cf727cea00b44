//! The startup context: every setting resolved once and shared read-only.
//!
//! Built from CLI options merged over the config file, then handed to each
//! component as `Arc<Context>`. Nothing in here changes after startup.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::FileConfig;
use crate::error::{CoreError, Result};
use crate::filter::{normalize_path, validate_extension, PathFilter};
use crate::options::{Args, EchoMode};

pub const DEFAULT_TOOL: &str = "go";
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["go", "mod"];
pub const DEFAULT_WATCH: &str = ".";

/// Subcommands that report their own failures; their non-zero exits are
/// not logged again unless verbose.
const SELF_REPORTING_COMMANDS: [&str; 2] = ["run", "test"];

/// Terminal clearing applied on every restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearMode {
    #[default]
    Off,
    /// Clear the screen, keep scrollback.
    Soft,
    /// Clear the screen and scrollback.
    Hard,
}

/// Resolved supervisor configuration.
#[derive(Debug, Clone)]
pub struct Context {
    /// Program to invoke.
    pub tool: String,
    /// Arguments appended to `tool`.
    pub args: Vec<String>,
    pub verbose: bool,
    pub clear: ClearMode,
    /// Raw mode requested and stdin is a terminal.
    pub raw: bool,
    pub echo: EchoMode,
    pub lazy: bool,
    pub postpone: bool,
    /// Printed before each run, newline-terminated or empty.
    pub prefix: String,
    /// Printed after each run, newline-terminated or empty.
    pub suffix: String,
    /// Absolute directories to watch.
    pub watch: Vec<PathBuf>,
    /// True when `watch` is the built-in default.
    pub watch_is_default: bool,
    pub filter: PathFilter,
    pub cwd: PathBuf,
    /// Our own pid; root of descendant discovery.
    pub pid: u32,
    /// The supervisor's own command line, printed by the ^- hotkey.
    pub argv: Vec<String>,
}

impl Context {
    /// A context with defaults for every policy, running `tool args...`.
    #[must_use]
    pub fn new(tool: impl Into<String>, args: Vec<String>, cwd: PathBuf) -> Self {
        let watch = vec![normalize_path(Path::new(DEFAULT_WATCH), &cwd)];
        let filter = PathFilter::new(
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            &[] as &[PathBuf],
            &cwd,
        );
        Self {
            tool: tool.into(),
            args,
            verbose: false,
            clear: ClearMode::Off,
            raw: false,
            echo: EchoMode::default(),
            lazy: false,
            postpone: false,
            prefix: String::new(),
            suffix: String::new(),
            watch,
            watch_is_default: true,
            filter,
            cwd,
            pid: std::process::id(),
            argv: std::env::args().collect(),
        }
    }

    /// Merges CLI options over the config file.
    ///
    /// Booleans are OR-ed; lists and strings from the CLI win when given.
    /// `stdin_is_tty` gates raw mode, which makes no sense without a terminal.
    pub fn resolve(args: Args, file: FileConfig, cwd: PathBuf, stdin_is_tty: bool) -> Result<Self> {
        if args.command.is_empty() {
            return Err(CoreError::MissingCommand);
        }

        let verbose = args.verbose || file.verbose;

        let extensions = if !args.extensions.is_empty() {
            args.extensions
        } else if let Some(exts) = file.extensions {
            exts
        } else {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        };
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        for ext in &extensions {
            validate_extension(ext)?;
        }

        let (watch, watch_is_default) = if !args.watch.is_empty() {
            (args.watch, false)
        } else if let Some(dirs) = file.watch {
            (dirs, false)
        } else {
            (vec![PathBuf::from(DEFAULT_WATCH)], true)
        };
        let watch = watch.iter().map(|dir| normalize_path(dir, &cwd)).collect();

        let ignore = if !args.ignore.is_empty() { args.ignore } else { file.ignore };
        let filter = PathFilter::new(extensions, &ignore, &cwd);

        let clear = if args.clear || file.clear {
            ClearMode::Hard
        } else if args.soft_clear || file.soft_clear {
            ClearMode::Soft
        } else {
            ClearMode::Off
        };

        let mut raw = args.raw || file.raw;
        if raw && !stdin_is_tty {
            raw = false;
            debug!("not in an interactive terminal, disabling raw mode and hotkeys");
        }

        let prefix = if args.prefix.is_empty() { file.prefix } else { args.prefix };
        let suffix = if args.suffix.is_empty() { file.suffix } else { args.suffix };

        Ok(Self {
            tool: args.tool.or(file.tool).unwrap_or_else(|| DEFAULT_TOOL.to_string()),
            args: args.command,
            verbose,
            clear,
            raw,
            echo: args.echo.or(file.echo).unwrap_or_default(),
            lazy: args.lazy || file.lazy,
            postpone: args.postpone || file.postpone,
            prefix: join_markers(&prefix),
            suffix: join_markers(&suffix),
            watch,
            watch_is_default,
            filter,
            cwd,
            pid: std::process::id(),
            argv: std::env::args().collect(),
        })
    }

    /// Echo mode in effect; without raw mode the terminal echoes by itself.
    #[must_use]
    pub fn effective_echo(&self) -> EchoMode {
        if self.raw {
            self.echo
        } else {
            EchoMode::Off
        }
    }

    /// Full child command line, tool first.
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.tool.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// True if the child reports its own non-zero exit to the user.
    #[must_use]
    pub fn child_reports_failures(&self) -> bool {
        self.args
            .first()
            .is_some_and(|head| SELF_REPORTING_COMMANDS.contains(&head.as_str()))
    }
}

/// Expands `\n`, `\r\n` and `\r` escapes and newline-terminates each marker.
#[must_use]
pub fn join_markers(markers: &[String]) -> String {
    markers
        .iter()
        .map(|marker| {
            let mut text = marker
                .replace("\\r\\n", "\n")
                .replace("\\r", "\n")
                .replace("\\n", "\n");
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &[&str]) -> Args {
        Args {
            command: command.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn cwd() -> PathBuf {
        PathBuf::from("/proj")
    }

    #[test]
    fn test_defaults() {
        let ctx = Context::resolve(args(&["run", "."]), FileConfig::default(), cwd(), true).unwrap();
        assert_eq!(ctx.command_line(), vec!["go", "run", "."]);
        assert_eq!(ctx.filter.extensions(), ["go", "mod"]);
        assert_eq!(ctx.watch, vec![PathBuf::from("/proj")]);
        assert!(ctx.watch_is_default);
        assert_eq!(ctx.clear, ClearMode::Off);
        assert_eq!(ctx.echo, EchoMode::Manual);
        assert!(ctx.prefix.is_empty());
    }

    #[test]
    fn test_missing_command() {
        let err = Context::resolve(args(&[]), FileConfig::default(), cwd(), true).unwrap_err();
        assert!(matches!(err, CoreError::MissingCommand));
    }

    #[test]
    fn test_invalid_extension_rejected() {
        let mut a = args(&["vet"]);
        a.extensions = vec!["g*".to_string()];
        let err = Context::resolve(a, FileConfig::default(), cwd(), true).unwrap_err();
        assert!(matches!(err, CoreError::InvalidExtension(ext) if ext == "g*"));
    }

    #[test]
    fn test_raw_disabled_without_tty() {
        let mut a = args(&["vet"]);
        a.raw = true;
        let ctx = Context::resolve(a, FileConfig::default(), cwd(), false).unwrap();
        assert!(!ctx.raw);
        assert_eq!(ctx.effective_echo(), EchoMode::Off);
    }

    #[test]
    fn test_hard_clear_wins_over_soft() {
        let mut a = args(&["vet"]);
        a.soft_clear = true;
        let file = FileConfig {
            clear: true,
            ..Default::default()
        };
        let ctx = Context::resolve(a, file, cwd(), true).unwrap();
        assert_eq!(ctx.clear, ClearMode::Hard);
    }

    #[test]
    fn test_cli_lists_override_file() {
        let mut a = args(&["vet"]);
        a.extensions = vec!["rs".to_string()];
        a.ignore = vec![PathBuf::from("target")];
        let file = FileConfig {
            tool: Some("cargo".to_string()),
            extensions: Some(vec!["toml".to_string()]),
            ignore: vec![PathBuf::from(".git")],
            watch: Some(vec![PathBuf::from("src")]),
            ..Default::default()
        };
        let ctx = Context::resolve(a, file, cwd(), true).unwrap();
        assert_eq!(ctx.tool, "cargo");
        assert_eq!(ctx.filter.extensions(), ["rs"]);
        assert_eq!(ctx.filter.ignored(), [PathBuf::from("/proj/target")]);
        assert_eq!(ctx.watch, vec![PathBuf::from("/proj/src")]);
        assert!(!ctx.watch_is_default);
    }

    #[test]
    fn test_file_ignore_used_without_cli_ignore() {
        let file = FileConfig {
            ignore: vec![PathBuf::from(".git"), PathBuf::from("vendor")],
            ..Default::default()
        };
        let ctx = Context::resolve(args(&["vet"]), file, cwd(), true).unwrap();
        assert_eq!(
            ctx.filter.ignored(),
            [PathBuf::from("/proj/.git"), PathBuf::from("/proj/vendor")]
        );
    }

    #[test]
    fn test_child_reports_failures() {
        let run = Context::new("go", vec!["run".to_string(), ".".to_string()], cwd());
        let vet = Context::new("go", vec!["vet".to_string()], cwd());
        assert!(run.child_reports_failures());
        assert!(!vet.child_reports_failures());
    }

    #[test]
    fn test_join_markers_expands_escapes() {
        let markers = vec!["one\\ntwo".to_string(), "three\n".to_string(), "a\\r\\nb".to_string()];
        assert_eq!(join_markers(&markers), "one\ntwo\nthree\na\nb\n");
        assert_eq!(join_markers(&[]), "");
    }
}
