//! rewatch - run a command and restart it when files change
//!
//! Runs `<TOOL> <CMD> [ARGS...]` (the tool defaults to `go`), restarts it
//! whenever a watched file changes, and makes sure every process it spawned
//! is signaled on the way out.
//!
//! # Usage
//!
//! ```bash
//! # go run . and restart on .go/.mod changes
//! rewatch run .
//!
//! # cargo, hotkeys enabled, clear the screen on every restart
//! rewatch -g cargo -r -c run
//!
//! # only restart once the previous run has finished
//! rewatch -l -e go,tmpl test ./...
//! ```
//!
//! Diagnostics go to stderr; stdout belongs to the child. `RUST_LOG`
//! overrides the default filter.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use crossterm::tty::IsTty;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use rewatch_core::{Args, Context, CoreError, FileConfig, KillSignal};
use rewatch_supervisor::{terminate_self, Supervisor};

/// Logging to stderr, `info` by default and `debug` when verbose.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in ["rewatch", "rewatch_core", "rewatch_proc", "rewatch_supervisor"] {
        // Note: these directives are built from constants and always parse.
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn load_context(args: Args) -> rewatch_core::Result<Context> {
    let cwd = env::current_dir().map_err(CoreError::Cwd)?;
    let file = FileConfig::discover(args.config.as_deref(), &cwd)?;
    let stdin_is_tty = std::io::stdin().is_tty();
    Context::resolve(args, file, cwd, stdin_is_tty)
}

/// How the supervisor stopped.
enum Outcome {
    Killed(KillSignal),
    Crashed,
}

async fn supervise(ctx: Arc<Context>) -> Result<Outcome> {
    let (mut supervisor, controller) =
        Supervisor::start(ctx).context("Failed to start supervisor")?;

    // The controller runs in its own task so a panic surfaces as a JoinError
    // here instead of skipping teardown.
    let joined = tokio::spawn(controller.run()).await;

    let outcome = match joined {
        Ok(sig) => Outcome::Killed(sig),
        Err(e) => {
            if e.is_panic() {
                error!("supervisor crashed, shutting down");
            } else {
                error!(error = %e, "supervisor task failed, shutting down");
            }
            supervisor.broadcast(KillSignal::Terminate);
            Outcome::Crashed
        }
    };

    supervisor.deinit();
    Ok(outcome)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.wants_help() {
        let _ = Args::command().print_help();
        return ExitCode::SUCCESS;
    }
    let verbose = args.verbose;

    let ctx = match load_context(args) {
        Ok(ctx) => ctx,
        Err(CoreError::MissingCommand) => Args::command()
            .error(ErrorKind::MissingRequiredArgument, "a command to run is required")
            .exit(),
        Err(e) => {
            init_tracing(verbose);
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(ctx.verbose);
    debug!(command = %ctx.command_line().join(" "), "rewatch starting");

    match supervise(Arc::new(ctx)).await {
        Ok(Outcome::Killed(sig)) => terminate_self(sig),
        Ok(Outcome::Crashed) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
