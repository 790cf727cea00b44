//! Wiring and ordered teardown.

use std::sync::Arc;

use rewatch_core::{Context, KillSignal, RestartPolicy};
use rewatch_proc::{DescendantSource, Discovery};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::controller::{Controller, Inbox};
use crate::error::{Result, SupervisorError};
use crate::input::InputReader;
use crate::lifecycle::{Lifecycle, OsSignaller, Signaller};
use crate::relay::SignalRelay;
use crate::terminal::{StdinTerm, TerminalMode};
use crate::watcher::FsWatcher;

/// Owns every resource that must be released before the process exits.
///
/// The [`Controller`] returned alongside it is meant to run in its own task,
/// so a panic there still leaves this value available for [`deinit`](Self::deinit).
pub struct Supervisor {
    ctx: Arc<Context>,
    input: Option<InputReader>,
    terminal: TerminalMode,
    /// Absent when the handlers could not be installed.
    relay: Option<SignalRelay>,
    watcher: FsWatcher,
    lifecycle: Arc<Lifecycle>,
}

impl Supervisor {
    /// Starts with the platform process table and real signals.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(ctx: Arc<Context>) -> Result<(Self, Controller)> {
        Self::start_with(ctx, Arc::new(Discovery::platform()), Arc::new(OsSignaller))
    }

    pub fn start_with(
        ctx: Arc<Context>,
        discovery: Arc<dyn DescendantSource>,
        signaller: Arc<dyn Signaller>,
    ) -> Result<(Self, Controller)> {
        let (fs_tx, fs_events) = mpsc::unbounded_channel();
        let watcher = FsWatcher::start(&ctx.watch, fs_tx)?;
        if !ctx.watch_is_default {
            for dir in &ctx.watch {
                debug!(dir = %dir.display(), "watching");
            }
        }

        let (signal_tx, signals) = mpsc::unbounded_channel();
        let relay = relay_or_degrade(SignalRelay::subscribe(signal_tx));

        // Nothing after this point may fail before the terminal is owned by
        // the returned value.
        let mut terminal = TerminalMode::new(StdinTerm::new(), ctx.raw, ctx.echo);
        terminal.init();
        let ctx = if ctx.raw && !terminal.is_active() {
            Arc::new(Context {
                raw: false,
                ..(*ctx).clone()
            })
        } else {
            ctx
        };

        let (exit_tx, exits) = mpsc::unbounded_channel();
        let lifecycle = Arc::new(Lifecycle::new(Arc::clone(&ctx), discovery, signaller, exit_tx));

        let (request_tx, requests) = mpsc::unbounded_channel();
        let input = if ctx.raw {
            match InputReader::spawn(Arc::clone(&ctx), Arc::clone(&lifecycle), request_tx) {
                Ok(reader) => Some(reader),
                Err(e) => {
                    warn!(error = %e, "hotkeys unavailable");
                    None
                }
            }
        } else {
            None
        };

        let policy: Arc<dyn RestartPolicy> = Arc::new(ctx.filter.clone());
        let controller = Controller::new(
            Arc::clone(&ctx),
            Arc::clone(&lifecycle),
            policy,
            Inbox {
                exits,
                signals,
                fs_events,
                requests,
            },
        );

        let supervisor = Self {
            ctx,
            input,
            terminal,
            relay,
            watcher,
            lifecycle,
        };
        Ok((supervisor, controller))
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Signals the child's tree outside the controller, for crash paths.
    pub fn broadcast(&self, sig: KillSignal) {
        self.lifecycle.broadcast(sig);
    }

    /// Releases everything: input, terminal, signal handlers, watcher, child
    /// handle, in that order. Safe to call more than once.
    ///
    /// The terminal must be restored before the signal handlers go.
    pub fn deinit(&mut self) {
        if let Some(input) = self.input.take() {
            input.stop();
        }
        self.terminal.deinit();
        if let Some(relay) = self.relay.as_mut() {
            relay.deinit();
        }
        self.watcher.deinit();
        self.lifecycle.deinit();
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.deinit();
    }
}

/// Signals keep their default behavior when the relay can't be installed.
fn relay_or_degrade(relay: std::result::Result<SignalRelay, SupervisorError>) -> Option<SignalRelay> {
    match relay {
        Ok(relay) => Some(relay),
        Err(e) => {
            warn!(error = %e, "signal handling unavailable, continuing without it");
            None
        }
    }
}
