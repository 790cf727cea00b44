//! Raw-mode stdin: control bytes become commands, everything else goes to
//! the child.
//!
//! [`Interpreter`] is the pure byte-to-action mapping, including double-press
//! detection. [`InputReader`] is the thread that feeds it from stdin and
//! applies the actions.

use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rewatch_core::{Context, ControlCommand, EchoMode, KillSignal, DOUBLE_PRESS_WINDOW, HOTKEY_HELP};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::ControlRequest;
use crate::error::{Result, SupervisorError};
use crate::lifecycle::Lifecycle;

/// What a single input byte asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// First press of a signal hotkey: signal the child only.
    Signal(KillSignal),
    /// Second press within the window: shut the supervisor down.
    Shutdown(KillSignal),
    /// A non-signal hotkey (restart, print command, print help).
    Command(ControlCommand),
    /// Data for the child.
    Forward(u8),
}

/// Maps bytes to actions, remembering the last byte for double-press
/// detection.
#[derive(Debug)]
pub struct Interpreter {
    last: Option<(u8, Instant)>,
    window: Duration,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(DOUBLE_PRESS_WINDOW)
    }
}

impl Interpreter {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    pub fn interpret(&mut self, byte: u8) -> InputAction {
        self.interpret_at(byte, Instant::now())
    }

    /// Interprets `byte` as received at `now`.
    pub fn interpret_at(&mut self, byte: u8, now: Instant) -> InputAction {
        let previous = self.last.replace((byte, now));

        let Some(command) = ControlCommand::from_byte(byte) else {
            return InputAction::Forward(byte);
        };
        let Some(sig) = command.kill_signal() else {
            return InputAction::Command(command);
        };

        let repeated = previous.is_some_and(|(last_byte, at)| {
            last_byte == byte && now.saturating_duration_since(at) < self.window
        });
        if repeated {
            self.last = None;
            InputAction::Shutdown(sig)
        } else {
            InputAction::Signal(sig)
        }
    }
}

/// Handle to the stdin reader thread.
///
/// The thread blocks in `read` and cannot be interrupted; [`stop`](Self::stop)
/// makes it discard whatever it reads next and exit.
pub struct InputReader {
    stopped: Arc<AtomicBool>,
}

impl InputReader {
    pub fn spawn(
        ctx: Arc<Context>,
        lifecycle: Arc<Lifecycle>,
        requests: mpsc::UnboundedSender<ControlRequest>,
    ) -> Result<Self> {
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        thread::Builder::new()
            .name("rewatch-stdin".to_string())
            .spawn(move || read_loop(&ctx, &lifecycle, &requests, &flag))
            .map_err(|source| SupervisorError::Thread {
                name: "stdin reader",
                source,
            })?;
        Ok(Self { stopped })
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

fn read_loop(
    ctx: &Context,
    lifecycle: &Lifecycle,
    requests: &mpsc::UnboundedSender<ControlRequest>,
    stopped: &AtomicBool,
) {
    let mut interpreter = Interpreter::default();
    let mut stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buf = [0u8; 1];

    loop {
        match stdin.read(&mut buf) {
            Ok(0) => {
                debug!("stdin closed, hotkeys disabled");
                return;
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "failed to read stdin, hotkeys disabled");
                return;
            }
        }
        if stopped.load(Ordering::SeqCst) {
            return;
        }

        let action = interpreter.interpret(buf[0]);
        if !apply(ctx, lifecycle, requests, action, &mut stdout) {
            return;
        }
    }
}

/// Carries out one action, echoing forwarded bytes to `echo` when the
/// terminal doesn't. Returns false once the controller is gone.
fn apply<W: Write>(
    ctx: &Context,
    lifecycle: &Lifecycle,
    requests: &mpsc::UnboundedSender<ControlRequest>,
    action: InputAction,
    echo: &mut W,
) -> bool {
    let request = match action {
        InputAction::Forward(byte) => {
            lifecycle.write_char(byte);
            if ctx.effective_echo() == EchoMode::Manual {
                let _ = echo.write_all(&[byte]).and_then(|()| echo.flush());
            }
            return true;
        }
        InputAction::Command(ControlCommand::PrintCommand) => {
            info!("current command: {:?}", ctx.argv);
            return true;
        }
        InputAction::Command(ControlCommand::PrintHelp) => {
            info!("{HOTKEY_HELP}");
            return true;
        }
        InputAction::Command(ControlCommand::Restart) => {
            debug!("received ^R, restarting");
            ControlRequest::Restart
        }
        // Signal hotkeys arrive as Signal/Shutdown, never here.
        InputAction::Command(command) => {
            debug!(key = command.caret(), "ignoring hotkey");
            return true;
        }
        InputAction::Signal(sig) => {
            debug!("broadcasting {sig} to subprocesses; repeat within 1s to kill rewatch");
            ControlRequest::Signal(sig)
        }
        InputAction::Shutdown(sig) => {
            info!("received {sig} hotkey twice, shutting down");
            ControlRequest::Kill(sig)
        }
    };
    requests.send(request).is_ok()
}
