//! Subprocess lifecycle: at most one child, replaced on every restart.
//!
//! The child is started synchronously under the slot lock. Waiting for it
//! runs on a dedicated thread that reports a [`ChildExit`] tagged with the
//! generation it was started under, so an exit report from a child that
//! has since been replaced is recognisable as stale.
//!
//! Signals go to every descendant of the supervisor, found through a
//! [`DescendantSource`], never to a process group.
//!
//! In raw mode the child's stdin pipe is owned by a per-child writer thread
//! fed through a channel. A child that stops reading can fill the pipe and
//! stall that thread, but never the slot lock.

use std::io::{self, Write};
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rewatch_core::{Context, KillSignal};
use rewatch_proc::DescendantSource;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SupervisorError};

/// Delivers a signal to a single pid.
pub trait Signaller: Send + Sync {
    fn signal(&self, pid: u32, sig: KillSignal) -> io::Result<()>;
}

/// Sends real signals with `kill(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignaller;

impl Signaller for OsSignaller {
    fn signal(&self, pid: u32, sig: KillSignal) -> io::Result<()> {
        let pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        if pid <= 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "refusing to signal a group"));
        }
        let result = unsafe { libc::kill(pid, sig.as_raw()) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Completion report from an exit-waiter thread.
#[derive(Debug)]
pub struct ChildExit {
    pub generation: u64,
    pub pid: u32,
    pub status: io::Result<ExitStatus>,
    pub elapsed: Duration,
}

struct Running {
    pid: u32,
    generation: u64,
    /// Feeds the stdin writer thread. Present only in raw mode, and dropped
    /// once that thread has given up on the pipe.
    stdin: Option<mpsc::UnboundedSender<u8>>,
    exited: Arc<AtomicBool>,
}

/// Drains `bytes` into the child's stdin until the pipe or channel closes.
fn spawn_stdin_writer(pid: u32, mut pipe: ChildStdin) -> io::Result<mpsc::UnboundedSender<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
    thread::Builder::new()
        .name(format!("rewatch-stdin-{pid}"))
        .spawn(move || {
            while let Some(byte) = rx.blocking_recv() {
                if let Err(e) = pipe.write_all(&[byte]).and_then(|()| pipe.flush()) {
                    debug!(pid, error = %e, "subprocess stdin closed");
                    return;
                }
            }
        })?;
    Ok(tx)
}

#[derive(Default)]
struct Slot {
    current: Option<Running>,
    generation: u64,
}

/// Starts, replaces and signals the child command.
pub struct Lifecycle {
    ctx: Arc<Context>,
    discovery: Arc<dyn DescendantSource>,
    signaller: Arc<dyn Signaller>,
    exit_tx: mpsc::UnboundedSender<ChildExit>,
    slot: Mutex<Slot>,
}

impl Lifecycle {
    pub fn new(
        ctx: Arc<Context>,
        discovery: Arc<dyn DescendantSource>,
        signaller: Arc<dyn Signaller>,
        exit_tx: mpsc::UnboundedSender<ChildExit>,
    ) -> Self {
        Self {
            ctx,
            discovery,
            signaller,
            exit_tx,
            slot: Mutex::new(Slot::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Terminates the current child's tree, if any, then starts a new child.
    ///
    /// On failure nothing is left running and the slot stays empty.
    pub fn restart(&self) -> Result<u32> {
        let mut slot = self.lock();

        if let Some(previous) = slot.current.take() {
            debug!(pid = previous.pid, "stopping subprocess before restart");
            drop(previous.stdin);
            self.broadcast(KillSignal::Terminate);
        }

        let mut command = Command::new(&self.ctx.tool);
        command
            .args(&self.ctx.args)
            .current_dir(&self.ctx.cwd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdin(if self.ctx.raw {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        let mut child = command.spawn().map_err(|source| SupervisorError::Spawn {
            command: self.ctx.command_line().join(" "),
            source,
        })?;
        let pid = child.id();
        let stdin = match child.stdin.take().map(|pipe| spawn_stdin_writer(pid, pipe)).transpose() {
            Ok(stdin) => stdin,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SupervisorError::Thread {
                    name: "stdin writer",
                    source,
                });
            }
        };

        slot.generation += 1;
        let generation = slot.generation;
        let exited = Arc::new(AtomicBool::new(false));
        let started = Instant::now();

        let exit_tx = self.exit_tx.clone();
        let exited_flag = Arc::clone(&exited);
        let waiter = thread::Builder::new()
            .name(format!("rewatch-wait-{pid}"))
            .spawn(move || {
                let status = child.wait();
                exited_flag.store(true, Ordering::SeqCst);
                let _ = exit_tx.send(ChildExit {
                    generation,
                    pid,
                    status,
                    elapsed: started.elapsed(),
                });
            });

        if let Err(source) = waiter {
            let _ = self.signaller.signal(pid, KillSignal::Terminate);
            return Err(SupervisorError::Thread {
                name: "exit waiter",
                source,
            });
        }

        debug!(pid, generation, command = ?self.ctx.command_line(), "started subprocess");
        slot.current = Some(Running {
            pid,
            generation,
            stdin,
            exited,
        });
        Ok(pid)
    }

    /// True while the tracked child has not reported completion.
    ///
    /// May be stale as soon as it returns.
    pub fn is_running(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|running| !running.exited.load(Ordering::SeqCst))
    }

    /// Pid of the tracked child, exited or not.
    pub fn current_pid(&self) -> Option<u32> {
        self.lock().current.as_ref().map(|running| running.pid)
    }

    /// True if `generation` belongs to the tracked child.
    pub fn is_current(&self, generation: u64) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|running| running.generation == generation)
    }

    /// Sends `sig` to every descendant of the supervisor.
    ///
    /// A no-op when there are none. Partial failures are logged.
    pub fn broadcast(&self, sig: KillSignal) {
        let pids = match self.discovery.descendants(self.ctx.pid) {
            Ok(pids) => pids,
            Err(e) => {
                warn!(signal = %sig, error = %e, "unable to list subprocesses");
                return;
            }
        };

        if pids.is_empty() {
            debug!(signal = %sig, "no subprocesses to signal");
            return;
        }

        let mut succeeded = Vec::with_capacity(pids.len());
        let mut failed = Vec::new();
        for pid in pids {
            match self.signaller.signal(pid, sig) {
                Ok(()) => succeeded.push(pid),
                Err(e) => {
                    debug!(pid, signal = %sig, error = %e, "signal failed");
                    failed.push(pid);
                }
            }
        }

        if failed.is_empty() {
            debug!(signal = %sig, pids = ?succeeded, "signaled subprocesses");
        } else {
            warn!(signal = %sig, ?succeeded, ?failed, "failed to signal some subprocesses");
        }
    }

    /// Queues one byte for the child's stdin. Never blocks on the pipe.
    ///
    /// Once the writer has failed, later bytes are discarded silently.
    pub fn write_char(&self, byte: u8) {
        let mut slot = self.lock();
        let Some(running) = slot.current.as_mut() else {
            return;
        };
        if running.stdin.as_ref().is_some_and(|tx| tx.send(byte).is_err()) {
            running.stdin = None;
        }
    }

    /// Sends SIGTERM to the tree of a tracked child, then forgets the child
    /// and closes its stdin. Idempotent.
    pub fn deinit(&self) {
        let mut slot = self.lock();
        if let Some(running) = slot.current.take() {
            drop(running.stdin);
            self.broadcast(KillSignal::Terminate);
            debug!(pid = running.pid, "released subprocess");
        }
    }
}
