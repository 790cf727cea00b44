//! The controller: the single task that decides what happens next.
//!
//! Every other component reports through a channel consumed here, so
//! restarts, signal forwarding and shutdown never race each other.
//!
//! ```text
//!  exit waiter ──ChildExit──┐
//!  signal relay ─KillSignal─┤
//!  fs watcher ───FsEvent────┼──> Controller::run ──> Lifecycle
//!  stdin reader ─ControlRequest┘
//! ```

use std::io;
use std::sync::Arc;

use rewatch_core::{Context, FsEvent, KillSignal, RestartPolicy};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::lifecycle::{ChildExit, Lifecycle};
use crate::screen;

/// Requests raised by the input interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Restart,
    /// Signal the child's tree and keep running.
    Signal(KillSignal),
    /// Signal the child's tree and shut down.
    Kill(KillSignal),
}

/// Receiving ends of every channel the controller listens on.
pub struct Inbox {
    pub exits: mpsc::UnboundedReceiver<ChildExit>,
    pub signals: mpsc::UnboundedReceiver<KillSignal>,
    pub fs_events: mpsc::UnboundedReceiver<FsEvent>,
    pub requests: mpsc::UnboundedReceiver<ControlRequest>,
}

pub struct Controller {
    ctx: Arc<Context>,
    lifecycle: Arc<Lifecycle>,
    policy: Arc<dyn RestartPolicy>,
    inbox: Inbox,
}

impl Controller {
    pub fn new(
        ctx: Arc<Context>,
        lifecycle: Arc<Lifecycle>,
        policy: Arc<dyn RestartPolicy>,
        inbox: Inbox,
    ) -> Self {
        Self {
            ctx,
            lifecycle,
            policy,
            inbox,
        }
    }

    /// Runs until a kill event, which is returned after the child's tree
    /// has been signaled with it.
    ///
    /// Teardown and re-raising the signal are left to the caller.
    pub async fn run(mut self) -> KillSignal {
        if self.ctx.postpone {
            info!("first run postponed until a file changes or ^R");
        } else {
            self.restart();
        }

        loop {
            tokio::select! {
                Some(exit) = self.inbox.exits.recv() => self.on_exit(exit),
                Some(sig) = self.inbox.signals.recv() => return self.kill(sig),
                Some(event) = self.inbox.fs_events.recv() => self.on_fs_event(&event),
                Some(request) = self.inbox.requests.recv() => match request {
                    ControlRequest::Restart => self.restart(),
                    ControlRequest::Signal(sig) => self.lifecycle.broadcast(sig),
                    ControlRequest::Kill(sig) => return self.kill(sig),
                },
                else => {
                    warn!("all event sources closed, shutting down");
                    return self.kill(KillSignal::Terminate);
                }
            }
        }
    }

    fn restart(&self) {
        if let Err(e) = screen::clear(&mut io::stdout(), self.ctx.clear) {
            debug!(error = %e, "failed to clear terminal");
        }
        if let Err(e) = screen::marker(&mut io::stderr(), &self.ctx.prefix) {
            debug!(error = %e, "failed to write prefix");
        }
        if let Err(e) = self.lifecycle.restart() {
            error!("{e}");
        }
    }

    fn on_fs_event(&self, event: &FsEvent) {
        if !self.policy.accept(&event.path) {
            return;
        }
        if self.ctx.lazy && self.lifecycle.is_running() {
            debug!(event = %event, "subprocess still running, not restarting (lazy)");
            return;
        }
        debug!(event = %event, "restarting after file change");
        self.restart();
    }

    fn on_exit(&self, exit: ChildExit) {
        if !self.lifecycle.is_current(exit.generation) {
            debug!(pid = exit.pid, "ignoring exit of replaced subprocess");
            return;
        }

        match &exit.status {
            Ok(status) if status.success() => {
                debug!(pid = exit.pid, "done in {:?}", exit.elapsed);
            }
            Ok(status) => {
                if self.ctx.verbose || !self.ctx.child_reports_failures() {
                    warn!(pid = exit.pid, "error after {:?}: {status}", exit.elapsed);
                }
            }
            Err(e) => warn!(pid = exit.pid, error = %e, "failed to wait for subprocess"),
        }

        if let Err(e) = screen::marker(&mut io::stderr(), &self.ctx.suffix) {
            debug!(error = %e, "failed to write suffix");
        }
    }

    fn kill(&self, sig: KillSignal) -> KillSignal {
        debug!(signal = %sig, "shutting down");
        self.lifecycle.broadcast(sig);
        sig
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Signaller;
    use rewatch_core::PathFilter;
    use rewatch_proc::DescendantSource;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    struct NoTree;

    impl DescendantSource for NoTree {
        fn descendants(&self, _root: u32) -> rewatch_proc::Result<Vec<u32>> {
            Ok(Vec::new())
        }
    }

    struct NullSignaller;

    impl Signaller for NullSignaller {
        fn signal(&self, _pid: u32, _sig: KillSignal) -> io::Result<()> {
            Ok(())
        }
    }

    struct CountingPolicy(Mutex<Vec<PathBuf>>);

    impl RestartPolicy for CountingPolicy {
        fn accept(&self, path: &Path) -> bool {
            self.0.lock().unwrap().push(path.to_path_buf());
            path.extension().is_some_and(|ext| ext == "go")
        }
    }

    struct Harness {
        signals: mpsc::UnboundedSender<KillSignal>,
        fs_events: mpsc::UnboundedSender<FsEvent>,
        requests: mpsc::UnboundedSender<ControlRequest>,
        lifecycle: Arc<Lifecycle>,
        task: tokio::task::JoinHandle<KillSignal>,
    }

    fn start(ctx: Context, policy: Arc<dyn RestartPolicy>) -> Harness {
        let ctx = Arc::new(ctx);
        let (exit_tx, exits) = mpsc::unbounded_channel();
        let (signals, signal_rx) = mpsc::unbounded_channel();
        let (fs_events, fs_rx) = mpsc::unbounded_channel();
        let (requests, request_rx) = mpsc::unbounded_channel();
        let lifecycle = Arc::new(Lifecycle::new(
            Arc::clone(&ctx),
            Arc::new(NoTree),
            Arc::new(NullSignaller),
            exit_tx,
        ));
        let controller = Controller::new(
            ctx,
            Arc::clone(&lifecycle),
            policy,
            Inbox {
                exits,
                signals: signal_rx,
                fs_events: fs_rx,
                requests: request_rx,
            },
        );
        Harness {
            signals,
            fs_events,
            requests,
            lifecycle,
            task: tokio::spawn(controller.run()),
        }
    }

    fn context(postpone: bool) -> Context {
        let mut ctx = Context::new("true", Vec::new(), PathBuf::from("/"));
        ctx.postpone = postpone;
        ctx
    }

    async fn wait_for_pid(lifecycle: &Lifecycle, not: Option<u32>) -> u32 {
        for _ in 0..200 {
            if let Some(pid) = lifecycle.current_pid() {
                if Some(pid) != not {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subprocess never started");
    }

    #[tokio::test]
    async fn test_starts_immediately_and_stops_on_signal() {
        let h = start(context(false), Arc::new(PathFilter::default()));
        wait_for_pid(&h.lifecycle, None).await;
        h.signals.send(KillSignal::Terminate).unwrap();
        assert_eq!(h.task.await.unwrap(), KillSignal::Terminate);
    }

    #[tokio::test]
    async fn test_postpone_waits_for_trigger() {
        let h = start(context(true), Arc::new(PathFilter::default()));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.lifecycle.current_pid(), None);

        h.requests.send(ControlRequest::Restart).unwrap();
        wait_for_pid(&h.lifecycle, None).await;

        h.requests.send(ControlRequest::Kill(KillSignal::Interrupt)).unwrap();
        assert_eq!(h.task.await.unwrap(), KillSignal::Interrupt);
    }

    #[tokio::test]
    async fn test_rejected_fs_event_does_not_restart() {
        let policy = Arc::new(CountingPolicy(Mutex::new(Vec::new())));
        let h = start(context(true), Arc::clone(&policy) as Arc<dyn RestartPolicy>);

        h.fs_events.send(FsEvent::new("/proj/readme.txt", "Modify")).unwrap();
        h.fs_events.send(FsEvent::new("/proj/main.go", "Modify")).unwrap();
        let pid = wait_for_pid(&h.lifecycle, None).await;

        h.signals.send(KillSignal::Hangup).unwrap();
        assert_eq!(h.task.await.unwrap(), KillSignal::Hangup);
        assert_eq!(policy.0.lock().unwrap().len(), 2);
        assert_eq!(h.lifecycle.current_pid(), Some(pid));
    }

    #[tokio::test]
    async fn test_stale_exit_ignored() {
        let (exit_tx, exits) = mpsc::unbounded_channel();
        let (_signals, signal_rx) = mpsc::unbounded_channel();
        let (_fs, fs_rx) = mpsc::unbounded_channel();
        let (_req, request_rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(context(true));
        let lifecycle = Arc::new(Lifecycle::new(
            Arc::clone(&ctx),
            Arc::new(NoTree),
            Arc::new(NullSignaller),
            exit_tx,
        ));
        let controller = Controller::new(
            ctx,
            Arc::clone(&lifecycle),
            Arc::new(PathFilter::default()),
            Inbox {
                exits,
                signals: signal_rx,
                fs_events: fs_rx,
                requests: request_rx,
            },
        );
        controller.on_exit(ChildExit {
            generation: 42,
            pid: 1,
            status: Err(io::Error::from(io::ErrorKind::Other)),
            elapsed: Duration::ZERO,
        });
        assert!(!lifecycle.is_current(42));
    }
}
