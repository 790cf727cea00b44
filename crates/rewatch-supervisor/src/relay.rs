//! OS signal relay: the kill-set signals become events for the controller.

use rewatch_core::KillSignal;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Result, SupervisorError};

fn listen(sig: KillSignal) -> Result<Signal> {
    listen_raw(sig, sig.as_raw())
}

fn listen_raw(sig: KillSignal, raw: libc::c_int) -> Result<Signal> {
    signal(SignalKind::from_raw(raw)).map_err(|source| SupervisorError::SignalSubscribe { signal: sig, source })
}

/// Puts the default disposition back so a later `raise` terminates.
fn restore_default(sig: KillSignal) {
    // SAFETY: installs SIG_DFL; no handler code runs.
    unsafe {
        libc::signal(sig.as_raw(), libc::SIG_DFL);
    }
}

/// Subscription to SIGHUP, SIGINT, SIGQUIT and SIGTERM.
///
/// Must be created inside a tokio runtime. Other signals are left alone.
pub struct SignalRelay {
    task: Option<JoinHandle<()>>,
}

impl SignalRelay {
    /// Installs the handlers and forwards every delivery to `tx`.
    ///
    /// On failure every kill-set signal is back at its default disposition.
    pub fn subscribe(tx: mpsc::UnboundedSender<KillSignal>) -> Result<Self> {
        let streams = listen(KillSignal::Hangup).and_then(|hangup| {
            Ok((
                hangup,
                listen(KillSignal::Interrupt)?,
                listen(KillSignal::Quit)?,
                listen(KillSignal::Terminate)?,
            ))
        });
        let (mut hangup, mut interrupt, mut quit, mut terminate) = match streams {
            Ok(streams) => streams,
            Err(e) => {
                for sig in KillSignal::ALL {
                    restore_default(sig);
                }
                return Err(e);
            }
        };

        let task = tokio::spawn(async move {
            loop {
                let sig = tokio::select! {
                    Some(()) = hangup.recv() => KillSignal::Hangup,
                    Some(()) = interrupt.recv() => KillSignal::Interrupt,
                    Some(()) = quit.recv() => KillSignal::Quit,
                    Some(()) = terminate.recv() => KillSignal::Terminate,
                    else => break,
                };
                debug!(signal = %sig, "received signal");
                if tx.send(sig).is_err() {
                    break;
                }
            }
        });

        Ok(Self { task: Some(task) })
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.is_some()
    }

    /// Stops listening and restores default dispositions. Idempotent.
    pub fn deinit(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        for sig in KillSignal::ALL {
            restore_default(sig);
        }
        debug!("signal handlers removed");
    }
}

impl Drop for SignalRelay {
    fn drop(&mut self) {
        self.deinit();
    }
}

/// Re-raises `sig` against this process; exits with status 1 if that
/// does not terminate it.
///
/// Call only after teardown.
pub fn terminate_self(sig: KillSignal) -> ! {
    restore_default(sig);
    // SAFETY: raise has no memory-safety preconditions.
    unsafe {
        libc::raise(sig.as_raw());
    }
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_relays_signal_and_unsubscribes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut relay = SignalRelay::subscribe(tx).unwrap();
        assert!(relay.is_subscribed());

        unsafe {
            libc::kill(libc::getpid(), libc::SIGHUP);
        }
        let sig = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(sig, Some(KillSignal::Hangup));

        relay.deinit();
        relay.deinit();
        assert!(!relay.is_subscribed());
    }

    #[tokio::test]
    async fn test_uncatchable_signal_is_a_subscribe_error() {
        let err = listen_raw(KillSignal::Terminate, libc::SIGKILL).unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::SignalSubscribe {
                signal: KillSignal::Terminate,
                ..
            }
        ));
    }
}
