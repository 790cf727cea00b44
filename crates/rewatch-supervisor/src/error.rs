//! Error types for the supervisor.
//!
//! Only startup failures and spawn failures surface as errors. Everything
//! that goes wrong while the loop is running is logged where it happens.
//!
//! **Panic-Free Policy:** No `.unwrap()`, `.expect()`, `panic!()`,
//! `unreachable!()`, or `todo!()` in this crate outside of tests.

use std::io;
use std::path::PathBuf;

use rewatch_core::KillSignal;
use thiserror::Error;

/// Supervisor errors.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The child command could not be started.
    ///
    /// Usually a missing executable or a bad working directory. The
    /// controller logs this and waits for the next trigger.
    #[error("failed to start {command:?}: {source}")]
    Spawn { command: String, source: io::Error },

    /// A helper thread (exit waiter or stdin reader) could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Thread { name: &'static str, source: io::Error },

    /// Installing a handler for one of the kill signals failed.
    #[error("failed to subscribe to {signal}: {source}")]
    SignalSubscribe { signal: KillSignal, source: io::Error },

    /// The platform file watcher could not be created.
    #[error("failed to create file watcher: {0}")]
    WatcherInit(#[source] notify::Error),

    /// A configured directory could not be watched.
    #[error("failed to watch {}: {source}", path.display())]
    Watch { path: PathBuf, source: notify::Error },
}

/// Result type alias using [`SupervisorError`].
pub type Result<T> = std::result::Result<T, SupervisorError>;
