//! Process listing errors.

use thiserror::Error;

/// Errors from a process-table strategy.
#[derive(Debug, Error)]
pub enum ProcError {
    /// The kernel process table could not be read.
    #[error("failed to read process table: {0}")]
    TableRead(String),

    /// The `ps` tool could not be started.
    #[error("unable to invoke \"ps\" to list processes: {0}")]
    PsSpawn(#[source] std::io::Error),

    /// `ps` ran but reported failure.
    #[error("\"ps\" exited unsuccessfully: {0}")]
    PsFailed(String),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, ProcError>;
