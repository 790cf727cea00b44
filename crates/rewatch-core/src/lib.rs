//! rewatch core - shared types for the supervisor
//!
//! This crate provides the domain types shared between the process
//! discovery crate, the supervisor crate and the `rewatch` binary:
//!
//! - `options` / `config` / `context` - startup configuration, resolved once
//! - `control` - the raw-mode control-byte table and hotkey help
//! - `filter` - the restart policy predicate for FS-change events
//! - `signal` - the fixed set of termination-class signals
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()` outside of tests.

pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod event;
pub mod filter;
pub mod options;
pub mod signal;

// Re-exports for convenience
pub use config::FileConfig;
pub use context::{ClearMode, Context};
pub use control::{ControlCommand, DOUBLE_PRESS_WINDOW, HOTKEY_HELP};
pub use error::{CoreError, Result};
pub use event::FsEvent;
pub use filter::{PathFilter, RestartPolicy};
pub use options::{Args, EchoMode};
pub use signal::KillSignal;
