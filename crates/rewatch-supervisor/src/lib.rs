//! rewatch supervisor - keeps one child command alive across restarts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ exit waiter  │   │ SignalRelay │   │   FsWatcher   │   │ InputReader  │
//! │ (per child)  │   │ HUP INT QUIT│   │   (notify)    │   │ (raw mode)   │
//! └──────┬───────┘   └──────┬──────┘   └───────┬───────┘   └──────┬───────┘
//!        └──────────────────┴────────┬─────────┴──────────────────┘
//!                                    v
//!                          ┌───────────────────┐
//!                          │    Controller     │
//!                          └─────────┬─────────┘
//!                                    v
//!                          ┌───────────────────┐     ┌─────────────────┐
//!                          │     Lifecycle     │────>│ DescendantSource│
//!                          └───────────────────┘     └─────────────────┘
//! ```
//!
//! # Shutdown
//!
//! A kill event makes [`Controller::run`] signal the child's tree and
//! return. The caller then runs [`Supervisor::deinit`] and
//! [`terminate_self`]. Teardown always runs in this order: descendants
//! signaled, terminal restored, signal handlers removed, signal re-raised.

pub mod controller;
pub mod error;
pub mod input;
pub mod lifecycle;
pub mod relay;
pub mod screen;
pub mod supervisor;
pub mod terminal;
pub mod watcher;

pub use controller::{ControlRequest, Controller, Inbox};
pub use error::{Result, SupervisorError};
pub use input::{InputAction, InputReader, Interpreter};
pub use lifecycle::{ChildExit, Lifecycle, OsSignaller, Signaller};
pub use relay::{terminate_self, SignalRelay};
pub use supervisor::Supervisor;
pub use terminal::{StdinTerm, TermDevice, TerminalMode};
pub use watcher::FsWatcher;
