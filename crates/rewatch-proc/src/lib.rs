//! rewatch proc - descendant process discovery
//!
//! Finds every process transitively spawned by a given pid. Signals are
//! broadcast to this explicit set of pids rather than to a process group:
//! putting the child in its own group breaks TTY ownership detection in the
//! processes it spawns.
//!
//! # Strategies
//!
//! ```text
//! Discovery
//!   primary:  ProcfsTable (Linux) | SysinfoTable (elsewhere)
//!   fallback: PsTable (`ps -eo pid=,ppid=`, any Unix)
//!         |
//!         v
//!   parent -> children index -> depth-first walk -> pids, descending
//! ```
//!
//! # Panic-Free Guarantees
//!
//! No `.unwrap()`, `.expect()`, `panic!()` outside tests. Unreadable or
//! malformed process entries are skipped, never fatal.

pub mod discovery;
pub mod error;
pub mod ps;
#[cfg(target_os = "linux")]
pub mod procfs_table;
pub mod sysinfo_table;
pub mod tree;

pub use discovery::{DescendantSource, Discovery, ProcessTable, Snapshot};
pub use error::{ProcError, Result};
pub use ps::PsTable;
#[cfg(target_os = "linux")]
pub use procfs_table::ProcfsTable;
pub use sysinfo_table::SysinfoTable;
pub use tree::{descendants, index_by_parent, ProcessDescriptor};
