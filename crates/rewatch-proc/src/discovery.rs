//! Strategy selection: platform table first, `ps` on any failure.

use tracing::debug;

use crate::error::Result;
use crate::ps::PsTable;
use crate::tree::{descendants, index_by_parent, ProcessDescriptor};

/// A full process listing taken at one instant.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub processes: Vec<ProcessDescriptor>,
    /// A helper process spawned only to take this snapshot, hidden from results.
    pub exclude: Option<u32>,
}

/// One way of listing all processes on the system.
pub trait ProcessTable: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Lists every process with its parent.
    fn snapshot(&self) -> Result<Snapshot>;
}

/// Anything that can enumerate the descendants of a pid.
///
/// The subprocess lifecycle manager depends on this rather than on
/// [`Discovery`] so tests can supply a fixed tree.
pub trait DescendantSource: Send + Sync {
    /// Pids transitively descended from `root`, sorted descending.
    fn descendants(&self, root: u32) -> Result<Vec<u32>>;
}

/// Descendant discovery with a platform strategy and a portable fallback.
pub struct Discovery {
    primary: Box<dyn ProcessTable>,
    fallback: Box<dyn ProcessTable>,
}

impl Discovery {
    #[must_use]
    pub fn new(primary: Box<dyn ProcessTable>, fallback: Box<dyn ProcessTable>) -> Self {
        Self { primary, fallback }
    }

    /// The fastest table for the target OS, falling back on `ps`.
    #[must_use]
    pub fn platform() -> Self {
        #[cfg(target_os = "linux")]
        let primary: Box<dyn ProcessTable> = Box::new(crate::procfs_table::ProcfsTable);
        #[cfg(not(target_os = "linux"))]
        let primary: Box<dyn ProcessTable> = Box::new(crate::sysinfo_table::SysinfoTable);

        Self::new(primary, Box::new(PsTable))
    }

    /// Takes a snapshot with the primary table, or the fallback if it fails.
    pub fn snapshot(&self) -> Result<Snapshot> {
        match self.primary.snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                debug!(
                    table = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "unable to list processes, falling back"
                );
                self.fallback.snapshot()
            }
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::platform()
    }
}

impl DescendantSource for Discovery {
    fn descendants(&self, root: u32) -> Result<Vec<u32>> {
        let snapshot = self.snapshot()?;
        let index = index_by_parent(&snapshot.processes);
        Ok(descendants(&index, root, snapshot.exclude))
    }
}
