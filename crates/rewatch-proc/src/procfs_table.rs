//! Linux strategy: read parent pids from `/proc/<pid>/stat`.

use crate::discovery::{ProcessTable, Snapshot};
use crate::error::{ProcError, Result};
use crate::tree::ProcessDescriptor;

/// Lists processes through the `procfs` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsTable;

impl ProcessTable for ProcfsTable {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let all = procfs::process::all_processes()
            .map_err(|e| ProcError::TableRead(e.to_string()))?;

        // Entries vanish between listing and reading when processes exit;
        // those are skipped.
        let processes = all
            .filter_map(|entry| entry.ok())
            .filter_map(|process| process.stat().ok())
            .filter_map(|stat| {
                let pid = u32::try_from(stat.pid).ok()?;
                let ppid = u32::try_from(stat.ppid).ok()?;
                Some(ProcessDescriptor::new(pid, ppid))
            })
            .collect();

        Ok(Snapshot {
            processes,
            exclude: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_current_process_with_parent() {
        let snapshot = ProcfsTable.snapshot().unwrap();
        let me = std::process::id();
        let row = snapshot.processes.iter().find(|p| p.pid == me).unwrap();
        assert_eq!(row.ppid, std::os::unix::process::parent_id());
        assert!(snapshot.exclude.is_none());
    }
}
