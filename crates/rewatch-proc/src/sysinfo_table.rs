//! Process listing through `sysinfo`; the primary strategy outside Linux
//! (it uses the kernel process-table sysctl on macOS and the BSDs).

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::discovery::{ProcessTable, Snapshot};
use crate::error::{ProcError, Result};
use crate::tree::ProcessDescriptor;

#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoTable;

impl ProcessTable for SysinfoTable {
    fn name(&self) -> &'static str {
        "sysinfo"
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let mut system = System::new();
        // Parent pids come with the base refresh; no cpu/memory/disk needed.
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new(),
        );

        let processes: Vec<ProcessDescriptor> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| {
                let parent = process.parent()?;
                Some(ProcessDescriptor::new(pid.as_u32(), parent.as_u32()))
            })
            .collect();

        if processes.is_empty() {
            return Err(ProcError::TableRead("no processes listed".to_string()));
        }

        Ok(Snapshot {
            processes,
            exclude: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_lists_spawned_child_under_current_process() {
        let mut child = Command::new("sleep").arg("2").spawn().unwrap();
        let snapshot = SysinfoTable.snapshot();
        let child_pid = child.id();
        let _ = child.kill();
        let _ = child.wait();

        let snapshot = snapshot.unwrap();
        let row = snapshot.processes.iter().find(|p| p.pid == child_pid).unwrap();
        assert_eq!(row.ppid, std::process::id());
    }
}
