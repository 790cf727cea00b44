//! Portable fallback: parse the output of `ps -eo pid=,ppid=`.

use std::process::{Command, Stdio};

use crate::discovery::{ProcessTable, Snapshot};
use crate::error::{ProcError, Result};
use crate::tree::ProcessDescriptor;

/// Lists processes by shelling out to `ps`.
///
/// The `ps` process is a child of the caller while it runs, so its own pid
/// is reported as [`Snapshot::exclude`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PsTable;

impl ProcessTable for PsTable {
    fn name(&self) -> &'static str {
        "ps"
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let child = Command::new("ps")
            .args(["-eo", "pid=,ppid="])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ProcError::PsSpawn)?;

        let ps_pid = child.id();
        let output = child.wait_with_output().map_err(ProcError::PsSpawn)?;
        if !output.status.success() {
            return Err(ProcError::PsFailed(output.status.to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(Snapshot {
            processes: parse_ps_output(&text),
            exclude: Some(ps_pid),
        })
    }
}

/// Parses `pid ppid` rows, skipping headers and anything malformed.
#[must_use]
pub fn parse_ps_output(text: &str) -> Vec<ProcessDescriptor> {
    text.lines().filter_map(parse_ps_line).collect()
}

/// A valid row is exactly two whitespace-separated non-negative integers.
fn parse_ps_line(line: &str) -> Option<ProcessDescriptor> {
    let mut fields = line.split_whitespace();
    let pid = fields.next()?.parse::<u32>().ok()?;
    let ppid = fields.next()?.parse::<u32>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(ProcessDescriptor::new(pid, ppid))
}
