//! Descendant traversal over a parent -> children index.

use std::collections::{BTreeSet, HashMap, HashSet};

/// One row of a process listing. Only lives for the duration of a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessDescriptor {
    pub pid: u32,
    pub ppid: u32,
}

impl ProcessDescriptor {
    pub fn new(pid: u32, ppid: u32) -> Self {
        Self { pid, ppid }
    }
}

/// Indexes child pids by parent pid, preserving listing order.
#[must_use]
pub fn index_by_parent(processes: &[ProcessDescriptor]) -> HashMap<u32, Vec<u32>> {
    let mut index: HashMap<u32, Vec<u32>> = HashMap::with_capacity(processes.len());
    for row in processes {
        index.entry(row.ppid).or_default().push(row.pid);
    }
    index
}

/// Returns every pid transitively descended from `root`, sorted descending.
///
/// `root` itself is never included. `exclude` and its whole subtree are
/// skipped; this is how the `ps` helper spawned for the lookup hides itself.
/// Visited pids are tracked, so cyclic or duplicated rows terminate.
#[must_use]
pub fn descendants(index: &HashMap<u32, Vec<u32>>, root: u32, exclude: Option<u32>) -> Vec<u32> {
    let mut visited: HashSet<u32> = HashSet::from([root]);
    let mut found: BTreeSet<u32> = BTreeSet::new();
    let mut stack: Vec<u32> = index.get(&root).cloned().unwrap_or_default();

    while let Some(pid) = stack.pop() {
        if Some(pid) == exclude || !visited.insert(pid) {
            continue;
        }
        found.insert(pid);
        if let Some(children) = index.get(&pid) {
            stack.extend(children.iter().copied());
        }
    }

    found.into_iter().rev().collect()
}
