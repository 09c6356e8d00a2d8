//! Process tree discovery
//!
//! Walks a snapshot of the OS process table downwards from a root pid and
//! collects every transitive child. The snapshot itself comes from the
//! platform adapter (psutil on Linux/macOS, sysinfo on Windows); this module
//! only holds the platform-independent walk.
//!
//! A tree is computed fresh for every stop call and never cached.

use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessTreeError {
    #[cfg(unix)]
    #[error("Failed to get process information: {0}")]
    ProcessInfo(#[from] psutil::Error),
    /// sysinfo snapshot that could not be taken
    #[cfg(not(unix))]
    #[error("Failed to get process information: {0}")]
    ProcessInfo(String),
    #[error("Process table inspection is not available on this host for the {0} adapter")]
    UnsupportedPlatform(&'static str),
}

/// One row of a process table snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub parent: Option<u32>,
}

impl ProcessEntry {
    pub fn new(pid: u32, parent: Option<u32>) -> Self {
        Self { pid, parent }
    }
}

/// A root pid and all of its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTree {
    pub root: u32,
    /// Root first, then breadth-first order. No duplicates.
    pub pids: Vec<u32>,
}

impl ProcessTree {
    /// Tree made of the root alone, used when the table cannot be read
    pub fn root_only(root: u32) -> Self {
        Self {
            root,
            pids: vec![root],
        }
    }

    /// Walk `entries` from `root`. The root is always part of the result, even
    /// if it is missing from the snapshot; killing it is then a no-op.
    pub fn collect(root: u32, entries: &[ProcessEntry]) -> Self {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for entry in entries {
            if let Some(parent) = entry.parent {
                // A process reporting itself as parent would loop forever
                if parent != entry.pid {
                    children.entry(parent).or_default().push(entry.pid);
                }
            }
        }

        let mut seen = HashSet::from([root]);
        let mut pids = vec![root];
        let mut queue = VecDeque::from([root]);

        while let Some(pid) = queue.pop_front() {
            let Some(kids) = children.get(&pid) else {
                continue;
            };
            for &child in kids {
                if seen.insert(child) {
                    pids.push(child);
                    queue.push_back(child);
                }
            }
        }

        Self { root, pids }
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.pids.contains(&pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn table(rows: &[(u32, Option<u32>)]) -> Vec<ProcessEntry> {
        rows.iter()
            .map(|(pid, parent)| ProcessEntry::new(*pid, *parent))
            .collect()
    }

    #[test]
    fn test_collects_children_of_children() {
        let entries = table(&[
            (1, None),
            (4821, Some(1)),
            (5010, Some(4821)),
            (5011, Some(4821)),
            (6000, Some(5010)),
            (7000, Some(1)),
        ]);
        let tree = ProcessTree::collect(4821, &entries);
        assert_eq!(tree.pids, vec![4821, 5010, 5011, 6000]);
        assert!(!tree.contains(7000));
        assert!(!tree.contains(1));
    }

    #[test]
    fn test_root_missing_from_snapshot_is_still_reported() {
        let entries = table(&[(1, None), (2, Some(1))]);
        let tree = ProcessTree::collect(999, &entries);
        assert_eq!(tree, ProcessTree::root_only(999));
    }

    #[test]
    fn test_cycles_and_self_parents_terminate() {
        let entries = table(&[(10, Some(11)), (11, Some(10)), (12, Some(12))]);
        let tree = ProcessTree::collect(10, &entries);
        assert_eq!(tree.pids, vec![10, 11]);

        let tree = ProcessTree::collect(12, &entries);
        assert_eq!(tree.pids, vec![12]);
    }

    #[test]
    fn test_vanished_parent_cuts_branch() {
        // 5010 disappeared between listing and parent lookup: its child
        // still points at it, but nothing links 5010 to the root anymore.
        let entries = table(&[(4821, Some(1)), (5011, Some(4821)), (6000, Some(5010))]);
        let tree = ProcessTree::collect(4821, &entries);
        assert_eq!(tree.pids, vec![4821, 5011]);
    }

    proptest! {
        #[test]
        fn prop_walk_is_idempotent_and_duplicate_free(
            rows in proptest::collection::vec((1u32..64, proptest::option::of(1u32..64)), 0..128),
            root in 1u32..64,
        ) {
            let entries: Vec<ProcessEntry> = rows
                .iter()
                .map(|(pid, parent)| ProcessEntry::new(*pid, *parent))
                .collect();

            let first = ProcessTree::collect(root, &entries);
            let second = ProcessTree::collect(root, &entries);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.pids[0], root);

            let unique: HashSet<u32> = first.pids.iter().copied().collect();
            prop_assert_eq!(unique.len(), first.pids.len());
        }
    }
}
