//! View state held next to the Node Store: expansion, selection, checks, search.

use std::collections::HashSet;

use serde::Serialize;

/// Mutable view state keyed by node id.
///
/// Indeterminate check state is not stored; see `domain::check`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeState {
    pub expanded: HashSet<String>,
    pub selected: HashSet<String>,
    pub checked: HashSet<String>,
    pub search_term: String,
}

impl TreeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every membership of the given ids.
    pub fn purge<'a>(&mut self, ids: impl IntoIterator<Item = &'a String>) {
        for id in ids {
            self.expanded.remove(id);
            self.selected.remove(id);
            self.checked.remove(id);
        }
    }

    /// Id-only copy for event consumers, sorted for deterministic diffs.
    pub fn snapshot(&self) -> TreeStateSnapshot {
        TreeStateSnapshot {
            expanded: sorted(&self.expanded),
            selected: sorted(&self.selected),
            checked: sorted(&self.checked),
            search_term: self.search_term.clone(),
        }
    }
}

fn sorted(ids: &HashSet<String>) -> Vec<String> {
    let mut ids: Vec<_> = ids.iter().cloned().collect();
    ids.sort();
    ids
}

/// Snapshot of `TreeState` carried by every emitted event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeStateSnapshot {
    pub expanded: Vec<String>,
    pub selected: Vec<String>,
    pub checked: Vec<String>,
    pub search_term: String,
}
