//! Selection half of the Selection/Check Coordinator.
//!
//! Selection is tracked by id so it survives structural edits of the tree.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::NodeStore;
use crate::domain::error::DomainResult;

/// Selection mode for the tree view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// At most one selected node; selecting replaces
    #[default]
    Single,
    /// Selecting toggles membership
    Multiple,
}

/// Ids that entered and left the selection in one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SelectionChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Select `id` according to `mode`.
///
/// Disabled or non-selectable nodes are an intentional no-op and yield an
/// empty change; unknown ids are an error.
#[instrument(level = "debug", skip(store, selected))]
pub fn select(
    store: &NodeStore,
    selected: &mut HashSet<String>,
    mode: SelectionMode,
    id: &str,
) -> DomainResult<SelectionChange> {
    let node = store.find_by_id(id)?;
    if node.data.disabled || !node.data.selectable {
        debug!("ignoring select on {}: disabled or not selectable", id);
        return Ok(SelectionChange::default());
    }

    let change = match mode {
        SelectionMode::Single => {
            let removed: Vec<_> = selected.iter().filter(|&s| s != id).cloned().collect();
            let was_selected = selected.contains(id);
            selected.clear();
            selected.insert(id.to_string());
            SelectionChange {
                added: if was_selected { vec![] } else { vec![id.to_string()] },
                removed,
            }
        }
        SelectionMode::Multiple => {
            if selected.remove(id) {
                SelectionChange {
                    added: vec![],
                    removed: vec![id.to_string()],
                }
            } else {
                selected.insert(id.to_string());
                SelectionChange {
                    added: vec![id.to_string()],
                    removed: vec![],
                }
            }
        }
    };
    Ok(change)
}

/// Clear the selection, returning the ids that were deselected.
pub fn clear(selected: &mut HashSet<String>) -> SelectionChange {
    let mut removed: Vec<_> = selected.drain().collect();
    removed.sort();
    SelectionChange {
        added: vec![],
        removed,
    }
}
