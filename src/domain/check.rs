//! Tri-state check half of the Selection/Check Coordinator.
//!
//! Only the checked set is stored. A node that has children is checked iff
//! all of its children are checked; indeterminate is derived on read as
//! "not checked, but some descendant is".

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{instrument, trace};

use crate::domain::arena::NodeStore;
use crate::domain::error::{DomainError, DomainResult};

/// Displayed checkbox state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Checked,
    Indeterminate,
}

/// Ids whose checked membership flipped in one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckChange {
    pub checked: Vec<String>,
    pub unchecked: Vec<String>,
}

impl CheckChange {
    pub fn is_empty(&self) -> bool {
        self.checked.is_empty() && self.unchecked.is_empty()
    }

    fn record(&mut self, id: &str, value: bool) {
        if value {
            self.checked.push(id.to_string());
        } else {
            self.unchecked.push(id.to_string());
        }
    }
}

fn apply(checked: &mut HashSet<String>, id: &str, value: bool) -> bool {
    if value {
        checked.insert(id.to_string())
    } else {
        checked.remove(id)
    }
}

/// Check or uncheck `id`: force its whole subtree to `value`, then
/// recompute every ancestor bottom-up to the root.
#[instrument(level = "debug", skip(store, checked))]
pub fn set_checked(
    store: &NodeStore,
    checked: &mut HashSet<String>,
    id: &str,
    value: bool,
) -> DomainResult<CheckChange> {
    let node = store.find_by_id(id)?;
    if node.data.disabled {
        return Err(DomainError::DisabledNode(id.to_string()));
    }
    let idx = store
        .index_of(id)
        .ok_or_else(|| DomainError::NotFound(id.to_string()))?;

    let mut change = CheckChange::default();
    for i in store.subtree_indices(idx) {
        if let Some(n) = store.get_node(i) {
            if apply(checked, &n.data.id, value) {
                change.record(&n.data.id, value);
            }
        }
    }

    recompute_ancestors(store, checked, node.parent, &mut change);
    trace!(
        "check {}: +{} -{}",
        id,
        change.checked.len(),
        change.unchecked.len()
    );
    Ok(change)
}

fn recompute_ancestors(
    store: &NodeStore,
    checked: &mut HashSet<String>,
    mut current: Option<Index>,
    change: &mut CheckChange,
) {
    while let Some(p) = current {
        let Some(parent) = store.get_node(p) else {
            break;
        };
        let all_checked = !parent.children.is_empty()
            && parent.children.iter().all(|&c| {
                store
                    .get_node(c)
                    .is_some_and(|child| checked.contains(&child.data.id))
            });
        // An unchanged level may still sit under a stale ancestor left by
        // revoke_ancestors, so keep walking.
        if apply(checked, &parent.data.id, all_checked) {
            change.record(&parent.data.id, all_checked);
        }
        current = parent.parent;
    }
}

/// Drop the checked membership of `start` and all its ancestors.
///
/// Applied after structural edits: a parent's full-check status belongs to
/// the children it had when it was checked, so adding, removing or moving
/// children below it revokes that status. Nothing is promoted here.
pub fn revoke_ancestors(
    store: &NodeStore,
    checked: &mut HashSet<String>,
    start: Option<Index>,
) -> CheckChange {
    let mut change = CheckChange::default();
    let mut current = start;
    while let Some(idx) = current {
        let Some(node) = store.get_node(idx) else {
            break;
        };
        if checked.remove(&node.data.id) {
            change.record(&node.data.id, false);
        }
        current = node.parent;
    }
    change
}

/// Check every descendant of `id` if `id` itself is checked. Used when a
/// checked lazy node receives its children.
pub fn inherit_from(store: &NodeStore, checked: &mut HashSet<String>, id: &str) -> CheckChange {
    let mut change = CheckChange::default();
    if !checked.contains(id) {
        return change;
    }
    if let Ok(descendants) = store.descendant_ids(id) {
        for d in descendants {
            if apply(checked, &d, true) {
                change.record(&d, true);
            }
        }
    }
    change
}

/// Whether any node strictly below `id` is checked.
pub fn has_checked_descendant(
    store: &NodeStore,
    checked: &HashSet<String>,
    id: &str,
) -> DomainResult<bool> {
    Ok(store
        .descendant_ids(id)?
        .iter()
        .any(|d| checked.contains(d)))
}

pub fn is_indeterminate(store: &NodeStore, checked: &HashSet<String>, id: &str) -> DomainResult<bool> {
    Ok(!checked.contains(id) && has_checked_descendant(store, checked, id)?)
}

pub fn check_state(store: &NodeStore, checked: &HashSet<String>, id: &str) -> DomainResult<CheckState> {
    if checked.contains(id) {
        Ok(CheckState::Checked)
    } else if has_checked_descendant(store, checked, id)? {
        Ok(CheckState::Indeterminate)
    } else {
        Ok(CheckState::Unchecked)
    }
}

/// All indeterminate ids, derived in a single post-order pass.
pub fn indeterminate_ids(store: &NodeStore, checked: &HashSet<String>) -> HashSet<String> {
    let mut has_checked_below: HashMap<Index, bool> = HashMap::new();
    let mut out = HashSet::new();
    for (idx, node) in store.iter_postorder() {
        let below = node.children.iter().any(|&c| {
            has_checked_below.get(&c).copied().unwrap_or(false)
                || store
                    .get_node(c)
                    .is_some_and(|child| checked.contains(&child.data.id))
        });
        has_checked_below.insert(idx, below);
        if below && !checked.contains(&node.data.id) {
            out.insert(node.data.id.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::NodeSpec;

    fn store() -> NodeStore {
        NodeStore::from_specs(vec![NodeSpec::new("root", "Root").with_children(vec![
            NodeSpec::new("a", "A")
                .with_children(vec![NodeSpec::new("a1", "A1"), NodeSpec::new("a2", "A2")]),
            NodeSpec::new("b", "B"),
            NodeSpec::new("off", "Off").disabled(),
        ])])
        .unwrap()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_one_of_two_siblings_when_checked_then_parent_indeterminate() {
        let store = store();
        let mut checked = HashSet::new();
        set_checked(&store, &mut checked, "a1", true).unwrap();
        assert_eq!(checked, set(&["a1"]));
        assert!(is_indeterminate(&store, &checked, "a").unwrap());
        assert!(is_indeterminate(&store, &checked, "root").unwrap());
        assert_eq!(check_state(&store, &checked, "a2").unwrap(), CheckState::Unchecked);
    }

    #[test]
    fn given_all_siblings_checked_then_parent_checked() {
        let store = store();
        let mut checked = HashSet::new();
        set_checked(&store, &mut checked, "a1", true).unwrap();
        let change = set_checked(&store, &mut checked, "a2", true).unwrap();
        assert_eq!(change.checked, vec!["a2", "a"]);
        assert_eq!(checked, set(&["a1", "a2", "a"]));
        assert_eq!(check_state(&store, &checked, "a").unwrap(), CheckState::Checked);
    }

    #[test]
    fn given_checked_parent_when_unchecking_child_then_parent_drops_out() {
        let store = store();
        let mut checked = HashSet::new();
        set_checked(&store, &mut checked, "a", true).unwrap();
        set_checked(&store, &mut checked, "a2", false).unwrap();
        assert_eq!(checked, set(&["a1"]));
        assert!(is_indeterminate(&store, &checked, "a").unwrap());
    }

    #[test]
    fn given_root_when_checked_then_cascades_to_disabled_descendants_too() {
        let store = store();
        let mut checked = HashSet::new();
        set_checked(&store, &mut checked, "root", true).unwrap();
        assert_eq!(checked.len(), store.len());
        assert!(indeterminate_ids(&store, &checked).is_empty());
    }

    #[test]
    fn given_disabled_node_when_checked_then_error() {
        let mut checked = HashSet::new();
        let err = set_checked(&store(), &mut checked, "off", true).unwrap_err();
        assert_eq!(err, DomainError::DisabledNode("off".into()));
        assert!(checked.is_empty());
    }

    #[test]
    fn given_partial_checks_when_deriving_indeterminate_set_then_matches_per_node() {
        let store = store();
        let mut checked = HashSet::new();
        set_checked(&store, &mut checked, "a1", true).unwrap();
        assert_eq!(indeterminate_ids(&store, &checked), set(&["a", "root"]));
    }

    #[test]
    fn given_revoked_grandparent_when_unchanged_parent_rechecked_then_grandparent_restored() {
        let store = store();
        let mut checked = set(&["a", "a1", "a2", "b", "off"]);

        let change = set_checked(&store, &mut checked, "a1", true).unwrap();

        assert_eq!(change.checked, vec!["root"]);
        assert_eq!(checked, set(&["root", "a", "a1", "a2", "b", "off"]));
        assert!(indeterminate_ids(&store, &checked).is_empty());
    }
}
