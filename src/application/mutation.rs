//! Mutation Gateway: structural edits that keep the derived views consistent.
//!
//! Every function validates before touching anything, so an `Err` leaves the
//! store, the view state and the pending loads exactly as they were.

use tracing::{debug, instrument};

use crate::application::lazy::{LoadTicket, PendingLoads};
use crate::domain::check;
use crate::domain::{DomainError, DomainResult, NodeSpec, NodeStore, RemovedSubtree, TreeState};

/// Outcome of delivering lazily fetched children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResolution {
    Loaded { node_id: String, children: usize },
    /// The ticket was unknown: cancelled by a removal or already resolved
    Discarded,
}

/// Insert `spec` under `parent_id`. The parent is not expanded.
#[instrument(level = "debug", skip(store, state, spec), fields(id = %spec.id))]
pub fn add_node(
    store: &mut NodeStore,
    state: &mut TreeState,
    parent_id: &str,
    spec: NodeSpec,
    index: Option<usize>,
) -> DomainResult<()> {
    let inserted = store.insert_child(parent_id, spec, index)?;
    let parent = store.get_node(inserted).and_then(|n| n.parent);
    check::revoke_ancestors(store, &mut state.checked, parent);
    Ok(())
}

/// Insert `spec` as a root-level node.
pub fn add_root(store: &mut NodeStore, spec: NodeSpec, index: Option<usize>) -> DomainResult<()> {
    store.insert_root(spec, index)?;
    Ok(())
}

/// Remove `id` with its subtree and forget every reference to the removed ids.
#[instrument(level = "debug", skip(store, state, pending))]
pub fn remove_node(
    store: &mut NodeStore,
    state: &mut TreeState,
    pending: &mut PendingLoads,
    id: &str,
) -> DomainResult<RemovedSubtree> {
    let parent = store.find_by_id(id)?.parent;
    let removed = store.remove(id)?;

    state.purge(&removed.ids);
    let cancelled = pending.cancel(&removed.ids);
    if cancelled > 0 {
        debug!("cancelled {} pending loads under {}", cancelled, id);
    }
    check::revoke_ancestors(store, &mut state.checked, parent);
    Ok(removed)
}

/// Move `dragged_id` with its subtree to position `index` among the children
/// of `new_parent_id`. Memberships inside the subtree are kept.
#[instrument(level = "debug", skip(store, state))]
pub fn reparent(
    store: &mut NodeStore,
    state: &mut TreeState,
    dragged_id: &str,
    new_parent_id: &str,
    index: Option<usize>,
) -> DomainResult<()> {
    let dragged = store
        .index_of(dragged_id)
        .ok_or_else(|| DomainError::NotFound(dragged_id.to_string()))?;
    let target = store
        .index_of(new_parent_id)
        .ok_or_else(|| DomainError::NotFound(new_parent_id.to_string()))?;

    if dragged_id == new_parent_id
        || store
            .path_to_root(new_parent_id)?
            .iter()
            .any(|ancestor| ancestor == dragged_id)
    {
        return Err(DomainError::Cycle {
            dragged: dragged_id.to_string(),
            target: new_parent_id.to_string(),
        });
    }

    let old_parent = store.find_by_id(dragged_id)?.parent;
    store.relocate(dragged, Some(target), index);

    // A reorder among siblings leaves every child set as it was.
    if old_parent != Some(target) {
        check::revoke_ancestors(store, &mut state.checked, old_parent);
        check::revoke_ancestors(store, &mut state.checked, Some(target));
    }
    Ok(())
}

/// Expand every ancestor of `id`. Returns the ids that were newly expanded,
/// nearest first.
#[instrument(level = "debug", skip(store, state))]
pub fn expand_to_node(store: &NodeStore, state: &mut TreeState, id: &str) -> DomainResult<Vec<String>> {
    let path = store.path_to_root(id)?;
    Ok(path
        .into_iter()
        .filter(|ancestor| state.expanded.insert(ancestor.clone()))
        .collect())
}

/// Deliver fetched children for `ticket`.
///
/// Stale tickets are a no-op. On `DuplicateId` the request stays pending so
/// the caller can still report it as failed.
#[instrument(level = "debug", skip(store, state, pending, children))]
pub fn complete_load(
    store: &mut NodeStore,
    state: &mut TreeState,
    pending: &mut PendingLoads,
    ticket: LoadTicket,
    children: Vec<NodeSpec>,
) -> DomainResult<LoadResolution> {
    let Some(node_id) = pending.node_for(ticket).map(str::to_string) else {
        debug!("discarding stale load {}", ticket);
        return Ok(LoadResolution::Discarded);
    };
    if !store.contains(&node_id) {
        pending.finish(ticket);
        return Ok(LoadResolution::Discarded);
    }

    let count = children.len();
    let replaced = store.replace_children(&node_id, children)?;
    state.purge(&replaced.ids);
    pending.finish(ticket);

    let node = store.find_by_id_mut(&node_id)?;
    node.data.lazy = false;
    node.data.has_children = count > 0;

    check::inherit_from(store, &mut state.checked, &node_id);
    Ok(LoadResolution::Loaded {
        node_id,
        children: count,
    })
}

/// Give up on `ticket`: the node keeps `lazy = true`, is collapsed and will
/// issue a fresh request on its next expand. Returns the node id if the
/// ticket was outstanding.
pub fn fail_load(state: &mut TreeState, pending: &mut PendingLoads, ticket: LoadTicket) -> Option<String> {
    let node_id = pending.finish(ticket)?;
    state.expanded.remove(&node_id);
    Some(node_id)
}
