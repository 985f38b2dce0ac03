//! Node Store: the canonical, arena-backed tree.
//!
//! Nodes live in a generational arena and refer to each other by `Index`.
//! Every other component refers to nodes by their string id only; the
//! `Index` values never leave a single synchronous call.

use std::collections::{HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::{instrument, trace};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{NodeData, NodeSpec};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for root-level nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in display order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.data.id
    }

    /// True when the node renders without an expander.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.data.awaits_children()
    }
}

/// Ids of a subtree that was taken out of the store, pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovedSubtree {
    pub ids: Vec<String>,
}

impl RemovedSubtree {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Arena-based forest owning every node of the tree view.
#[derive(Debug, Default)]
pub struct NodeStore {
    arena: Arena<TreeNode>,
    /// Root-level nodes in display order
    roots: Vec<Index>,
    ids: HashMap<String, Index>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from root-level specs, rejecting duplicate ids.
    pub fn from_specs(specs: Vec<NodeSpec>) -> DomainResult<Self> {
        let mut store = Self::new();
        store.check_new_ids(specs.iter(), &HashSet::new())?;
        for spec in specs {
            let idx = store.insert_spec(spec, None);
            store.roots.push(idx);
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    fn require(&self, id: &str) -> DomainResult<Index> {
        self.index_of(id)
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find_by_id(&self, id: &str) -> DomainResult<&TreeNode> {
        let idx = self.require(id)?;
        self.arena
            .get(idx)
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    pub(crate) fn find_by_id_mut(&mut self, id: &str) -> DomainResult<&mut TreeNode> {
        let idx = self.require(id)?;
        self.arena
            .get_mut(idx)
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    /// Parent of `id`, `None` for root-level nodes.
    #[instrument(level = "trace", skip(self))]
    pub fn find_parent(&self, id: &str) -> DomainResult<Option<&TreeNode>> {
        let node = self.find_by_id(id)?;
        Ok(node.parent.and_then(|p| self.arena.get(p)))
    }

    /// Ancestor ids of `id`, nearest first. Empty for root-level nodes.
    #[instrument(level = "trace", skip(self))]
    pub fn path_to_root(&self, id: &str) -> DomainResult<Vec<String>> {
        let mut path = Vec::new();
        let mut current = self.find_by_id(id)?.parent;
        while let Some(idx) = current {
            let Some(node) = self.arena.get(idx) else {
                break;
            };
            path.push(node.data.id.clone());
            current = node.parent;
        }
        Ok(path)
    }

    /// Ids of the direct children of `id`, in order.
    pub fn child_ids(&self, id: &str) -> DomainResult<Vec<&str>> {
        let node = self.find_by_id(id)?;
        Ok(node
            .children
            .iter()
            .filter_map(|&c| self.arena.get(c))
            .map(TreeNode::id)
            .collect())
    }

    /// Ids of every node below `id` (not including `id`), pre-order.
    pub fn descendant_ids(&self, id: &str) -> DomainResult<Vec<String>> {
        let idx = self.require(id)?;
        let mut ids: Vec<String> = self
            .subtree_indices(idx)
            .into_iter()
            .filter_map(|i| self.arena.get(i))
            .map(|n| n.data.id.clone())
            .collect();
        ids.remove(0);
        Ok(ids)
    }

    /// Insert `spec` (with its subtree) under `parent_id` at `index`
    /// (default and overflow: end of the sibling list).
    #[instrument(level = "trace", skip(self, spec), fields(id = %spec.id))]
    pub fn insert_child(
        &mut self,
        parent_id: &str,
        spec: NodeSpec,
        index: Option<usize>,
    ) -> DomainResult<Index> {
        let parent = self.require(parent_id)?;
        self.check_new_ids(std::iter::once(&spec), &HashSet::new())?;
        let idx = self.insert_spec(spec, Some(parent));
        self.attach(idx, Some(parent), index);
        Ok(idx)
    }

    /// Insert `spec` (with its subtree) as a root-level node.
    #[instrument(level = "trace", skip(self, spec), fields(id = %spec.id))]
    pub fn insert_root(&mut self, spec: NodeSpec, index: Option<usize>) -> DomainResult<Index> {
        self.check_new_ids(std::iter::once(&spec), &HashSet::new())?;
        let idx = self.insert_spec(spec, None);
        self.attach(idx, None, index);
        Ok(idx)
    }

    /// Remove `id` and its entire subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: &str) -> DomainResult<RemovedSubtree> {
        let idx = self.require(id)?;
        self.detach(idx);
        let removed = self.drop_subtree(idx);
        trace!("removed {} nodes under {}", removed.len(), id);
        Ok(removed)
    }

    /// Swap the children of `id` for `children`. Ids of the replaced
    /// subtrees may be reused by the new children.
    #[instrument(level = "trace", skip(self, children))]
    pub fn replace_children(
        &mut self,
        id: &str,
        children: Vec<NodeSpec>,
    ) -> DomainResult<RemovedSubtree> {
        let idx = self.require(id)?;
        let old_children = self.find_by_id(id)?.children.clone();

        let reusable: HashSet<String> = old_children
            .iter()
            .flat_map(|&c| self.subtree_indices(c))
            .filter_map(|i| self.arena.get(i))
            .map(|n| n.data.id.clone())
            .collect();
        self.check_new_ids(children.iter(), &reusable)?;

        let mut removed = RemovedSubtree::default();
        for child in old_children {
            self.detach(child);
            removed.ids.extend(self.drop_subtree(child).ids);
        }
        for spec in children {
            let child = self.insert_spec(spec, Some(idx));
            self.attach(child, Some(idx), None);
        }
        Ok(removed)
    }

    /// Move the subtree at `idx` under `new_parent` (None: root level).
    /// The caller has ruled out cycles.
    pub(crate) fn relocate(&mut self, idx: Index, new_parent: Option<Index>, index: Option<usize>) {
        self.detach(idx);
        self.attach(idx, new_parent, index);
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Indices of the subtree rooted at `idx`, pre-order, `idx` first.
    pub(crate) fn subtree_indices(&self, idx: Index) -> Vec<Index> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.get(current) {
                out.push(current);
                for &child in node.children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Rejects ids already in the store (unless in `reusable`) or repeated
    /// within the new specs.
    fn check_new_ids<'a>(
        &self,
        specs: impl Iterator<Item = &'a NodeSpec>,
        reusable: &HashSet<String>,
    ) -> DomainResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for spec in specs {
            for id in spec.ids() {
                let taken = self.ids.contains_key(id) && !reusable.contains(id);
                if taken || !seen.insert(id) {
                    return Err(DomainError::DuplicateId(id.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Allocate `spec` and its subtree; the returned node is not yet linked
    /// into its parent's child list.
    fn insert_spec(&mut self, spec: NodeSpec, parent: Option<Index>) -> Index {
        let (data, children) = spec.into_parts();
        let id = data.id.clone();
        let idx = self.arena.insert(TreeNode {
            data,
            parent,
            children: Vec::with_capacity(children.len()),
        });
        self.ids.insert(id, idx);

        for child in children {
            let child_idx = self.insert_spec(child, Some(idx));
            if let Some(node) = self.arena.get_mut(idx) {
                node.children.push(child_idx);
            }
        }
        idx
    }

    fn attach(&mut self, idx: Index, parent: Option<Index>, index: Option<usize>) {
        let siblings = match parent {
            Some(p) => match self.arena.get_mut(p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let position = index.map_or(siblings.len(), |i| i.min(siblings.len()));
        siblings.insert(position, idx);

        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = parent;
        }
    }

    fn detach(&mut self, idx: Index) {
        let parent = self.arena.get(idx).and_then(|n| n.parent);
        let siblings = match parent {
            Some(p) => match self.arena.get_mut(p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        siblings.retain(|&c| c != idx);
    }

    fn drop_subtree(&mut self, idx: Index) -> RemovedSubtree {
        let indices = self.subtree_indices(idx);
        let mut removed = RemovedSubtree::default();
        for i in indices {
            if let Some(node) = self.arena.remove(i) {
                self.ids.remove(&node.data.id);
                removed.ids.push(node.data.id);
            }
        }
        removed
    }
}

/// Pre-order traversal over the whole forest.
pub struct TreeIterator<'a> {
    store: &'a NodeStore,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(store: &'a NodeStore) -> Self {
        let stack = store.roots.iter().rev().copied().collect();
        Self { store, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.store.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Post-order traversal over the whole forest (children before parents).
pub struct PostOrderIterator<'a> {
    store: &'a NodeStore,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(store: &'a NodeStore) -> Self {
        let stack = store.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { store, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.store.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NodeStore {
        NodeStore::from_specs(vec![
            NodeSpec::new("root", "Root").with_children(vec![
                NodeSpec::new("a", "A")
                    .with_children(vec![NodeSpec::new("a1", "A1"), NodeSpec::new("a2", "A2")]),
                NodeSpec::new("b", "B"),
            ]),
        ])
        .unwrap()
    }

    fn preorder(store: &NodeStore) -> Vec<String> {
        store.iter().map(|(_, n)| n.data.id.clone()).collect()
    }

    #[test]
    fn given_specs_when_building_then_preserves_child_order() {
        let store = sample();
        assert_eq!(preorder(&store), vec!["root", "a", "a1", "a2", "b"]);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn given_duplicate_ids_when_building_then_fails() {
        let result = NodeStore::from_specs(vec![
            NodeSpec::new("x", "X"),
            NodeSpec::new("y", "Y").with_children(vec![NodeSpec::new("x", "again")]),
        ]);
        assert_eq!(result.unwrap_err(), DomainError::DuplicateId("x".into()));
    }

    #[test]
    fn given_nested_node_when_path_to_root_then_nearest_first() {
        let store = sample();
        assert_eq!(store.path_to_root("a2").unwrap(), vec!["a", "root"]);
        assert!(store.path_to_root("root").unwrap().is_empty());
        assert_eq!(
            store.path_to_root("zzz").unwrap_err(),
            DomainError::NotFound("zzz".into())
        );
    }

    #[test]
    fn given_root_node_when_find_parent_then_none() {
        let store = sample();
        assert!(store.find_parent("root").unwrap().is_none());
        assert_eq!(store.find_parent("a1").unwrap().unwrap().id(), "a");
    }

    #[test]
    fn given_index_when_insert_child_then_placed_among_siblings() {
        let mut store = sample();
        store.insert_child("a", NodeSpec::new("a0", "A0"), Some(0)).unwrap();
        store.insert_child("a", NodeSpec::new("a9", "A9"), Some(99)).unwrap();
        assert_eq!(store.child_ids("a").unwrap(), vec!["a0", "a1", "a2", "a9"]);
    }

    #[test]
    fn given_existing_id_when_insert_child_then_duplicate_and_unchanged() {
        let mut store = sample();
        let err = store.insert_child("b", NodeSpec::new("a1", "dup"), None).unwrap_err();
        assert_eq!(err, DomainError::DuplicateId("a1".into()));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn given_subtree_when_remove_then_returns_all_ids() {
        let mut store = sample();
        let removed = store.remove("a").unwrap();
        assert_eq!(removed.ids, vec!["a", "a1", "a2"]);
        assert_eq!(removed.len(), 3);
        assert_eq!(preorder(&store), vec!["root", "b"]);
        assert!(!store.contains("a1"));
    }

    #[test]
    fn given_old_ids_when_replace_children_then_ids_may_be_reused() {
        let mut store = sample();
        let removed = store
            .replace_children("a", vec![NodeSpec::new("a1", "fresh"), NodeSpec::new("a3", "A3")])
            .unwrap();
        assert_eq!(removed.ids, vec!["a1", "a2"]);
        assert_eq!(store.child_ids("a").unwrap(), vec!["a1", "a3"]);
        assert_eq!(store.find_by_id("a1").unwrap().data.label, "fresh");
    }

    #[test]
    fn given_tree_when_postorder_then_children_before_parents() {
        let store = sample();
        let ids: Vec<_> = store.iter_postorder().map(|(_, n)| n.data.id.clone()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a", "b", "root"]);
    }
}
