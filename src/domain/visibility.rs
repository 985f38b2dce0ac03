//! Visibility Resolver: flattens the tree into the rows that should render.
//!
//! The result is recomputed in full from the store, the expansion set and the
//! search term on every call. Search forces the ancestors of matching nodes
//! open without touching the expansion set, so clearing the search restores
//! the previous rows exactly.

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{instrument, trace};

use crate::domain::arena::NodeStore;

/// Case-insensitive substring filter over node labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    needle: String,
}

impl SearchFilter {
    /// `None` for an empty term: no filtering.
    pub fn new(term: &str) -> Option<Self> {
        if term.is_empty() {
            None
        } else {
            Some(Self {
                needle: term.to_lowercase(),
            })
        }
    }

    pub fn is_match(&self, label: &str) -> bool {
        label.to_lowercase().contains(&self.needle)
    }
}

/// One flattened row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleNode {
    pub id: String,
    /// Structural depth, 0 for root-level nodes
    pub depth: usize,
    /// Label matches the active search term (false without a search)
    pub is_search_match: bool,
    /// Children are shown below this row
    pub is_expanded: bool,
    /// Children are shown only because a search forces the path open
    pub forced_open: bool,
}

/// Flatten `store` into visible rows, pre-order.
#[instrument(level = "debug", skip(store, expanded))]
pub fn resolve(store: &NodeStore, expanded: &HashSet<String>, search_term: &str) -> Vec<VisibleNode> {
    let filter = SearchFilter::new(search_term);
    let matched = filter
        .as_ref()
        .map(|f| search_matches(store, f))
        .unwrap_or_default();

    let mut rows = Vec::new();
    let mut stack: Vec<(Index, usize)> = store.roots().iter().rev().map(|&r| (r, 0)).collect();

    while let Some((idx, depth)) = stack.pop() {
        let Some(node) = store.get_node(idx) else {
            continue;
        };

        // Which children get walked: every child when expanded without a
        // search, only the search-matched ones while filtering.
        let walk: Vec<Index> = match filter {
            Some(_) => {
                if !matched.contains(&idx) {
                    continue;
                }
                node.children
                    .iter()
                    .copied()
                    .filter(|c| matched.contains(c))
                    .collect()
            }
            None if expanded.contains(&node.data.id) => node.children.clone(),
            None => Vec::new(),
        };

        let user_expanded = expanded.contains(&node.data.id);
        let is_expanded = !node.is_leaf()
            && match filter {
                Some(_) => !walk.is_empty(),
                None => user_expanded,
            };

        rows.push(VisibleNode {
            id: node.data.id.clone(),
            depth,
            is_search_match: filter.as_ref().is_some_and(|f| f.is_match(&node.data.label)),
            is_expanded,
            forced_open: filter.is_some() && !walk.is_empty() && !user_expanded,
        });

        for &child in walk.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    trace!("resolved {} visible rows", rows.len());
    rows
}

/// Nodes whose label matches or that have a matching descendant,
/// computed bottom-up in one pass.
fn search_matches(store: &NodeStore, filter: &SearchFilter) -> HashSet<Index> {
    let mut matched = HashSet::new();
    for (idx, node) in store.iter_postorder() {
        if filter.is_match(&node.data.label) || node.children.iter().any(|c| matched.contains(c)) {
            matched.insert(idx);
        }
    }
    matched
}
