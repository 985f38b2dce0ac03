//! Engine Facade: the only object a renderer talks to.
//!
//! Intents come in as method calls; each call fully updates the store and
//! the view state before returning and then emits its events. Rows are
//! recomputed from scratch on every `visible_rows` call.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::events::{EventBus, ListenerId, TreeEvent, TreeEventKind};
use crate::application::lazy::{LoadRequest, LoadTicket, PendingLoads};
use crate::application::mutation::{self, LoadResolution};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{IconSettings, Settings};
use crate::domain::check::{self, CheckChange, CheckState};
use crate::domain::selection::{self, SelectionChange, SelectionMode};
use crate::domain::visibility;
use crate::domain::{NodeData, NodeSpec, NodeStore, RemovedSubtree, TreeState, TreeStateSnapshot};
use crate::infrastructure::traits::ChildLoader;

/// Engine behaviour knobs, usually derived from `Settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub selection_mode: SelectionMode,
    pub icons: IconSettings,
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            selection_mode: settings.selection_mode,
            icons: settings.icons.clone(),
        }
    }
}

/// Everything a renderer needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleRow {
    pub id: String,
    pub label: String,
    pub depth: usize,
    pub icon: Option<String>,
    pub is_expanded: bool,
    pub is_leaf: bool,
    pub is_selected: bool,
    pub is_checked: bool,
    pub is_indeterminate: bool,
    pub is_search_match: bool,
    pub is_loading: bool,
    pub is_disabled: bool,
}

/// Result of an expand or collapse intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    Expanded,
    Collapsed,
    /// A lazy node needs its children; fetch them and call `complete_load`
    LoadRequested(LoadRequest),
    /// A fetch for this node is already in flight
    Loading,
    /// Already in the requested state, or a leaf
    Unchanged,
}

#[derive(Debug)]
pub struct TreeEngine {
    store: NodeStore,
    state: TreeState,
    pending: PendingLoads,
    options: EngineOptions,
    events: EventBus,
}

impl TreeEngine {
    /// Build an engine over `roots` with empty view state.
    pub fn new(roots: Vec<NodeSpec>, options: EngineOptions) -> ApplicationResult<Self> {
        let store = NodeStore::from_specs(roots)?;
        debug!("engine created with {} nodes", store.len());
        Ok(Self {
            store,
            state: TreeState::new(),
            pending: PendingLoads::new(),
            options,
            events: EventBus::new(),
        })
    }

    pub fn with_settings(roots: Vec<NodeSpec>, settings: &Settings) -> ApplicationResult<Self> {
        Self::new(roots, EngineOptions::from(settings))
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: impl FnMut(&TreeEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        self.events.drain()
    }

    fn emit(&mut self, kind: TreeEventKind, node_id: Option<&str>) {
        let event = TreeEvent {
            kind,
            node_id: node_id.map(str::to_string),
            state: self.state.snapshot(),
        };
        self.events.emit(event);
    }

    // ------------------------------------------------------------------
    // Expansion
    // ------------------------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    pub fn toggle_expand(&mut self, id: &str) -> ApplicationResult<ExpandOutcome> {
        if self.state.expanded.contains(id) {
            self.collapse(id)
        } else {
            self.expand(id)
        }
    }

    /// Expand `id`. An unloaded lazy node issues at most one load request
    /// at a time; repeated attempts while it is pending are coalesced.
    #[instrument(level = "debug", skip(self))]
    pub fn expand(&mut self, id: &str) -> ApplicationResult<ExpandOutcome> {
        let node = self.store.find_by_id(id)?;
        if node.is_leaf() {
            return Ok(ExpandOutcome::Unchanged);
        }
        let awaits_children = node.data.awaits_children() && node.children.is_empty();

        let newly = self.state.expanded.insert(id.to_string());
        if newly {
            self.emit(TreeEventKind::NodeExpand, Some(id));
        }

        if awaits_children {
            return Ok(match self.pending.begin(id) {
                Some(request) => {
                    debug!("requesting children for {} ({})", id, request.ticket);
                    ExpandOutcome::LoadRequested(request)
                }
                None => ExpandOutcome::Loading,
            });
        }
        Ok(if newly {
            ExpandOutcome::Expanded
        } else {
            ExpandOutcome::Unchanged
        })
    }

    #[instrument(level = "debug", skip(self))]
    pub fn collapse(&mut self, id: &str) -> ApplicationResult<ExpandOutcome> {
        self.store.find_by_id(id)?;
        if self.state.expanded.remove(id) {
            self.emit(TreeEventKind::NodeCollapse, Some(id));
            Ok(ExpandOutcome::Collapsed)
        } else {
            Ok(ExpandOutcome::Unchanged)
        }
    }

    /// Expand every node with loaded children. Lazy nodes are left alone.
    pub fn expand_all(&mut self) -> Vec<String> {
        let targets: Vec<String> = self
            .store
            .iter()
            .filter(|(_, node)| !node.children.is_empty())
            .map(|(_, node)| node.data.id.clone())
            .filter(|id| !self.state.expanded.contains(id))
            .collect();
        for id in &targets {
            self.state.expanded.insert(id.clone());
            self.emit(TreeEventKind::NodeExpand, Some(id.as_str()));
        }
        targets
    }

    pub fn collapse_all(&mut self) -> Vec<String> {
        let mut collapsed: Vec<String> = self.state.expanded.drain().collect();
        collapsed.sort();
        for id in &collapsed {
            self.emit(TreeEventKind::NodeCollapse, Some(id.as_str()));
        }
        collapsed
    }

    /// Expand all ancestors of `id` so that it becomes visible.
    #[instrument(level = "debug", skip(self))]
    pub fn expand_to_node(&mut self, id: &str) -> ApplicationResult<Vec<String>> {
        let added = mutation::expand_to_node(&self.store, &mut self.state, id)?;
        for ancestor in &added {
            self.emit(TreeEventKind::NodeExpand, Some(ancestor.as_str()));
        }
        Ok(added)
    }

    // ------------------------------------------------------------------
    // Selection and checks
    // ------------------------------------------------------------------

    /// Select per the configured mode. Disabled and non-selectable nodes
    /// are a silent no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn select(&mut self, id: &str) -> ApplicationResult<SelectionChange> {
        let change = selection::select(
            &self.store,
            &mut self.state.selected,
            self.options.selection_mode,
            id,
        )?;
        if !change.is_empty() {
            self.emit(TreeEventKind::NodeSelect, Some(id));
        }
        Ok(change)
    }

    pub fn clear_selection(&mut self) -> SelectionChange {
        let change = selection::clear(&mut self.state.selected);
        for id in &change.removed {
            self.emit(TreeEventKind::NodeSelect, Some(id.as_str()));
        }
        change
    }

    #[instrument(level = "debug", skip(self))]
    pub fn set_checked(&mut self, id: &str, checked: bool) -> ApplicationResult<CheckChange> {
        let change = check::set_checked(&self.store, &mut self.state.checked, id, checked)?;
        if !change.is_empty() {
            self.emit(TreeEventKind::NodeCheck, Some(id));
        }
        Ok(change)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Filter rows by `term`; the empty string clears the filter.
    /// The expansion set is never touched.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&mut self, term: &str) {
        if self.state.search_term == term {
            return;
        }
        self.state.search_term = term.to_string();
        self.emit(TreeEventKind::Search, None);
    }

    pub fn clear_search(&mut self) {
        self.search("");
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    #[instrument(level = "debug", skip(self, node), fields(id = %node.id))]
    pub fn add_node(
        &mut self,
        parent_id: &str,
        node: NodeSpec,
        index: Option<usize>,
    ) -> ApplicationResult<()> {
        let id = node.id.clone();
        mutation::add_node(&mut self.store, &mut self.state, parent_id, node, index)?;
        self.emit(TreeEventKind::NodeAdd, Some(id.as_str()));
        Ok(())
    }

    pub fn add_root(&mut self, node: NodeSpec, index: Option<usize>) -> ApplicationResult<()> {
        let id = node.id.clone();
        mutation::add_root(&mut self.store, node, index)?;
        self.emit(TreeEventKind::NodeAdd, Some(id.as_str()));
        Ok(())
    }

    /// Remove `id` and its subtree, dropping every expand/select/check
    /// membership and cancelling pending loads inside it.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_node(&mut self, id: &str) -> ApplicationResult<RemovedSubtree> {
        let removed = mutation::remove_node(&mut self.store, &mut self.state, &mut self.pending, id)?;
        self.emit(TreeEventKind::NodeRemove, Some(id));
        Ok(removed)
    }

    /// Drag-and-drop: move `dragged_id` under `new_parent_id` at `index`.
    #[instrument(level = "debug", skip(self))]
    pub fn reparent(
        &mut self,
        dragged_id: &str,
        new_parent_id: &str,
        index: Option<usize>,
    ) -> ApplicationResult<()> {
        mutation::reparent(&mut self.store, &mut self.state, dragged_id, new_parent_id, index)?;
        self.emit(TreeEventKind::NodeDrop, Some(dragged_id));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lazy loading
    // ------------------------------------------------------------------

    pub fn is_loading(&self, id: &str) -> bool {
        self.pending.is_pending(id)
    }

    /// Deliver children for an outstanding request. Unknown tickets are
    /// discarded without error.
    #[instrument(level = "debug", skip(self, children))]
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        children: Vec<NodeSpec>,
    ) -> ApplicationResult<LoadResolution> {
        let resolution = mutation::complete_load(
            &mut self.store,
            &mut self.state,
            &mut self.pending,
            ticket,
            children,
        )?;
        if let LoadResolution::Loaded { node_id, .. } = &resolution {
            let node_id = node_id.clone();
            self.emit(TreeEventKind::NodeLoad, Some(node_id.as_str()));
        }
        Ok(resolution)
    }

    /// Report a failed fetch; the node stays lazy and collapses.
    #[instrument(level = "debug", skip(self))]
    pub fn fail_load(&mut self, ticket: LoadTicket) -> Option<String> {
        let node_id = mutation::fail_load(&mut self.state, &mut self.pending, ticket)?;
        self.emit(TreeEventKind::NodeLoadFailed, Some(node_id.as_str()));
        Some(node_id)
    }

    /// Serve `request` synchronously from `loader`.
    pub fn load_with(
        &mut self,
        request: &LoadRequest,
        loader: &dyn ChildLoader,
    ) -> ApplicationResult<LoadResolution> {
        match loader.load_children(&request.node_id) {
            Ok(children) => match self.complete_load(request.ticket, children) {
                Ok(resolution) => Ok(resolution),
                Err(e) => {
                    self.fail_load(request.ticket);
                    Err(e)
                }
            },
            Err(e) => {
                warn!("loading children of {} failed: {}", request.node_id, e);
                self.fail_load(request.ticket);
                Err(ApplicationError::LoadFailed {
                    node_id: request.node_id.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Flattened rows to render, in display order.
    pub fn visible_rows(&self) -> Vec<VisibleRow> {
        let indeterminate = check::indeterminate_ids(&self.store, &self.state.checked);
        visibility::resolve(&self.store, &self.state.expanded, &self.state.search_term)
            .into_iter()
            .filter_map(|row| {
                let node = self.store.find_by_id(&row.id).ok()?;
                let is_leaf = node.is_leaf();
                let is_loading = self.pending.is_pending(&row.id);
                Some(VisibleRow {
                    icon: self.icon_for(&node.data, is_leaf, row.is_expanded, is_loading),
                    label: node.data.label.clone(),
                    depth: row.depth,
                    is_expanded: row.is_expanded,
                    is_leaf,
                    is_selected: self.state.selected.contains(&row.id),
                    is_checked: self.state.checked.contains(&row.id),
                    is_indeterminate: indeterminate.contains(&row.id),
                    is_search_match: row.is_search_match,
                    is_loading,
                    is_disabled: node.data.disabled,
                    id: row.id,
                })
            })
            .collect()
    }

    fn icon_for(&self, data: &NodeData, is_leaf: bool, expanded: bool, loading: bool) -> Option<String> {
        if data.icon.is_some() {
            return data.icon.clone();
        }
        let icons = &self.options.icons;
        let glyph = if loading {
            &icons.loading
        } else if is_leaf {
            &icons.leaf
        } else if expanded {
            &icons.expanded
        } else {
            &icons.collapsed
        };
        (!glyph.is_empty()).then(|| glyph.clone())
    }

    pub fn node(&self, id: &str) -> ApplicationResult<&NodeData> {
        Ok(&self.store.find_by_id(id)?.data)
    }

    pub fn path_to_root(&self, id: &str) -> ApplicationResult<Vec<String>> {
        Ok(self.store.path_to_root(id)?)
    }

    pub fn check_state(&self, id: &str) -> ApplicationResult<CheckState> {
        Ok(check::check_state(&self.store, &self.state.checked, id)?)
    }

    pub fn is_indeterminate(&self, id: &str) -> ApplicationResult<bool> {
        Ok(check::is_indeterminate(&self.store, &self.state.checked, id)?)
    }

    pub fn has_checked_descendant(&self, id: &str) -> ApplicationResult<bool> {
        Ok(check::has_checked_descendant(&self.store, &self.state.checked, id)?)
    }

    pub fn checked_ids(&self) -> Vec<String> {
        self.state.snapshot().checked
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.state.snapshot().selected
    }

    pub fn expanded_ids(&self) -> Vec<String> {
        self.state.snapshot().expanded
    }

    pub fn indeterminate_ids(&self) -> Vec<String> {
        let set: HashSet<String> = check::indeterminate_ids(&self.store, &self.state.checked);
        let mut ids: Vec<_> = set.into_iter().collect();
        ids.sort();
        ids
    }

    pub fn search_term(&self) -> &str {
        &self.state.search_term
    }

    pub fn snapshot(&self) -> TreeStateSnapshot {
        self.state.snapshot()
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.options.selection_mode
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn state(&self) -> &TreeState {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
