//! Node payloads: the per-node data held by the store and the owned input tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Data payload for a tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// Unique, stable identifier across the whole tree
    pub id: String,
    /// Display text, also the search target
    pub label: String,
    /// Optional icon name handed through to the renderer
    pub icon: Option<String>,
    pub disabled: bool,
    pub selectable: bool,
    /// Children must be fetched on first expand
    pub lazy: bool,
    /// Only meaningful together with `lazy`
    pub has_children: bool,
}

impl NodeData {
    /// A lazy node whose children are still unfetched.
    pub fn awaits_children(&self) -> bool {
        self.lazy && self.has_children
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

/// Owned recursive node description, as delivered by a data source
/// (initial tree, lazy-load response or `add_node`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default = "default_selectable")]
    pub selectable: bool,
    #[serde(default)]
    pub lazy: bool,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

fn default_selectable() -> bool {
    true
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            disabled: false,
            selectable: true,
            lazy: false,
            has_children: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeSpec>) -> Self {
        self.children = children;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn unselectable(mut self) -> Self {
        self.selectable = false;
        self
    }

    /// Mark as a lazy node with unfetched children.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self.has_children = true;
        self
    }

    /// Split into the node's own data and its children.
    pub fn into_parts(self) -> (NodeData, Vec<NodeSpec>) {
        let data = NodeData {
            id: self.id,
            label: self.label,
            icon: self.icon,
            disabled: self.disabled,
            selectable: self.selectable,
            lazy: self.lazy,
            has_children: self.has_children,
        };
        (data, self.children)
    }

    /// Ids of this node and all descendants, pre-order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        let mut stack = vec![self];
        while let Some(spec) = stack.pop() {
            ids.push(spec.id.as_str());
            for child in spec.children.iter().rev() {
                stack.push(child);
            }
        }
        ids
    }
}
