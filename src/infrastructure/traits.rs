//! I/O boundary traits
//!
//! Fetching lazy children is the caller's business; the engine only needs
//! something it can ask for the children of one node.

use std::io;

use crate::domain::NodeSpec;

/// Source of children for lazy nodes.
pub trait ChildLoader {
    /// Fetch the children of `node_id`.
    fn load_children(&self, node_id: &str) -> io::Result<Vec<NodeSpec>>;
}

impl<F> ChildLoader for F
where
    F: Fn(&str) -> io::Result<Vec<NodeSpec>>,
{
    fn load_children(&self, node_id: &str) -> io::Result<Vec<NodeSpec>> {
        self(node_id)
    }
}
