//! TOML tree documents
//!
//! ```toml
//! [[nodes]]
//! id = "docs"
//! label = "Documents"
//! lazy = true
//! has_children = true
//!
//! [[lazy.docs]]
//! id = "report"
//! label = "report.pdf"
//! ```
//!
//! `nodes` is the initial forest; `lazy` maps a lazy node id to the children
//! served when it is first expanded.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::NodeSpec;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::ChildLoader;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub lazy: BTreeMap<String, Vec<NodeSpec>>,
}

impl TreeDocument {
    /// Parse document text; `origin` only labels errors.
    pub fn parse(content: &str, origin: &Path) -> InfraResult<Self> {
        toml::from_str(content).map_err(|e| InfraError::Document {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> InfraResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
        let doc = Self::parse(&content, path)?;
        debug!(
            "loaded {} root nodes and {} lazy entries from {}",
            doc.nodes.len(),
            doc.lazy.len(),
            path.display()
        );
        Ok(doc)
    }
}

impl ChildLoader for TreeDocument {
    fn load_children(&self, node_id: &str) -> io::Result<Vec<NodeSpec>> {
        self.lazy.get(node_id).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no lazy children for {}", node_id),
            )
        })
    }
}
