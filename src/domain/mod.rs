//! Domain layer: the tree model and its derived views
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod check;
pub mod error;
pub mod node;
pub mod selection;
pub mod state;
pub mod visibility;

pub use arena::{NodeStore, RemovedSubtree, TreeNode};
pub use check::{CheckChange, CheckState};
pub use error::{DomainError, DomainResult};
pub use node::{NodeData, NodeSpec};
pub use selection::{SelectionChange, SelectionMode};
pub use state::{TreeState, TreeStateSnapshot};
pub use visibility::{SearchFilter, VisibleNode};
