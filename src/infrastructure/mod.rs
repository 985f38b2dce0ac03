//! Infrastructure layer: I/O boundary traits and tree documents

pub mod document;
pub mod error;
pub mod traits;

pub use document::TreeDocument;
pub use error::{InfraError, InfraResult};
pub use traits::ChildLoader;
