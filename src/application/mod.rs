//! Application layer: the engine facade and the operations it orchestrates
//!
//! This layer owns view state, pending loads and events; it depends on
//! I/O only through the `ChildLoader` boundary trait.

pub mod engine;
pub mod error;
pub mod events;
pub mod lazy;
pub mod mutation;

pub use engine::{EngineOptions, ExpandOutcome, TreeEngine, VisibleRow};
pub use error::{ApplicationError, ApplicationResult};
pub use events::{EventBus, ListenerId, TreeEvent, TreeEventKind};
pub use lazy::{LoadRequest, LoadTicket, PendingLoads};
pub use mutation::LoadResolution;
