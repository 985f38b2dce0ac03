//! treestate: a hierarchical tree state engine
//!
//! Holds a forest of nodes and the view state around it (expansion,
//! selection, tri-state checks, search) and flattens it into the rows a
//! renderer draws. See `application::TreeEngine` for the entry point.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
