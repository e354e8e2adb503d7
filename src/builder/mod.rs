//! Builder API for declaring state topologies.
//!
//! This module provides fluent builders for assembling the static
//! tables: vertices first, then transitions, branches, history wiring
//! and submachine connections. Everything the resolver would otherwise
//! discover at dispatch time as a malformed table is validated once in
//! [`TopologyBuilder::build`].

pub mod error;
pub mod topology;
pub mod transition;

pub use error::BuildError;
pub use topology::TopologyBuilder;
pub use transition::{BranchBuilder, TransitionBuilder};
