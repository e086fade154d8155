//! Topology entity model.
//!
//! This module contains the entities drawn in the topology diagram, the
//! collection that keeps them deduplicated and positioned, and the per-type
//! physical parameters consumed by the force layout.

pub mod types;
pub mod entity;
pub mod collection;

// Re-export key types and functions for easier access
pub use types::{NodeParams, NodeType, NODE_PARAMS, DEFAULT_RADIUS};
pub use entity::{Capability, ConnectionDirection, Entity, EntityInit, ToolTip};
pub use collection::{EntityCollection, Lookup, NormalsPosition};

/// Errors raised while building the topology model
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Malformed router id: {0}")]
    MalformedId(String),
}
