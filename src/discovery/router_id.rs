//! Router management address parsing.
//!
//! Routers are discovered by their management address:
//!
//! ```text
//! amqp:/_topo/0/<router name>/$management    interior router
//! amqp:/_edge/<router name>/$management      edge router
//! ```
//!
//! The router name may itself contain `/`.

use crate::topology::{NodeType, TopologyError};

/// Area segment that follows `_topo`
const TOPO_AREA: &str = "0";

/// Split an id into its segments, rejecting anything too short to carry a name
fn segments(id: &str) -> Result<Vec<&str>, TopologyError> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.len() < 4 {
        return Err(TopologyError::MalformedId(id.to_string()));
    }
    Ok(parts)
}

/// Derive the router name from a management address
pub fn name_from_id(id: &str) -> Result<String, TopologyError> {
    let mut parts = segments(id)?;
    // drop $management
    parts.pop();
    if parts[1] == NodeType::TopoAddress.as_str() && parts.get(2) == Some(&TOPO_AREA) {
        parts.remove(2);
    }
    let name = parts[2..].join("/");
    if name.is_empty() {
        return Err(TopologyError::MalformedId(id.to_string()));
    }
    Ok(name)
}

/// Classify an id by the path segment after the scheme
pub fn node_type_from_id(id: &str) -> Result<NodeType, TopologyError> {
    let parts = segments(id)?;
    parts[1].parse()
}
