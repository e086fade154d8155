//! Node type definitions and the physical-parameters table.
//!
//! Every entity in the diagram is classified by a [`NodeType`]. The type drives
//! both the display title and the force-layout parameters (radius, link
//! distance, charge) that the layout engine reads back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TopologyError;

/// Radius handed out for a type name that is not in the table
pub const DEFAULT_RADIUS: f64 = 15.0;

/// Node counts outside this range are clamped before scaling forces
pub const FORCE_SCALE_DOMAIN: (f64, f64) = (6.0, 80.0);

/// Gravity range; the table has no per-type gravity
pub const GRAVITY_RANGE: (f64, f64) = (0.0001, 0.1);

/// Closed classification of a topology entity.
///
/// Each discriminant is the type's row in [`NODE_PARAMS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Interior router reached over inter-router links
    #[serde(rename = "inter-router")]
    InterRouter = 0,
    /// Edge router
    #[serde(rename = "edge")]
    Edge = 6,
    /// Client connection
    #[serde(rename = "normal")]
    Normal = 3,
    /// Broker attached on demand
    #[serde(rename = "on-demand")]
    OnDemand = 4,
    /// Route container (usually a broker)
    #[serde(rename = "route-container")]
    RouteContainer = 5,
    /// Edge router as seen in its own management address
    #[serde(rename = "_edge")]
    EdgeAddress = 1,
    /// Interior router as seen in its own management address
    #[serde(rename = "_topo")]
    TopoAddress = 2,
}

/// Layout parameters for one node type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeParams {
    /// Display radius in pixels
    pub radius: f64,
    /// Link distance for small graphs and for large graphs
    pub link_distance: (f64, f64),
    /// Repulsion for small graphs and for large graphs
    pub charge: (f64, f64),
}

const ROUTER: NodeParams = NodeParams {
    radius: 28.0,
    link_distance: (150.0, 70.0),
    charge: (-1800.0, -900.0),
};

const EDGE_ROUTER: NodeParams = NodeParams {
    radius: 20.0,
    link_distance: (110.0, 55.0),
    charge: (-1350.0, -900.0),
};

const CLIENT: NodeParams = NodeParams {
    radius: 15.0,
    link_distance: (75.0, 40.0),
    charge: (-900.0, -900.0),
};

/// The immutable physical-parameters table shared by every collection
pub static NODE_PARAMS: [(NodeType, NodeParams); 7] = [
    (NodeType::InterRouter, ROUTER),
    (NodeType::EdgeAddress, EDGE_ROUTER),
    (NodeType::TopoAddress, ROUTER),
    (NodeType::Normal, CLIENT),
    (NodeType::OnDemand, CLIENT),
    (NodeType::RouteContainer, CLIENT),
    (NodeType::Edge, EDGE_ROUTER),
];

impl NodeType {
    /// All node types in table order
    pub fn all() -> impl Iterator<Item = NodeType> {
        NODE_PARAMS.iter().map(|(node_type, _)| *node_type)
    }

    /// Wire name of this node type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InterRouter => "inter-router",
            Self::Edge => "edge",
            Self::Normal => "normal",
            Self::OnDemand => "on-demand",
            Self::RouteContainer => "route-container",
            Self::EdgeAddress => "_edge",
            Self::TopoAddress => "_topo",
        }
    }

    /// Layout parameters for this node type, read from [`NODE_PARAMS`]
    pub fn params(&self) -> &'static NodeParams {
        &NODE_PARAMS[*self as usize].1
    }

    pub fn radius(&self) -> f64 {
        self.params().radius
    }

    /// Returns true for client-like entities that resolve tooltips locally
    pub fn is_local_tooltip(&self) -> bool {
        matches!(self, Self::Normal | Self::Edge)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::all()
            .find(|node_type| node_type.as_str() == s)
            .ok_or_else(|| TopologyError::UnknownNodeType(s.to_string()))
    }
}

/// Look up the display radius for a node type name.
///
/// Unknown names are logged and get [`DEFAULT_RADIUS`].
pub fn radius_for(type_name: &str) -> f64 {
    match type_name.parse::<NodeType>() {
        Ok(node_type) => node_type.radius(),
        Err(_) => {
            log::warn!("Requested radius for unknown node type: {}", type_name);
            DEFAULT_RADIUS
        }
    }
}

/// Largest radius in the table
pub fn max_radius() -> f64 {
    NODE_PARAMS
        .iter()
        .map(|(_, params)| params.radius)
        .fold(0.0, f64::max)
}

/// Every distinct radius in the table, ascending
pub fn discrete_radii() -> Vec<f64> {
    let mut radii: Vec<f64> = NODE_PARAMS.iter().map(|(_, params)| params.radius).collect();
    radii.sort_by(|a, b| a.total_cmp(b));
    radii.dedup();
    radii
}

/// Map a node count onto `range`, linearly across [`FORCE_SCALE_DOMAIN`].
///
/// Counts below 6 or above 80 are clamped, so physics stop changing once the
/// graph is very small or very large.
pub fn force_scale(node_count: usize, range: (f64, f64)) -> f64 {
    let (lo, hi) = FORCE_SCALE_DOMAIN;
    let count = (node_count as f64).clamp(lo, hi);
    let t = (count - lo) / (hi - lo);
    range.0 + t * (range.1 - range.0)
}
