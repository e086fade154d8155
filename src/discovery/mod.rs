//! Discovery and attribute collaborator contract.
//!
//! The topology model never talks to the management network itself. Router
//! attributes arrive through a [`ManagementSource`], which can fetch attribute
//! sets on demand and hand back the raw name/value rows it has cached.

pub mod router_id;
pub mod snapshot;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub use router_id::{name_from_id, node_type_from_id};
pub use snapshot::SnapshotSource;

/// Raw attribute rows for one entity kind on one router
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityResults {
    pub attribute_names: Vec<String>,
    #[serde(default)]
    pub results: Vec<Vec<Value>>,
}

impl EntityResults {
    /// Flatten every result row into a keyed record
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.results
            .iter()
            .map(|row| flatten(&self.attribute_names, row))
            .collect()
    }

    /// Flatten the first result row, if there is one
    pub fn first_record(&self) -> Option<Map<String, Value>> {
        self.results.first().map(|row| flatten(&self.attribute_names, row))
    }
}

/// Entity kind (`router`, `listener`, ...) -> attribute rows
pub type NodeInfo = BTreeMap<String, EntityResults>;

/// Router id -> everything discovered about that router
pub type DiscoverySnapshot = BTreeMap<String, NodeInfo>;

/// One attribute set to make available for a router
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRequest {
    pub entity: String,
    pub attrs: Vec<String>,
}

impl AttributeRequest {
    pub fn new(entity: &str, attrs: &[&str]) -> Self {
        Self {
            entity: entity.to_string(),
            attrs: attrs.iter().map(|attr| attr.to_string()).collect(),
        }
    }
}

/// Errors reported by a [`ManagementSource`]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Management query for {key} failed: {reason}")]
    Unavailable { key: String, reason: String },

    #[error("Router {key} has no {entity} results")]
    MissingEntity { key: String, entity: String },

    #[error("Router {key} did not report attribute {attribute} for {entity}")]
    MissingAttribute {
        key: String,
        entity: String,
        attribute: String,
    },
}

/// Source of router attributes discovered over the management network
#[async_trait]
pub trait ManagementSource: Send + Sync {
    /// Make sure the requested attribute sets are available for `key`.
    ///
    /// Completes once every request can be read back through [`node_info`].
    ///
    /// [`node_info`]: ManagementSource::node_info
    async fn ensure_entities(&self, key: &str, requests: &[AttributeRequest]) -> Result<(), FetchError>;

    /// Cached attribute rows for `key`
    fn node_info(&self, key: &str) -> Option<NodeInfo>;
}

/// Zip parallel attribute names and values into one keyed record.
///
/// Extra values past the end of `names` are dropped; missing values are left out.
pub fn flatten(names: &[String], values: &[Value]) -> Map<String, Value> {
    names
        .iter()
        .zip(values.iter())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
