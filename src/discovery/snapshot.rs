//! Snapshot-backed management source.
//!
//! Serves attribute rows from a discovery snapshot captured earlier (for
//! example a JSON dump of the management responses). Nothing is fetched over
//! the network: `ensure_entities` only checks that the snapshot already holds
//! the requested attribute sets.

use async_trait::async_trait;
use std::fs::File;
use std::path::Path;

use super::{AttributeRequest, DiscoverySnapshot, FetchError, ManagementSource, NodeInfo};

/// Management source answering from a fixed [`DiscoverySnapshot`]
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: DiscoverySnapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: DiscoverySnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot from a JSON file mapping router id to node info
    pub fn from_json_file(path: &Path) -> Result<Self, serde_json::Error> {
        let file = File::open(path).map_err(serde_json::Error::io)?;
        let snapshot: DiscoverySnapshot = serde_json::from_reader(file)?;
        log::info!("Loaded discovery snapshot with {} routers from {:?}", snapshot.len(), path);
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &DiscoverySnapshot {
        &self.snapshot
    }
}

#[async_trait]
impl ManagementSource for SnapshotSource {
    async fn ensure_entities(&self, key: &str, requests: &[AttributeRequest]) -> Result<(), FetchError> {
        let node = self.snapshot.get(key).ok_or_else(|| FetchError::Unavailable {
            key: key.to_string(),
            reason: "router not present in snapshot".to_string(),
        })?;

        for request in requests {
            let results = node.get(&request.entity).ok_or_else(|| FetchError::MissingEntity {
                key: key.to_string(),
                entity: request.entity.clone(),
            })?;
            if let Some(attr) = request
                .attrs
                .iter()
                .find(|attr| !results.attribute_names.contains(attr))
            {
                return Err(FetchError::MissingAttribute {
                    key: key.to_string(),
                    entity: request.entity.clone(),
                    attribute: attr.clone(),
                });
            }
        }
        Ok(())
    }

    fn node_info(&self, key: &str) -> Option<NodeInfo> {
        self.snapshot.get(key).cloned()
    }
}
