//! Saved entity positions.
//!
//! Positions are kept in a key-value store keyed by entity name, each value a
//! JSON-encoded `{x, y, fixed}` record, plus `lon`/`lat` when the entity is
//! pinned on a background map. The store survives between sessions so
//! a diagram reopens where the user left it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::topology::entity::coerce_fixed;

/// Errors that can occur while reading or writing saved positions
#[derive(Debug, thiserror::Error)]
pub enum PositionStoreError {
    #[error("Position store I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Position store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One persisted entity position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: f64,
    pub y: f64,
    #[serde(default, serialize_with = "serialize_fixed", deserialize_with = "deserialize_fixed")]
    pub fixed: bool,
    /// Geographic pin, degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
}

impl SavedPosition {
    /// Screen position without a geographic pin
    pub fn new(x: f64, y: f64, fixed: bool) -> Self {
        Self { x, y, fixed, lon: None, lat: None }
    }

    /// Attach a geographic pin
    pub fn with_lon_lat(mut self, lon: Option<f64>, lat: Option<f64>) -> Self {
        self.lon = lon;
        self.lat = lat;
        self
    }
}

fn serialize_fixed<S: Serializer>(fixed: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*fixed))
}

fn deserialize_fixed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_fixed(&value))
}

/// Durable key-value store for JSON-encoded positions
pub trait PositionStore {
    /// Raw JSON record stored under `name`
    fn get_raw(&self, name: &str) -> Option<String>;

    /// Store a raw JSON record under `name`
    fn set_raw(&mut self, name: &str, record: String) -> Result<(), PositionStoreError>;

    /// Decode the position saved for `name`.
    ///
    /// A record that does not decode is logged and treated as absent.
    fn load(&self, name: &str) -> Option<SavedPosition> {
        let raw = self.get_raw(name)?;
        match serde_json::from_str(&raw) {
            Ok(position) => Some(position),
            Err(e) => {
                log::warn!("Ignoring unreadable saved position for {}: {}", name, e);
                None
            }
        }
    }

    /// Encode and store the position for `name`
    fn save(&mut self, name: &str, position: &SavedPosition) -> Result<(), PositionStoreError> {
        let record = serde_json::to_string(position)?;
        self.set_raw(name, record)
    }
}

/// Position store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    records: HashMap<String, String>,
}

impl MemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PositionStore for MemoryPositionStore {
    fn get_raw(&self, name: &str) -> Option<String> {
        self.records.get(name).cloned()
    }

    fn set_raw(&mut self, name: &str, record: String) -> Result<(), PositionStoreError> {
        self.records.insert(name.to_string(), record);
        Ok(())
    }
}

/// Position store persisted as a single JSON object on disk.
///
/// Writes are buffered in memory until [`flush`](JsonFilePositionStore::flush).
#[derive(Debug, Clone)]
pub struct JsonFilePositionStore {
    path: PathBuf,
    records: BTreeMap<String, String>,
}

impl JsonFilePositionStore {
    /// Open the store at `path`, starting empty if the file does not exist yet
    pub fn open(path: &Path) -> Result<Self, PositionStoreError> {
        let records = if path.exists() {
            let content = fs::read_to_string(path).map_err(|source| PositionStoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&content)?
        } else {
            log::debug!("Position store {:?} does not exist yet, starting empty", path);
            BTreeMap::new()
        };
        log::info!("Opened position store {:?} with {} saved positions", path, records.len());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every buffered record to disk
    pub fn flush(&self) -> Result<(), PositionStoreError> {
        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content).map_err(|source| PositionStoreError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        log::info!("Saved {} positions to {:?}", self.records.len(), self.path);
        Ok(())
    }
}

impl PositionStore for JsonFilePositionStore {
    fn get_raw(&self, name: &str) -> Option<String> {
        self.records.get(name).cloned()
    }

    fn set_raw(&mut self, name: &str, record: String) -> Result<(), PositionStoreError> {
        self.records.insert(name.to_string(), record);
        Ok(())
    }
}
