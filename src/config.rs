use serde::{Deserialize, Serialize};

use crate::geo::{EquirectangularProjection, GeoBounds};

/// Top-level configuration structure that mirrors the YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Canvas settings
    #[serde(default)]
    pub view: ViewSize,
    /// (Optional) JSON file holding saved positions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<String>,
    /// (Optional) Background map bounds; enables geographic pinning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionConfig>,
    /// (Optional) Log level used when RUST_LOG is unset (default: "info")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewSize {
    pub width: f64,
    pub height: f64,
}

/// Geographic bounds of the background map, in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectionConfig {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid view configuration: {0}")]
    InvalidView(String),
    #[error("Invalid positions configuration: {0}")]
    InvalidPositions(String),
    #[error("Invalid projection configuration: {0}")]
    InvalidProjection(String),
}

impl ViewConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.view.width > 0.0) || !(self.view.height > 0.0) {
            return Err(ValidationError::InvalidView(format!(
                "width and height must be positive, got {}x{}",
                self.view.width, self.view.height
            )));
        }

        if let Some(path) = &self.positions {
            if path.trim().is_empty() {
                return Err(ValidationError::InvalidPositions(
                    "positions path cannot be empty".to_string(),
                ));
            }
        }

        if let Some(p) = &self.projection {
            if !(p.west < p.east) {
                return Err(ValidationError::InvalidProjection(format!(
                    "west ({}) must be less than east ({})",
                    p.west, p.east
                )));
            }
            if !(p.south < p.north) {
                return Err(ValidationError::InvalidProjection(format!(
                    "south ({}) must be less than north ({})",
                    p.south, p.north
                )));
            }
            if p.west < -180.0 || p.east > 180.0 || p.south < -90.0 || p.north > 90.0 {
                return Err(ValidationError::InvalidProjection(
                    "bounds must lie within -180..180 longitude and -90..90 latitude".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Projection over the configured canvas, if geographic mode is enabled
    pub fn projection(&self) -> Option<EquirectangularProjection> {
        self.projection.map(|p| {
            EquirectangularProjection::new(
                self.view.width,
                self.view.height,
                GeoBounds {
                    west: p.west,
                    east: p.east,
                    north: p.north,
                    south: p.south,
                },
            )
        })
    }

    /// Log level to fall back on when RUST_LOG is unset
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Configured log level as a global filter, if it names a single level
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.log_level().trim().parse().ok()
    }
}

/// Default implementations
impl Default for ViewSize {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 640.0,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view: ViewSize::default(),
            positions: None,
            projection: None,
            log_level: Some("info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_config_parsing() {
        let yaml = r#"
view:
  width: 1200
  height: 800
positions: "positions.json"
projection:
  west: -130.0
  east: -60.0
  north: 55.0
  south: 20.0
log_level: debug
"#;

        let config: ViewConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.view, ViewSize { width: 1200.0, height: 800.0 });
        assert_eq!(config.positions.as_deref(), Some("positions.json"));
        assert_eq!(config.log_level(), "debug");

        let projection = config.projection().unwrap();
        assert_eq!(projection.width, 1200.0);
        assert_eq!(projection.bounds.west, -130.0);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ViewConfig = serde_yaml::from_str("log_level: warn\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.view, ViewSize::default());
        assert!(config.projection().is_none());
    }

    #[test]
    fn test_level_filter() {
        let config: ViewConfig = serde_yaml::from_str("log_level: Debug\n").unwrap();
        assert_eq!(config.level_filter(), Some(log::LevelFilter::Debug));

        let config = ViewConfig { log_level: None, ..ViewConfig::default() };
        assert_eq!(config.level_filter(), Some(log::LevelFilter::Info));

        let config = ViewConfig { log_level: Some("topoview=debug".to_string()), ..ViewConfig::default() };
        assert_eq!(config.level_filter(), None);
    }

    #[test]
    fn test_invalid_view_size() {
        let mut config = ViewConfig::default();
        config.view.height = 0.0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidView(_))));
    }

    #[test]
    fn test_invalid_positions_path() {
        let config = ViewConfig {
            positions: Some("  ".to_string()),
            ..ViewConfig::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPositions(_))));
    }

    #[test]
    fn test_invalid_projection_bounds() {
        let mut config = ViewConfig {
            projection: Some(ProjectionConfig { west: 10.0, east: -10.0, north: 50.0, south: 40.0 }),
            ..ViewConfig::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidProjection(_))));

        config.projection = Some(ProjectionConfig { west: -10.0, east: 10.0, north: 95.0, south: 40.0 });
        assert!(matches!(config.validate(), Err(ValidationError::InvalidProjection(_))));
    }
}
