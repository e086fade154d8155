use crate::config::ViewConfig;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and parse view configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<ViewConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: ViewConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    if config.projection.is_some() && config.positions.is_none() {
        warn!("Projection configured without a positions file; geographic pins will not persist");
    }

    Ok(config)
}

/// Load the configuration at `config_path`, or fall back to defaults
pub fn load_or_default(config_path: Option<&Path>) -> Result<ViewConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => {
            info!("No configuration file given, using default view settings");
            Ok(ViewConfig::default())
        }
    }
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct ViewCliOverrides {
    pub positions: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// Apply CLI overrides to a view configuration
pub fn apply_overrides(config: &mut ViewConfig, overrides: &ViewCliOverrides) -> Result<()> {
    if let Some(positions) = &overrides.positions {
        info!("Overriding positions file with {}", positions);
        config.positions = Some(positions.clone());
    }
    if let Some(width) = overrides.width {
        config.view.width = width;
    }
    if let Some(height) = overrides.height {
        config.view.height = height;
    }

    // Re-validate after applying overrides
    config.validate()?;

    Ok(())
}
