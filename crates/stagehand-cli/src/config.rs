//! Configuration file loading for the CLI
//!
//! This module defines [`AppConfig`] and handles finding and loading it from
//! TOML files in various locations (explicit path, local directory, system
//! directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use stagehand::{LayoutConfig, geometry::Size};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Layout used when the graph file does not declare one.
    layout: Option<LayoutConfig>,

    canvas: CanvasConfig,

    scatter: ScatterConfig,

    /// Fit the settled graph into the canvas before writing positions.
    fit_view: bool,

    /// Upper bound on ticks spent driving an iterative or offloaded run.
    max_ticks: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            layout: None,
            canvas: CanvasConfig::default(),
            scatter: ScatterConfig::default(),
            fit_view: false,
            max_ticks: 1000,
        }
    }
}

impl AppConfig {
    pub fn layout(&self) -> Option<&LayoutConfig> {
        self.layout.as_ref()
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    pub fn scatter(&self) -> &ScatterConfig {
        &self.scatter
    }

    pub fn fit_view(&self) -> bool {
        self.fit_view
    }

    pub fn max_ticks(&self) -> usize {
        self.max_ticks
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.canvas.validate()?;
        if self.max_ticks == 0 {
            return Err(ConfigError::Validation(
                "max_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Dimensions of the headless canvas.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: f32,
    height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.size().is_degenerate() {
            return Err(ConfigError::Validation(format!(
                "canvas must have a positive size, found {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// How nodes without coordinates are seeded before a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScatterMode {
    #[default]
    Random,
    Grid,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ScatterConfig {
    mode: ScatterMode,
    seed: Option<u64>,
}

impl ScatterConfig {
    pub fn mode(&self) -> ScatterMode {
        self.mode
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (stagehand/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("stagehand/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "stagehand", "stagehand") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(
                path = system_config.display().to_string();
                "Loading configuration from system path"
            );
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|err| ConfigError::Parse(err.to_string()))?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
