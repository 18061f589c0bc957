//! Configuration management for codex-stage

pub mod schema;
pub mod targets;

pub use schema::{FailurePolicy, LaunchConfig, RegistryConfig, Settings, StageConfig};
pub use targets::{TargetConfig, TargetsFile};

use crate::error::{StageError, StageResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codex-stage")
            .join("config.toml")
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub async fn load(&self) -> StageResult<Settings> {
        if !self.config_path.exists() {
            debug!(
                "Config file {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(Settings::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load settings from a specific file
    pub async fn load_from_file(&self, path: &Path) -> StageResult<Settings> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| StageError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| StageError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a possibly relative path against the application root
pub fn resolve_path(app_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        app_root.join(path)
    }
}
