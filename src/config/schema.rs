//! Configuration schema for codex-stage
//!
//! Settings are stored at `~/.config/codex-stage/config.toml`. Every field
//! has a default, so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Package registry settings
    pub registry: RegistryConfig,

    /// Staging workflow settings
    pub stage: StageConfig,

    /// Development launcher settings
    pub launch: LaunchConfig,
}

/// Package registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry base URL
    pub url: String,

    /// Package that carries the platform binaries
    pub package: String,

    /// Per-request timeout in seconds (0 disables the timeout)
    pub timeout_secs: u64,

    /// Maximum number of redirects followed for a single fetch
    pub max_redirects: u32,
}

impl RegistryConfig {
    /// Request timeout, or `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "https://registry.npmjs.org".to_string(),
            package: "@openai/codex".to_string(),
            timeout_secs: 300,
            max_redirects: 5,
        }
    }
}

/// What to do when one target fails during a multi-target run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing target
    #[default]
    Abort,
    /// Stage every target, then report all failures
    Continue,
}

/// Staging workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Staging root (relative paths resolve against the app root)
    pub root: PathBuf,

    /// JSON targets table (relative paths resolve against the app root)
    pub targets_file: PathBuf,

    /// Manifest file name inside each target directory
    pub manifest_name: String,

    /// Multi-target failure handling
    pub on_failure: FailurePolicy,

    /// External extraction program
    pub tar_command: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources").join("bin"),
            targets_file: PathBuf::from("scripts").join("codex-targets.json"),
            manifest_name: ".codex-stage.json".to_string(),
            on_failure: FailurePolicy::Abort,
            tar_command: "tar".to_string(),
        }
    }
}

/// Development launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Electron executable (relative paths resolve against the app root)
    pub electron: PathBuf,

    /// Default `BUILD_FLAVOR` when not set in the environment
    pub build_flavor: String,

    /// Default `ELECTRON_RENDERER_URL` when not set in the environment
    pub renderer_url: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        let electron = if cfg!(windows) {
            "electron.cmd"
        } else {
            "electron"
        };
        Self {
            electron: PathBuf::from("node_modules").join(".bin").join(electron),
            build_flavor: "dev".to_string(),
            renderer_url: "app://-/index.html".to_string(),
        }
    }
}
