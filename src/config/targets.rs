//! Targets table
//!
//! The JSON targets file lists every platform/arch pair binaries are staged
//! for. Key order in the file is the processing order for `--all`.

use crate::error::{StageError, StageResult};
use serde::Deserialize;
use std::path::Path;

/// One supported platform/arch combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Target key, `<platform>-<arch>`
    pub key: String,
    /// Toolchain triple used inside the package's vendor tree
    pub triple: String,
    /// Suffix appended to the base version to form the package version
    pub package_suffix: String,
}

impl TargetConfig {
    /// Platform half of the key (`darwin`, `linux`, `win32`, ...)
    pub fn platform(&self) -> &str {
        self.key.split('-').next().unwrap_or(&self.key)
    }

    /// Whether binaries for this target carry the `.exe` suffix
    pub fn is_windows(&self) -> bool {
        self.platform() == "win32"
    }

    /// Package version published for this target, e.g. `0.46.0-linux-x64`
    pub fn package_version(&self, base: &str) -> String {
        format!("{}-{}", base, self.package_suffix)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTarget {
    triple: String,
    package_suffix: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTargetsFile {
    codex_version: String,
    targets: serde_json::Map<String, serde_json::Value>,
}

/// Parsed targets file: default version plus ordered target table
#[derive(Debug, Clone)]
pub struct TargetsFile {
    default_version: String,
    targets: Vec<TargetConfig>,
}

impl TargetsFile {
    /// Build a table directly (used by tests and embedders)
    pub fn new(default_version: impl Into<String>, targets: Vec<TargetConfig>) -> Self {
        Self {
            default_version: default_version.into(),
            targets,
        }
    }

    /// Load the targets file from disk
    pub async fn load(path: &Path) -> StageResult<Self> {
        if !path.exists() {
            return Err(StageError::TargetsFileNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StageError::io(format!("reading targets from {}", path.display()), e))?;

        Self::parse(&content).map_err(|e| StageError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse the targets file from a JSON string
    pub fn parse(content: &str) -> StageResult<Self> {
        let raw: RawTargetsFile = serde_json::from_str(content)?;

        let mut targets = Vec::with_capacity(raw.targets.len());
        for (key, value) in raw.targets {
            let target: RawTarget = serde_json::from_value(value)?;
            targets.push(TargetConfig {
                key,
                triple: target.triple,
                package_suffix: target.package_suffix,
            });
        }

        Ok(Self {
            default_version: raw.codex_version,
            targets,
        })
    }

    /// Version staged when no override is given
    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Look up a target by key
    pub fn get(&self, key: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.key == key)
    }

    /// All target keys in configuration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.key.as_str())
    }

    /// All targets in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.iter()
    }
}
