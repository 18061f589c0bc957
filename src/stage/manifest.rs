//! Stage manifest persistence
//!
//! Each target directory carries a small JSON record of what was staged
//! into it. The record is written last, via temp file + rename, so a reader
//! never observes a half-written manifest.

use crate::error::{StageError, StageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// Record of the last successful stage into one target directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageManifest {
    /// Registry package the binaries came from
    pub package_name: String,

    /// Fully suffixed package version, e.g. `0.46.0-linux-x64`
    pub package_version: String,

    /// Target triple whose vendor tree was copied
    pub target_triple: String,

    /// When the stage completed
    pub staged_at: DateTime<Utc>,

    /// SHA-256 of the downloaded archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_sha256: Option<String>,
}

impl StageManifest {
    /// Create a manifest stamped with the current time
    pub fn new(
        package_name: impl Into<String>,
        package_version: impl Into<String>,
        target_triple: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            package_version: package_version.into(),
            target_triple: target_triple.into(),
            staged_at: Utc::now(),
            archive_sha256: None,
        }
    }

    /// Attach the archive digest
    pub fn with_archive_sha256(mut self, digest: impl Into<String>) -> Self {
        self.archive_sha256 = Some(digest.into());
        self
    }

    /// Read a manifest, treating a missing or unreadable file as absent
    pub async fn read(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No manifest at {}", path.display());
                return None;
            }
            Err(e) => {
                warn!("Ignoring unreadable manifest {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(
                    "Ignoring corrupt manifest {} ({}); target will be re-staged",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write the manifest atomically (temp file in the same directory, then rename)
    pub async fn write(&self, path: &Path) -> StageResult<()> {
        let parent = path.parent().ok_or_else(|| {
            StageError::Internal(format!("manifest path has no parent: {}", path.display()))
        })?;

        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');

        let tmp_path = parent.join(format!(".manifest.{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp_path, content).await.map_err(|e| {
            StageError::io(format!("writing manifest {}", tmp_path.display()), e)
        })?;

        if let Err(e) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StageError::io(
                format!("replacing manifest {}", path.display()),
                e,
            ));
        }

        debug!("Wrote manifest {}", path.display());
        Ok(())
    }
}
