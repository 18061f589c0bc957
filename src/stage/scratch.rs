//! Uniquely named scratch directory with guaranteed removal

use crate::error::{StageError, StageResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Temporary working directory for one stage attempt.
///
/// Call [`ScratchDir::remove`] on every path out of the attempt; dropping
/// without it still removes the tree synchronously.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    removed: bool,
}

impl ScratchDir {
    /// Create `<parent>/<prefix><uuid>`
    pub async fn create_in(parent: &Path, prefix: &str) -> StageResult<Self> {
        let path = parent.join(format!("{}{}", prefix, uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            StageError::io(format!("creating scratch directory {}", path.display()), e)
        })?;
        debug!("Created scratch directory {}", path.display());
        Ok(Self {
            path,
            removed: false,
        })
    }

    /// Root of the scratch tree
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the scratch tree; failures are logged, never raised
    pub async fn remove(mut self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove scratch directory {}: {}", self.path.display(), e);
            }
        }
        self.removed = true;
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = discard(&self.path) {
            warn!("Failed to remove scratch directory {}: {}", self.path.display(), e);
        }
    }
}

/// Remove a tree synchronously; an already-missing tree is not an error
fn discard(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn names_are_unique() {
        let temp = TempDir::new().unwrap();
        let a = ScratchDir::create_in(temp.path(), "codex-stage-").await.unwrap();
        let b = ScratchDir::create_in(temp.path(), "codex-stage-").await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("codex-stage-"));
    }

    #[tokio::test]
    async fn remove_deletes_tree() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::create_in(temp.path(), "s-").await.unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::create_dir_all(path.join("extract/package")).unwrap();
        std::fs::write(path.join("codex.tgz"), b"x").unwrap();

        scratch.remove().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_deletes_tree() {
        let temp = TempDir::new().unwrap();
        let path = {
            let scratch = ScratchDir::create_in(temp.path(), "s-").await.unwrap();
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_after_external_removal_is_quiet() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchDir::create_in(temp.path(), "s-").await.unwrap();
        std::fs::remove_dir_all(scratch.path()).unwrap();
        assert!(discard(scratch.path()).is_ok());
        drop(scratch);
    }

    #[test]
    fn discard_reports_failures() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        // A regular file cannot be removed as a directory tree
        assert!(discard(&file).is_err());
        assert!(file.exists());
    }
}
