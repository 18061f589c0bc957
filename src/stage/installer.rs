//! Archive installer
//!
//! Turns a downloaded package tarball into a populated target directory:
//! extract into scratch space, locate the vendor folders for the target
//! triple, replace the destination wholesale, copy binaries flat, fix
//! permissions, write the manifest, verify.

use super::manifest::StageManifest;
use super::scratch::ScratchDir;
use crate::config::TargetConfig;
use crate::error::{StageError, StageResult};
use crate::registry::{RegistryClient, Transport};
use crate::target::BinaryNames;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

const SCRATCH_PREFIX: &str = "codex-stage-";
const ARCHIVE_NAME: &str = "codex.tgz";
const EXTRACT_DIR: &str = "extract";

/// What to install and where
#[derive(Debug, Clone)]
pub struct InstallRequest<'a> {
    pub package_name: &'a str,
    pub package_version: &'a str,
    pub target: &'a TargetConfig,
    pub destination: &'a Path,
}

/// Result of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Every file copied into the destination
    pub files: Vec<PathBuf>,
    /// Manifest written alongside the binaries
    pub manifest: StageManifest,
    /// Names of the two verified executables
    pub binaries: BinaryNames,
}

/// Extracts package archives into target directories
#[derive(Debug, Clone)]
pub struct Installer {
    tar_command: String,
    manifest_name: String,
    scratch_parent: PathBuf,
}

impl Installer {
    /// Create an installer using the given extraction program and manifest name
    pub fn new(tar_command: impl Into<String>, manifest_name: impl Into<String>) -> Self {
        Self {
            tar_command: tar_command.into(),
            manifest_name: manifest_name.into(),
            scratch_parent: std::env::temp_dir(),
        }
    }

    /// Place scratch directories under `parent` instead of the system temp dir
    pub fn with_scratch_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.scratch_parent = parent.into();
        self
    }

    /// Manifest path for a destination directory
    pub fn manifest_path(&self, destination: &Path) -> PathBuf {
        destination.join(&self.manifest_name)
    }

    /// Download the package for `request` and install it
    pub async fn install<T: Transport>(
        &self,
        registry: &RegistryClient<T>,
        request: &InstallRequest<'_>,
    ) -> StageResult<InstallReport> {
        let tarball_url = registry.tarball_url(request.package_version).await?;
        let archive = registry.fetch(&tarball_url).await?;
        info!(
            "Downloaded {}@{} ({} bytes)",
            request.package_name,
            request.package_version,
            archive.len()
        );
        self.install_archive(&archive, request).await
    }

    /// Install from archive bytes already in memory
    ///
    /// The scratch directory is removed whether or not installation succeeds.
    pub async fn install_archive(
        &self,
        archive: &[u8],
        request: &InstallRequest<'_>,
    ) -> StageResult<InstallReport> {
        let scratch = ScratchDir::create_in(&self.scratch_parent, SCRATCH_PREFIX).await?;
        let result = self.install_in(&scratch, archive, request).await;
        scratch.remove().await;
        result
    }

    async fn install_in(
        &self,
        scratch: &ScratchDir,
        archive: &[u8],
        request: &InstallRequest<'_>,
    ) -> StageResult<InstallReport> {
        let digest = hex::encode(Sha256::digest(archive));
        debug!("Archive sha256: {}", digest);

        let archive_path = scratch.path().join(ARCHIVE_NAME);
        let extract_dir = scratch.path().join(EXTRACT_DIR);
        fs::create_dir_all(&extract_dir).await.map_err(|e| {
            StageError::io(format!("creating {}", extract_dir.display()), e)
        })?;
        fs::write(&archive_path, archive).await.map_err(|e| {
            StageError::io(format!("writing {}", archive_path.display()), e)
        })?;

        self.extract(&archive_path, &extract_dir).await?;

        let vendor = extract_dir
            .join("package")
            .join("vendor")
            .join(&request.target.triple);
        let codex_source = vendor.join("codex");
        let ripgrep_source = vendor.join("path");
        require_dir("codex", &codex_source).await?;
        require_dir("ripgrep", &ripgrep_source).await?;

        let destination = request.destination;
        replace_dir(destination).await?;

        let mut files = copy_files_flat(&codex_source, destination).await?;
        files.extend(copy_files_flat(&ripgrep_source, destination).await?);
        debug!("Copied {} file(s) into {}", files.len(), destination.display());

        let changed = mark_executable(&files, request.target.is_windows()).await?;
        debug!("Marked {} file(s) executable", changed);

        let manifest = StageManifest::new(
            request.package_name,
            request.package_version,
            &request.target.triple,
        )
        .with_archive_sha256(digest);
        manifest.write(&self.manifest_path(destination)).await?;

        let binaries = BinaryNames::for_windows(request.target.is_windows());
        require_binary("codex", &destination.join(binaries.codex)).await?;
        require_binary("ripgrep", &destination.join(binaries.ripgrep)).await?;

        Ok(InstallReport {
            files,
            manifest,
            binaries,
        })
    }

    async fn extract(&self, archive: &Path, into: &Path) -> StageResult<()> {
        debug!(
            "Executing: {} -xzf {} -C {}",
            self.tar_command,
            archive.display(),
            into.display()
        );

        let output = Command::new(&self.tar_command)
            .arg("-xzf")
            .arg(archive)
            .arg("-C")
            .arg(into)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StageError::Extraction {
                stdout: String::new(),
                stderr: format!("failed to run {}: {}", self.tar_command, e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(StageError::Extraction {
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn require_dir(kind: &'static str, path: &Path) -> StageResult<()> {
    if is_dir(path).await {
        Ok(())
    } else {
        Err(StageError::MissingDirectory {
            kind,
            path: path.to_path_buf(),
        })
    }
}

async fn require_binary(kind: &'static str, path: &Path) -> StageResult<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(StageError::MissingBinary {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Remove `dir` entirely if present, then recreate it empty
async fn replace_dir(dir: &Path) -> StageResult<()> {
    if fs::try_exists(dir).await.unwrap_or(false) {
        fs::remove_dir_all(dir)
            .await
            .map_err(|e| StageError::io(format!("removing {}", dir.display()), e))?;
    }
    fs::create_dir_all(dir)
        .await
        .map_err(|e| StageError::io(format!("creating {}", dir.display()), e))
}

/// Copy the regular files directly inside `source` into `destination`.
/// Subdirectories are skipped.
async fn copy_files_flat(source: &Path, destination: &Path) -> StageResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(source)
        .await
        .map_err(|e| StageError::io(format!("reading {}", source.display()), e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StageError::io(format!("reading entry in {}", source.display()), e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StageError::io(format!("inspecting {}", entry.path().display()), e))?;
        if file_type.is_file() {
            names.push(entry.file_name());
        }
    }
    names.sort();

    let mut copied = Vec::with_capacity(names.len());
    for name in names {
        let src = source.join(&name);
        let dst = destination.join(&name);
        fs::copy(&src, &dst).await.map_err(|e| {
            StageError::io(format!("copying {} to {}", src.display(), dst.display()), e)
        })?;
        copied.push(dst);
    }
    Ok(copied)
}

/// Set mode 0o755 on every file unless the target is Windows.
/// Returns how many files were changed.
async fn mark_executable(files: &[PathBuf], windows_target: bool) -> StageResult<usize> {
    if windows_target {
        return Ok(0);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for file in files {
            fs::set_permissions(file, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| StageError::io(format!("chmod {}", file.display()), e))?;
        }
        Ok(files.len())
    }

    #[cfg(not(unix))]
    {
        let _ = files;
        Ok(0)
    }
}
