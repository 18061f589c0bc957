//! Binary staging workflow
//!
//! For each selected target: check the stage cache, and when stale, fetch
//! the per-target package from the registry and install it into
//! `<stage root>/<target key>/`.
//!
//! # Target States
//!
//! | State | Description |
//! |-------|-------------|
//! | UpToDate | Manifest matches and both binaries present; nothing fetched |
//! | Staged | Downloaded, extracted, copied, verified |
//! | Failed | Any step errored; the destination is only touched after extraction succeeds |

pub mod cache;
pub mod installer;
pub mod manifest;
pub mod scratch;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{CacheCheck, CacheDecision, StaleReason};
pub use installer::{InstallReport, InstallRequest, Installer};
pub use manifest::StageManifest;

use crate::config::{FailurePolicy, TargetConfig, TargetsFile};
use crate::error::{StageError, StageResult};
use crate::registry::{RegistryClient, Transport};
use crate::target::BinaryNames;
use std::path::PathBuf;
use tracing::{debug, info};

/// Per-run options
#[derive(Debug, Clone, Copy, Default)]
pub struct StageOptions {
    /// Ignore the cache and always re-stage
    pub force: bool,
    /// Multi-target failure handling
    pub on_failure: FailurePolicy,
}

/// Result of staging one target
#[derive(Debug, Clone)]
pub enum StageOutcome {
    /// Cache hit, nothing fetched
    UpToDate { package_version: String },
    /// Freshly staged
    Staged {
        package_version: String,
        report: InstallReport,
    },
}

impl StageOutcome {
    /// Package version now present in the target directory
    pub fn package_version(&self) -> &str {
        match self {
            Self::UpToDate { package_version } | Self::Staged { package_version, .. } => {
                package_version
            }
        }
    }
}

/// Progress callbacks for a staging run
pub trait StageReporter {
    /// Target skipped on a cache hit
    fn up_to_date(&self, _key: &str, _package_version: &str) {}
    /// Download about to start
    fn downloading(&self, _key: &str, _package: &str, _package_version: &str, _reason: &StaleReason) {}
    /// Target installed
    fn staged(&self, _key: &str, _report: &InstallReport) {}
    /// Target failed
    fn failed(&self, _key: &str, _error: &StageError) {}
}

/// Reporter that ignores every event
impl StageReporter for () {}

/// Outcomes of a multi-target run
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Targets that ended up current, in processing order
    pub completed: Vec<(String, StageOutcome)>,
    /// Targets that failed (only populated under `FailurePolicy::Continue`)
    pub failed: Vec<(String, StageError)>,
}

impl RunSummary {
    /// Total number of targets processed
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }

    /// Convert into an error when any target failed
    pub fn into_result(self) -> StageResult<Vec<(String, StageOutcome)>> {
        if self.failed.is_empty() {
            return Ok(self.completed);
        }
        Err(StageError::TargetsFailed {
            failed: self.failed.len(),
            total: self.total(),
            keys: self.failed.into_iter().map(|(key, _)| key).collect(),
        })
    }
}

/// Pick the base version (override or targets-file default) and validate it
pub fn resolve_version(override_version: Option<&str>, targets: &TargetsFile) -> StageResult<String> {
    let version = override_version
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| targets.default_version());

    semver::Version::parse(version).map_err(|e| {
        StageError::Argument(format!("Invalid version '{version}': {e}"))
    })?;

    Ok(version.to_string())
}

/// Stages targets into a staging root
#[derive(Debug)]
pub struct Stager<T> {
    registry: RegistryClient<T>,
    installer: Installer,
    stage_root: PathBuf,
}

impl<T: Transport> Stager<T> {
    /// Create a stager
    pub fn new(registry: RegistryClient<T>, installer: Installer, stage_root: PathBuf) -> Self {
        Self {
            registry,
            installer,
            stage_root,
        }
    }

    /// Registry client in use
    pub fn registry(&self) -> &RegistryClient<T> {
        &self.registry
    }

    /// Destination directory for a target key
    pub fn destination(&self, key: &str) -> PathBuf {
        self.stage_root.join(key)
    }

    /// Stage one target, skipping it when the cache is fresh
    pub async fn stage_target(
        &self,
        target: &TargetConfig,
        base_version: &str,
        force: bool,
        reporter: &dyn StageReporter,
    ) -> StageResult<StageOutcome> {
        let package_version = target.package_version(base_version);
        let destination = self.destination(&target.key);
        let manifest_path = self.installer.manifest_path(&destination);

        let decision = cache::check(&CacheCheck {
            manifest_path: &manifest_path,
            package_version: &package_version,
            target_triple: &target.triple,
            destination: &destination,
            binaries: BinaryNames::for_windows(target.is_windows()),
            force,
        })
        .await;

        let reason = match decision {
            CacheDecision::Fresh => {
                info!("{}: up to date ({})", target.key, package_version);
                reporter.up_to_date(&target.key, &package_version);
                return Ok(StageOutcome::UpToDate { package_version });
            }
            CacheDecision::Stale(reason) => reason,
        };

        debug!("{}: staging required ({})", target.key, reason);
        reporter.downloading(&target.key, self.registry.package(), &package_version, &reason);

        let report = self
            .installer
            .install(
                &self.registry,
                &InstallRequest {
                    package_name: self.registry.package(),
                    package_version: &package_version,
                    target,
                    destination: &destination,
                },
            )
            .await?;

        info!(
            "{}: staged {} and {}",
            target.key, report.binaries.codex, report.binaries.ripgrep
        );
        reporter.staged(&target.key, &report);

        Ok(StageOutcome::Staged {
            package_version,
            report,
        })
    }

    /// Stage every key in order, honoring the failure policy
    pub async fn stage_all(
        &self,
        targets: &TargetsFile,
        keys: &[String],
        base_version: &str,
        options: StageOptions,
        reporter: &dyn StageReporter,
    ) -> StageResult<RunSummary> {
        tokio::fs::create_dir_all(&self.stage_root).await.map_err(|e| {
            StageError::io(
                format!("creating staging root {}", self.stage_root.display()),
                e,
            )
        })?;

        let mut summary = RunSummary::default();

        for key in keys {
            let result = match targets.get(key) {
                Some(target) => {
                    self.stage_target(target, base_version, options.force, reporter)
                        .await
                }
                None => Err(StageError::UnsupportedTarget(key.clone())),
            };

            match result {
                Ok(outcome) => summary.completed.push((key.clone(), outcome)),
                Err(e) => {
                    reporter.failed(key, &e);
                    match options.on_failure {
                        FailurePolicy::Abort => return Err(e),
                        FailurePolicy::Continue => summary.failed.push((key.clone(), e)),
                    }
                }
            }
        }

        Ok(summary)
    }
}
