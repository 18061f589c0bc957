//! Stage cache decision
//!
//! A target directory is fresh when its manifest records the expected
//! package version and triple and both binaries are still on disk.

use super::manifest::StageManifest;
use crate::target::BinaryNames;
use std::fmt;
use std::path::{Path, PathBuf};

/// Inputs to the freshness check for one target
#[derive(Debug, Clone)]
pub struct CacheCheck<'a> {
    pub manifest_path: &'a Path,
    pub package_version: &'a str,
    pub target_triple: &'a str,
    pub destination: &'a Path,
    pub binaries: BinaryNames,
    pub force: bool,
}

/// Why a target must be (re-)staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    Forced,
    NoManifest,
    VersionChanged { recorded: String },
    TripleChanged { recorded: String },
    MissingBinary(PathBuf),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => write!(f, "forced"),
            Self::NoManifest => write!(f, "no manifest"),
            Self::VersionChanged { recorded } => write!(f, "staged version is {recorded}"),
            Self::TripleChanged { recorded } => write!(f, "staged triple is {recorded}"),
            Self::MissingBinary(path) => write!(f, "missing {}", path.display()),
        }
    }
}

/// Outcome of the freshness check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// Staged content is current; skip
    Fresh,
    /// Staging required
    Stale(StaleReason),
}

/// Decide whether a target's staged content can be reused
pub async fn check(input: &CacheCheck<'_>) -> CacheDecision {
    if input.force {
        return CacheDecision::Stale(StaleReason::Forced);
    }

    let Some(manifest) = StageManifest::read(input.manifest_path).await else {
        return CacheDecision::Stale(StaleReason::NoManifest);
    };

    if manifest.package_version != input.package_version {
        return CacheDecision::Stale(StaleReason::VersionChanged {
            recorded: manifest.package_version,
        });
    }

    if manifest.target_triple != input.target_triple {
        return CacheDecision::Stale(StaleReason::TripleChanged {
            recorded: manifest.target_triple,
        });
    }

    for name in [input.binaries.codex, input.binaries.ripgrep] {
        let path = input.destination.join(name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return CacheDecision::Stale(StaleReason::MissingBinary(path));
        }
    }

    CacheDecision::Fresh
}
