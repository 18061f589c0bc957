//! Error types for codex-stage
//!
//! All modules use `StageResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for staging operations
pub type StageResult<T> = Result<T, StageError>;

/// All errors that can occur while staging or launching
#[derive(Error, Debug)]
pub enum StageError {
    // Selection errors
    #[error("{0}")]
    Argument(String),

    #[error("Unsupported host architecture: {0}")]
    UnsupportedHost(String),

    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    // Registry errors
    #[error("Request failed ({}): {url}{}", status_label(.status), reason_suffix(.reason))]
    Request {
        status: Option<u16>,
        url: String,
        reason: Option<String>,
    },

    #[error("Too many redirects (limit {limit}) while fetching {url}")]
    TooManyRedirects { url: String, limit: u32 },

    #[error("No tarball found for {package}@{version}")]
    NotFound { package: String, version: String },

    // Installer errors
    #[error(
        "Failed to extract tarball with tar (stdout: {}; stderr: {})",
        one_line(.stdout),
        one_line(.stderr)
    )]
    Extraction { stdout: String, stderr: String },

    #[error("Missing {kind} directory in tarball: {}", .path.display())]
    MissingDirectory { kind: &'static str, path: PathBuf },

    #[error("Missing staged {kind} binary: {}", .path.display())]
    MissingBinary { kind: &'static str, path: PathBuf },

    #[error("{failed} of {total} target(s) failed: {}", .keys.join(", "))]
    TargetsFailed {
        failed: usize,
        total: usize,
        keys: Vec<String>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Targets file not found: {0}")]
    TargetsFileNotFound(PathBuf),

    // Launcher errors
    #[error("CLI not found at: {}", .0.display())]
    CliNotStaged(PathBuf),

    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "network".to_string(), |code| code.to_string())
}

/// Collapse captured process output onto a single line
fn one_line(output: &str) -> String {
    let joined = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.is_empty() {
        "<empty>".to_string()
    } else {
        joined
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

impl StageError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a request error for a non-2xx status
    pub fn status(status: u16, url: impl Into<String>) -> Self {
        Self::Request {
            status: Some(status),
            url: url.into(),
            reason: None,
        }
    }

    /// Create a request error for a transport-level failure
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Request {
            status: None,
            url: url.into(),
            reason: Some(reason.into()),
        }
    }

    /// Whether the error belongs to the request family (HTTP or network)
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::TooManyRedirects { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Argument(_) => Some("Run: codex-stage stage --help"),
            Self::UnsupportedTarget(_) => {
                Some("Add the target to the targets file or pick a configured one")
            }
            Self::CliNotStaged(_) => Some("Run: codex-stage stage --host"),
            Self::TargetsFileNotFound(_) => Some("Pass --root or set stage.targets_file"),
            Self::Extraction { .. } => Some("Ensure a working `tar` is on PATH"),
            _ => None,
        }
    }
}
