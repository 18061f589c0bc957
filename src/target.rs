//! Target resolution
//!
//! Turns the selection flags (`--all`, `--host`, `--platform`/`--arch`) into
//! an ordered list of target keys validated against the targets table.

use crate::config::TargetsFile;
use crate::error::{StageError, StageResult};

const SELECTION_USAGE: &str =
    "Specify --all, --host, or both --platform=<platform> and --arch=<arch>.";

/// Placeholder value that selects the running machine
const HOST: &str = "host";

/// Selection flags as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub all: bool,
    pub host: bool,
    pub platform: Option<String>,
    pub arch: Option<String>,
}

impl Selection {
    /// Select every configured target
    pub fn all() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    /// Select the running machine's target
    pub fn host() -> Self {
        Self {
            host: true,
            ..Self::default()
        }
    }

    /// Select one explicit platform/arch pair
    pub fn explicit(platform: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
            arch: Some(arch.into()),
            ..Self::default()
        }
    }
}

/// Platform and architecture of a machine, in Rust's naming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub arch: String,
}

impl HostInfo {
    /// Describe the running machine
    pub fn detect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Create host info from explicit values
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Platform name in target-key vocabulary
    pub fn platform(&self) -> &str {
        match self.os.as_str() {
            "macos" => "darwin",
            "windows" => "win32",
            other => other,
        }
    }

    /// Architecture name in target-key vocabulary
    ///
    /// Only `x64` and `arm64` are recognized.
    pub fn target_arch(&self) -> StageResult<&'static str> {
        match self.arch.as_str() {
            "x86_64" => Ok("x64"),
            "aarch64" => Ok("arm64"),
            other => Err(StageError::UnsupportedHost(other.to_string())),
        }
    }

    /// Target key for this machine, e.g. `linux-x64`
    pub fn target_key(&self) -> StageResult<String> {
        Ok(format!("{}-{}", self.platform(), self.target_arch()?))
    }
}

fn is_host(value: Option<&str>) -> bool {
    value == Some(HOST)
}

enum Mode<'a> {
    All,
    Host,
    Explicit(&'a str, &'a str),
}

fn selection_mode(selection: &Selection) -> StageResult<Mode<'_>> {
    let platform = selection.platform.as_deref();
    let arch = selection.arch.as_deref();

    // A `host` placeholder on either side wins over the other value
    let host_named = is_host(platform) || is_host(arch);
    let concrete_named = platform.is_some_and(|p| p != HOST) || arch.is_some_and(|a| a != HOST);

    let host_mode = selection.host || host_named;
    let explicit_mode = concrete_named && !host_named;

    let modes = [selection.all, host_mode, explicit_mode]
        .iter()
        .filter(|m| **m)
        .count();

    if modes != 1 {
        return Err(StageError::Argument(SELECTION_USAGE.to_string()));
    }

    if selection.all {
        Ok(Mode::All)
    } else if host_mode {
        Ok(Mode::Host)
    } else {
        match (platform, arch) {
            (Some(p), Some(a)) => Ok(Mode::Explicit(p, a)),
            _ => Err(StageError::Argument(SELECTION_USAGE.to_string())),
        }
    }
}

impl Selection {
    /// Check that exactly one selection mode is present
    pub fn validate(&self) -> StageResult<()> {
        selection_mode(self).map(|_| ())
    }
}

/// Resolve selection flags into target keys, in configuration order
pub fn resolve_target_keys(
    selection: &Selection,
    targets: &TargetsFile,
    host: &HostInfo,
) -> StageResult<Vec<String>> {
    let key = match selection_mode(selection)? {
        Mode::All => return Ok(targets.keys().map(str::to_string).collect()),
        Mode::Host => host.target_key()?,
        Mode::Explicit(platform, arch) => format!("{platform}-{arch}"),
    };

    if targets.get(&key).is_none() {
        return Err(StageError::UnsupportedTarget(key));
    }

    Ok(vec![key])
}

/// File names of the two staged executables for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryNames {
    pub codex: &'static str,
    pub ripgrep: &'static str,
}

impl BinaryNames {
    /// Names for a Windows or non-Windows target
    pub fn for_windows(windows: bool) -> Self {
        if windows {
            Self {
                codex: "codex.exe",
                ripgrep: "rg.exe",
            }
        } else {
            Self {
                codex: "codex",
                ripgrep: "rg",
            }
        }
    }

    /// Names for a target-key platform (`win32`, `linux`, ...)
    pub fn for_platform(platform: &str) -> Self {
        Self::for_windows(platform == "win32")
    }
}
