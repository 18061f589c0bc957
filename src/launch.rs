//! Development launcher
//!
//! Finds the staged CLI for the running machine and starts the desktop app
//! with that binary on its search path.

use crate::config::{resolve_path, LaunchConfig};
use crate::error::{StageError, StageResult};
use crate::target::{BinaryNames, HostInfo};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Host keys the launcher knows how to run on
pub const SUPPORTED_HOSTS: &[&str] = &[
    "darwin-x64",
    "darwin-arm64",
    "linux-x64",
    "linux-arm64",
    "win32-x64",
];

/// Environment variable carrying the staged CLI path to the app
pub const CLI_PATH_VAR: &str = "CODEX_CLI_PATH";

/// Everything needed to spawn the app, computed up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub cli_path: PathBuf,
    /// Variables to set on top of the inherited environment
    pub env: Vec<(String, String)>,
}

/// Launches the app against a staged CLI
#[derive(Debug, Clone)]
pub struct Launcher {
    app_root: PathBuf,
    stage_root: PathBuf,
    config: LaunchConfig,
    host: HostInfo,
}

impl Launcher {
    /// Create a launcher for `app_root`, reading binaries from `stage_root`
    pub fn new(app_root: PathBuf, stage_root: PathBuf, config: LaunchConfig) -> Self {
        Self {
            app_root,
            stage_root,
            config,
            host: HostInfo::detect(),
        }
    }

    /// Override the detected host
    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    /// Key of the running machine, restricted to [`SUPPORTED_HOSTS`]
    pub fn host_key(&self) -> StageResult<String> {
        let key = self.host.target_key().map_err(|_| self.unsupported())?;
        if SUPPORTED_HOSTS.contains(&key.as_str()) {
            Ok(key)
        } else {
            Err(self.unsupported())
        }
    }

    fn unsupported(&self) -> StageError {
        StageError::UnsupportedHost(format!("{}/{}", self.host.platform(), self.host.arch))
    }

    /// Expected location of the staged CLI
    pub fn cli_path(&self) -> StageResult<PathBuf> {
        let key = self.host_key()?;
        let names = BinaryNames::for_platform(self.host.platform());
        Ok(resolve_path(&self.app_root, &self.stage_root)
            .join(key)
            .join(names.codex))
    }

    /// Build the launch plan, looking up inherited variables with `lookup`
    pub async fn plan<F>(&self, lookup: F) -> StageResult<LaunchPlan>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cli_path = self.cli_path()?;
        if !tokio::fs::try_exists(&cli_path).await.unwrap_or(false) {
            return Err(StageError::CliNotStaged(cli_path));
        }

        let env = child_env(
            &cli_path,
            self.host.platform() == "win32",
            &self.config,
            lookup,
        );

        Ok(LaunchPlan {
            program: resolve_path(&self.app_root, &self.config.electron),
            args: vec![".".to_string()],
            cwd: self.app_root.clone(),
            cli_path,
            env,
        })
    }

    /// Plan against the current process environment
    pub async fn plan_from_env(&self) -> StageResult<LaunchPlan> {
        self.plan(|key| std::env::var(key).ok()).await
    }

    /// Spawn the planned app with inherited stdio and wait for it.
    /// Returns the child's exit code (-1 when killed by a signal).
    pub async fn spawn(&self, plan: &LaunchPlan) -> StageResult<i32> {
        info!("Platform: {}, Arch: {}", self.host.platform(), self.host.arch);
        debug!("Executing: {} {}", plan.program.display(), plan.args.join(" "));

        let status = Command::new(&plan.program)
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| StageError::LaunchFailed {
                program: plan.program.display().to_string(),
                source: e,
            })?;

        Ok(status.code().unwrap_or(-1))
    }
}

/// Variables the app needs on top of the inherited environment.
///
/// Empty inherited values count as unset.
pub fn child_env<F>(
    cli_path: &Path,
    windows_host: bool,
    config: &LaunchConfig,
    lookup: F,
) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let separator = if windows_host { ";" } else { ":" };
    let bin_dir = cli_path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    let path = match lookup("PATH") {
        Some(existing) => format!("{bin_dir}{separator}{existing}"),
        None => bin_dir,
    };

    vec![
        (CLI_PATH_VAR.to_string(), cli_path.display().to_string()),
        ("PATH".to_string(), path),
        (
            "BUILD_FLAVOR".to_string(),
            lookup("BUILD_FLAVOR").unwrap_or_else(|| config.build_flavor.clone()),
        ),
        (
            "ELECTRON_RENDERER_URL".to_string(),
            lookup("ELECTRON_RENDERER_URL").unwrap_or_else(|| config.renderer_url.clone()),
        ),
    ]
}
