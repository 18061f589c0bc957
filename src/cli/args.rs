//! CLI argument definitions using clap derive

use crate::target::Selection;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Codex Stage - stage prebuilt Codex CLI binaries for the desktop app
///
/// Downloads per-platform Codex packages from the npm registry into
/// resources/bin/<platform>-<arch>/ and launches the app against them.
#[derive(Parser, Debug)]
#[command(name = "codex-stage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CODEX_STAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application root (defaults to current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download and stage CLI binaries
    Stage(StageArgs),

    /// Launch the app with the staged host binary
    Dev(DevArgs),
}

impl Commands {
    /// Tag used to prefix diagnostics from this command
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Stage(_) => "stage",
            Self::Dev(_) => "dev",
        }
    }

    /// Tag for raw arguments that failed to parse; `stage` unless `dev` was named
    pub fn tag_for_args<I, S>(args: I) -> &'static str
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter()
            .skip(1)
            .find_map(|arg| match arg.as_ref() {
                "stage" => Some("stage"),
                "dev" => Some("dev"),
                _ => None,
            })
            .unwrap_or("stage")
    }
}

/// Arguments for the stage command
#[derive(Parser, Debug, Default)]
pub struct StageArgs {
    /// Stage every configured target
    #[arg(long)]
    pub all: bool,

    /// Stage the running machine's target
    #[arg(long)]
    pub host: bool,

    /// Target platform (darwin, linux, win32 or "host")
    #[arg(long)]
    pub platform: Option<String>,

    /// Target architecture (x64, arm64 or "host")
    #[arg(long)]
    pub arch: Option<String>,

    /// Re-stage even when the staged copy is current
    #[arg(short, long)]
    pub force: bool,

    /// Base Codex version (defaults to the targets file)
    #[arg(long)]
    pub version: Option<String>,

    /// Keep staging remaining targets after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Registry base URL
    #[arg(long)]
    pub registry: Option<String>,
}

impl StageArgs {
    /// Selection flags as a [`Selection`]
    pub fn selection(&self) -> Selection {
        Selection {
            all: self.all,
            host: self.host,
            platform: self.platform.clone(),
            arch: self.arch.clone(),
        }
    }
}

/// Arguments for the dev command
#[derive(Parser, Debug, Default)]
pub struct DevArgs {
    /// Electron executable (overrides configuration)
    #[arg(long)]
    pub electron: Option<PathBuf>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}
