//! Codex Stage - prebuilt Codex CLI staging for the desktop app
//!
//! Downloads per-platform Codex packages from the npm registry, installs
//! the `codex` and `rg` binaries under `resources/bin/<platform>-<arch>/`,
//! and launches the app in development against the staged host binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod registry;
pub mod stage;
pub mod target;
pub mod ui;

pub use error::{StageError, StageResult};
