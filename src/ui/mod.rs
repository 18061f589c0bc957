//! Console output with automatic fallback to plain lines in CI
//!
//! Uses `cliclack` for spinners and log lines when attached to a terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use codex_stage::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "Staging Codex binaries");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Downloading @openai/codex@0.46.0-linux-x64");
//! spinner.stop("linux-x64: staged codex and rg");
//!
//! ui::outro_success(&ctx, "1 target(s) ready");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{intro, outro_success, step_error_detail, step_info, step_ok};
pub use progress::TaskSpinner;
