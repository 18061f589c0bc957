//! Dev command - launch the app against the staged host binary

use crate::cli::args::DevArgs;
use crate::config::Settings;
use crate::error::StageResult;
use crate::launch::Launcher;
use crate::ui::{self, UiContext};
use std::path::Path;

/// Execute the dev command, returning the app's exit code
pub async fn execute(args: DevArgs, settings: &Settings, app_root: &Path) -> StageResult<i32> {
    let mut launch = settings.launch.clone();
    if let Some(electron) = args.electron {
        launch.electron = electron;
    }

    let launcher = Launcher::new(app_root.to_path_buf(), settings.stage.root.clone(), launch);
    let plan = launcher.plan_from_env().await?;

    let ctx = UiContext::detect();
    ui::step_info(&ctx, &format!("[dev] CLI Path: {}", plan.cli_path.display()));

    launcher.spawn(&plan).await
}
