//! Stage command - download and stage CLI binaries

use crate::cli::args::StageArgs;
use crate::config::{resolve_path, FailurePolicy, RegistryConfig, Settings, TargetsFile};
use crate::error::{StageError, StageResult};
use crate::registry::RegistryClient;
use crate::stage::{
    resolve_version, InstallReport, Installer, StageOptions, StageReporter, Stager, StaleReason,
};
use crate::target::{resolve_target_keys, HostInfo};
use crate::ui::{self, TaskSpinner, UiContext};
use std::cell::RefCell;
use std::path::Path;
use tracing::debug;

/// Execute the stage command
pub async fn execute(args: StageArgs, settings: &Settings, app_root: &Path) -> StageResult<()> {
    let selection = args.selection();
    selection.validate()?;

    let targets_path = resolve_path(app_root, &settings.stage.targets_file);
    let targets = TargetsFile::load(&targets_path).await?;

    let keys = resolve_target_keys(&selection, &targets, &HostInfo::detect())?;
    let version = resolve_version(args.version.as_deref(), &targets)?;
    debug!("Staging {} target(s) at {}", keys.len(), version);

    let registry_config = registry_overrides(&settings.registry, &args);
    let options = StageOptions {
        force: args.force,
        on_failure: if args.keep_going {
            FailurePolicy::Continue
        } else {
            settings.stage.on_failure
        },
    };

    let stager = Stager::new(
        RegistryClient::from_config(&registry_config)?,
        Installer::new(&settings.stage.tar_command, &settings.stage.manifest_name),
        resolve_path(app_root, &settings.stage.root),
    );

    let ctx = UiContext::detect();
    if ctx.use_fancy_output() {
        ui::intro(&ctx, &format!("Staging {}@{}", registry_config.package, version));
    }
    let reporter = ConsoleReporter::new(&ctx, options.on_failure);

    let summary = stager
        .stage_all(&targets, &keys, &version, options, &reporter)
        .await?;
    let total = summary.total();
    let completed = summary.into_result()?;

    if ctx.use_fancy_output() {
        ui::outro_success(&ctx, &format!("{} of {} target(s) ready", completed.len(), total));
    }
    Ok(())
}

/// Apply `--registry` and `--timeout` on top of the configured registry
fn registry_overrides(config: &RegistryConfig, args: &StageArgs) -> RegistryConfig {
    let mut config = config.clone();
    if let Some(url) = &args.registry {
        config.url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    config
}

/// Reports per-target progress on the console
struct ConsoleReporter<'a> {
    ctx: &'a UiContext,
    spinner: RefCell<TaskSpinner>,
    /// Under abort the error itself is printed once by `main`
    detail_failures: bool,
}

impl<'a> ConsoleReporter<'a> {
    fn new(ctx: &'a UiContext, on_failure: FailurePolicy) -> Self {
        Self {
            ctx,
            spinner: RefCell::new(TaskSpinner::new(ctx)),
            detail_failures: on_failure == FailurePolicy::Continue,
        }
    }
}

impl StageReporter for ConsoleReporter<'_> {
    fn up_to_date(&self, key: &str, package_version: &str) {
        ui::step_ok(self.ctx, &format!("[stage] {key}: up to date ({package_version})"));
    }

    fn downloading(&self, key: &str, package: &str, package_version: &str, reason: &StaleReason) {
        debug!("{}: {}", key, reason);
        self.spinner
            .borrow_mut()
            .start(&format!("[stage] {key}: downloading {package}@{package_version}"));
    }

    fn staged(&self, key: &str, report: &InstallReport) {
        self.spinner.borrow_mut().stop(&format!(
            "[stage] {key}: staged {} and {}",
            report.binaries.codex, report.binaries.ripgrep
        ));
    }

    fn failed(&self, key: &str, error: &StageError) {
        let mut spinner = self.spinner.borrow_mut();
        if spinner.is_active() {
            spinner.stop_error(&format!("[stage] {key}: failed"));
        }
        if self.detail_failures {
            ui::step_error_detail(self.ctx, &format!("[stage] {key}"), &error.to_string());
        }
    }
}
