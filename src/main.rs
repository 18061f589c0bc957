//! Codex Stage - binary staging and dev launcher
//!
//! CLI entry point that dispatches to subcommands.

use clap::error::ErrorKind;
use clap::Parser;
use codex_stage::cli::{Cli, Commands, LogFormat};
use codex_stage::config::ConfigManager;
use codex_stage::error::{StageError, StageResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return parse_failure(&e),
    };
    let tag = cli.command.tag();

    init_logging(cli.verbose, cli.log_format);

    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            report(tag, &e);
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_logging(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("codex_stage=warn"),
        1 => EnvFilter::new("codex_stage=info"),
        _ => EnvFilter::new("codex_stage=debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).without_time().init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Help and version go to stdout; usage errors are tagged like any other failure
fn parse_failure(error: &clap::Error) -> ExitCode {
    if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        let _ = error.print();
        return ExitCode::SUCCESS;
    }

    let rendered = error.render().to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    report(Commands::tag_for_args(std::env::args()), &StageError::Argument(message));
    ExitCode::FAILURE
}

fn report(tag: &str, error: &StageError) {
    use console::style;

    eprintln!("{} {}", style(format!("[{tag}]")).red().bold(), error);
    if let Some(hint) = error.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
}

async fn run(cli: Cli) -> StageResult<i32> {
    let config_manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let settings = config_manager.load().await?;

    let app_root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()
            .map_err(|e| StageError::io("getting current directory", e))?,
    };
    debug!("Application root: {}", app_root.display());

    match cli.command {
        Commands::Stage(args) => codex_stage::cli::commands::stage(args, &settings, &app_root)
            .await
            .map(|()| 0),
        Commands::Dev(args) => codex_stage::cli::commands::dev(args, &settings, &app_root).await,
    }
}
