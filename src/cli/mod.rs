//! Command line interface for the updater release pipeline.
//!
//! This module provides the CLI for pipeline operations, with argument
//! parsing, configuration resolution, command execution, and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig, SigningArgs, ToolArgs};
pub use output::OutputManager;

use crate::error::{CliError, Result};
use crate::updater::FileSettings;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute(args).await
}

/// Resolve configuration and run one parsed command.
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let file = FileSettings::discover(&args.project_root, args.config.as_deref()).await?;
    let settings = args.settings_builder().file_settings(file).build()?;
    let config = RuntimeConfig::new(&args, settings);
    config.verbose_println(&format!(
        "Project root: {}",
        config.settings().project_root().display()
    ))?;

    match &args.command {
        Command::SyncVersion => commands::sync_version::execute(&config).await,
        Command::Keygen { password, .. } => {
            commands::keygen::execute(&config, password.as_ref()).await
        }
        Command::CheckKey { .. } => commands::check_key::execute(&config).await,
        Command::SignUpdater {
            platform, target, ..
        } => commands::sign_updater::execute(&config, *platform, target).await,
        Command::Collect {
            platform, target, ..
        } => commands::collect::execute(&config, *platform, target).await,
        Command::Merge { dirs, output, .. } => {
            commands::merge::execute(&config, dirs, output.as_deref()).await
        }
        Command::Flatten => commands::flatten::execute(&config).await,
        Command::Release {
            version, no_push, ..
        } => commands::release::execute(&config, version, !*no_push).await,
    }
}
