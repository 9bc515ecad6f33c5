//! Command implementations.
//!
//! Each command loads the configuration, drives a session and prints a
//! report in the requested format.

pub mod common;
pub mod prompt;
pub mod render;
pub mod run;

use crate::cli::{Cli, Commands, ExitCode};
use anyhow::Result;

/// Routes a parsed command line to its handler.
///
/// # Errors
///
/// Returns an error if the configuration or an input file cannot be
/// loaded, an output file cannot be written, or a turn fails.
pub async fn execute(cli: Cli) -> Result<ExitCode> {
    let config = common::load_config(cli.config.as_deref(), cli.mode, cli.max_steps)?;
    match cli.command {
        Commands::Run { script, session } => run::run(&script, config, &session, cli.format).await,
        Commands::Prompt { prompts, session } => {
            prompt::run(&prompts, config, &session, cli.format).await
        }
        Commands::Render { snapshot, output } => {
            render::run(&snapshot, config, &output, cli.format).await
        }
    }
}
