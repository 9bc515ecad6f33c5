//! `studio run`: replay a recorded turn script.

use super::common;
use crate::cli::{ExitCode, OutputFormat, SessionArgs};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use studio_core::StudioConfig;
use studio_tools::ScriptedProvider;
use tracing::debug;

/// Replays every turn of the script, one session turn per entry.
///
/// # Errors
///
/// Returns an error if the script cannot be read or parsed, or if the
/// session fails. A failed render is reported through the exit code.
pub async fn run(
    script: &Path,
    config: StudioConfig,
    args: &SessionArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let json = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("failed to read turn script {}", script.display()))?;
    let provider = ScriptedProvider::from_json(&json)
        .with_context(|| format!("failed to parse turn script {}", script.display()))?;
    let prompts = provider.prompts();
    debug!(turns = prompts.len(), "loaded turn script");

    let session = common::open_session(config, Arc::new(provider), args.from.as_deref()).await?;
    common::drive(session, &prompts, &args.output, format).await
}
