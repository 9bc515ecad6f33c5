//! `studio prompt`: scaffold components with the offline provider.

use super::common;
use crate::cli::{ExitCode, OutputFormat, SessionArgs};
use anyhow::Result;
use std::sync::Arc;
use studio_core::StudioConfig;
use studio_tools::MockProvider;

/// Runs one mock-provider turn per prompt.
///
/// # Errors
///
/// Returns an error if the starting snapshot cannot be loaded or an output
/// cannot be written.
pub async fn run(
    prompts: &[String],
    config: StudioConfig,
    args: &SessionArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let session =
        common::open_session(config, Arc::new(MockProvider::new()), args.from.as_deref()).await?;
    common::drive(session, prompts, &args.output, format).await
}
