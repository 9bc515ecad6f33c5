//! `studio render`: render a saved project.

use super::common;
use crate::cli::{ExitCode, OutputArgs, OutputFormat};
use crate::formatters::format_output;
use crate::report::RenderReport;
use anyhow::{Context, Result};
use std::path::Path;
use studio_core::StudioConfig;
use studio_session::Session;

/// Links and renders a snapshot once.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or an output cannot
/// be written. A failed render is reported through the exit code.
pub async fn run(
    snapshot: &Path,
    config: StudioConfig,
    output: &OutputArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let vfs = common::load_snapshot(snapshot).await?;
    let mut session = Session::builder()
        .config(config)
        .vfs(vfs)
        .build()
        .context("failed to create session")?;

    let outcome = session.refresh().await;
    common::write_outputs(&session, output).await?;

    let report = RenderReport::new(&session, &outcome);
    println!("{}", format_output(&report, format)?);
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::RENDER_FAILED
    })
}
