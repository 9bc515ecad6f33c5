//! Helpers shared by the commands.

use crate::cli::{ExitCode, OutputArgs, OutputFormat};
use crate::formatters::format_output;
use crate::report::SessionReport;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studio_core::{ExecutionMode, StudioConfig};
use studio_session::Session;
use studio_tools::CommandProvider;
use studio_vfs::{Vfs, VfsSnapshot};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Loads the configuration and applies command-line overrides.
///
/// With no explicit path, the default location is used if the file exists.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// resulting configuration does not validate.
pub fn load_config(
    path: Option<&Path>,
    mode: Option<ExecutionMode>,
    max_steps: Option<usize>,
) -> Result<StudioConfig> {
    let mut config = match path {
        Some(path) => StudioConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => StudioConfig::load_or_default().context("failed to load default config")?,
    };
    if let Some(mode) = mode {
        config.executor.mode = mode;
    }
    if max_steps.is_some() {
        config.executor.max_steps = max_steps;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Reads a project snapshot into a VFS.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a consistent
/// snapshot.
pub async fn load_snapshot(path: &Path) -> Result<Vfs> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot = VfsSnapshot::from_json(&json)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
    Vfs::from_snapshot(&snapshot)
        .with_context(|| format!("snapshot {} is inconsistent", path.display()))
}

/// Creates a session, optionally starting from a snapshot.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or the session cannot
/// be built.
pub async fn open_session(
    config: StudioConfig,
    provider: Arc<dyn CommandProvider>,
    from: Option<&Path>,
) -> Result<Session> {
    let mut builder = Session::builder().config(config).provider(provider);
    if let Some(path) = from {
        builder = builder.vfs(load_snapshot(path).await?);
    }
    builder.build().context("failed to create session")
}

/// Runs one turn per prompt, writes outputs and prints the report.
///
/// # Errors
///
/// Returns an error if a turn fails or an output cannot be written.
pub async fn drive(
    mut session: Session,
    prompts: &[String],
    output: &OutputArgs,
    format: OutputFormat,
) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    let mut turns = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        let summary = session
            .run_turn(prompt, &cancel)
            .await
            .with_context(|| format!("turn {} failed", session.turns()))?;
        turns.push(summary);
    }
    if turns.is_empty() {
        session.refresh().await;
    }

    write_outputs(&session, output).await?;
    let report = SessionReport::new(&session, turns);
    println!("{}", format_output(&report, format)?);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::RENDER_FAILED
    })
}

/// Writes the preview document and the project snapshot where requested.
///
/// Returns the files written.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub async fn write_outputs(session: &Session, output: &OutputArgs) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(path) = &output.out {
        if let Some(preview) = session.current_preview() {
            tokio::fs::write(path, &preview.document.html)
                .await
                .with_context(|| format!("failed to write preview to {}", path.display()))?;
            info!(path = %path.display(), revision = %preview.revision, "wrote preview document");
            written.push(path.clone());
        } else {
            warn!(path = %path.display(), "no preview was rendered; nothing written");
        }
    }

    if let Some(path) = &output.snapshot_out {
        let json = session
            .snapshot()
            .to_json()
            .context("failed to serialize snapshot")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "wrote project snapshot");
        written.push(path.clone());
    }

    Ok(written)
}
