//! Reports printed by the commands.

use serde::Serialize;
use studio_core::{Diagnostic, Revision, SessionId};
use studio_preview::{Preview, RenderOutcome};
use studio_session::{RenderStatus, Session, SessionStats, TurnSummary};

/// The preview that ended up running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewInfo {
    /// Bundle revision.
    pub revision: Revision,
    /// Document digest.
    pub digest: String,
    /// Modules the sandbox evaluated.
    pub modules_evaluated: usize,
    /// Sandbox load time in microseconds.
    pub elapsed_us: u64,
    /// Iframe sandbox attribute the document must be hosted with.
    pub sandbox: String,
}

impl From<&Preview> for PreviewInfo {
    fn from(preview: &Preview) -> Self {
        Self {
            revision: preview.revision,
            digest: preview.document.digest.clone(),
            modules_evaluated: preview.report.modules_evaluated,
            elapsed_us: preview.report.elapsed_us,
            sandbox: preview.document.sandbox.clone(),
        }
    }
}

/// Result of `run` and `prompt`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Session identifier.
    pub session_id: SessionId,
    /// One summary per turn.
    pub turns: Vec<TurnSummary>,
    /// Running preview, if any render ever succeeded.
    pub preview: Option<PreviewInfo>,
    /// Files in the final project.
    pub files: Vec<String>,
    /// Session counters.
    pub stats: SessionStats,
}

impl SessionReport {
    /// Collects the report from a finished session.
    #[must_use]
    pub fn new(session: &Session, turns: Vec<TurnSummary>) -> Self {
        Self {
            session_id: session.id(),
            turns,
            preview: session.current_preview().as_deref().map(PreviewInfo::from),
            files: session.vfs().file_paths().iter().map(ToString::to_string).collect(),
            stats: session.stats(),
        }
    }

    /// Returns `true` if a preview is running and the last turn did not
    /// break it.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.preview.is_some() && self.turns.last().is_none_or(TurnSummary::is_success)
    }
}

/// Result of `render`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderReport {
    /// VFS revision that was rendered.
    pub revision: Revision,
    /// Files in the project.
    pub files: usize,
    /// How the render went.
    pub render: RenderStatus,
    /// Link and render diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// The preview, on success.
    pub preview: Option<PreviewInfo>,
}

impl RenderReport {
    /// Collects the report after a render.
    #[must_use]
    pub fn new(session: &Session, outcome: &RenderOutcome) -> Self {
        let mut diagnostics: Vec<Diagnostic> = session
            .bundle()
            .map(|bundle| bundle.diagnostics().cloned().collect())
            .unwrap_or_default();
        for diagnostic in outcome.diagnostics() {
            if !diagnostics.contains(diagnostic) {
                diagnostics.push(diagnostic.clone());
            }
        }
        Self {
            revision: session.vfs().revision(),
            files: session.vfs().file_count(),
            render: RenderStatus::from(outcome),
            diagnostics,
            preview: outcome.preview().map(|preview| PreviewInfo::from(preview.as_ref())),
        }
    }

    /// Returns `true` unless the render failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self.render, RenderStatus::Failed)
    }
}
