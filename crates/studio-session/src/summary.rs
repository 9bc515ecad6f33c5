//! What a turn produced.

use serde::Serialize;
use studio_core::{Diagnostic, Revision};
use studio_preview::RenderOutcome;
use studio_tools::TurnReport;

/// How the preview reacted to a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderStatus {
    /// The turn changed nothing, so no rebuild ran.
    Skipped,
    /// A new document replaced the running preview.
    Rendered {
        /// Digest of the new document
        digest: String,
    },
    /// The rebuild produced the document already running.
    Unchanged {
        /// Digest of the running document
        digest: String,
    },
    /// The render failed; the previous preview stays up.
    Failed,
}

impl From<&RenderOutcome> for RenderStatus {
    fn from(outcome: &RenderOutcome) -> Self {
        match outcome {
            RenderOutcome::Rendered(preview) => Self::Rendered {
                digest: preview.document.digest.clone(),
            },
            RenderOutcome::Unchanged(preview) => Self::Unchanged {
                digest: preview.document.digest.clone(),
            },
            RenderOutcome::Failed { .. } => Self::Failed,
        }
    }
}

/// Result of [`Session::run_turn`](crate::Session::run_turn).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnSummary {
    /// Commands executed during the turn.
    pub report: TurnReport,
    /// Coalesced VFS changes the turn left behind.
    pub changes: usize,
    /// VFS revision after the turn.
    pub revision: Revision,
    /// Preview reaction.
    pub render: RenderStatus,
    /// Halt, link and render diagnostics, in that order.
    pub diagnostics: Vec<Diagnostic>,
    /// Wall time for the turn, rebuild included.
    pub elapsed_ms: u64,
    /// The render outcome, when a rebuild ran.
    #[serde(skip)]
    pub outcome: Option<RenderOutcome>,
}

impl TurnSummary {
    /// Returns `true` unless the render failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self.render, RenderStatus::Failed)
    }

    /// Returns `true` if the turn ran to completion and nothing was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.report.is_complete() && self.diagnostics.is_empty()
    }

    /// Returns `true` if the turn published a new preview.
    #[must_use]
    pub const fn published(&self) -> bool {
        matches!(self.render, RenderStatus::Rendered { .. })
    }
}
