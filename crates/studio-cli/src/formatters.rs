//! Output formatters for CLI commands.
//!
//! JSON output is the serialized report; pretty output is a colored summary
//! meant for a terminal.

use crate::cli::OutputFormat;
use crate::report::{PreviewInfo, RenderReport, SessionReport};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use studio_core::Diagnostic;
use studio_session::{RenderStatus, TurnSummary};
use studio_tools::TurnHalt;

/// Reports that have a human-readable rendition.
pub trait PrettyPrint {
    /// Renders the report for a terminal.
    fn pretty(&self) -> String;
}

/// Formats a report in the requested format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_output<T: Serialize + PrettyPrint>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
        OutputFormat::Pretty => Ok(data.pretty()),
    }
}

impl PrettyPrint for SessionReport {
    fn pretty(&self) -> String {
        let mut out = format!("{} {}\n", "Session".bold(), self.session_id);
        for turn in &self.turns {
            push_turn(&mut out, turn);
        }
        match &self.preview {
            Some(preview) => push_preview(&mut out, preview),
            None => out.push_str(&format!("{}\n", "No preview rendered".red().bold())),
        }
        out.push_str(&format!(
            "{} {} ({} turn(s), {} command(s) applied, {} failed)",
            "Files:".bold(),
            self.files.len(),
            self.stats.turns,
            self.stats.commands_applied,
            self.stats.commands_failed
        ));
        out
    }
}

impl PrettyPrint for RenderReport {
    fn pretty(&self) -> String {
        let mut out = format!(
            "{} {} ({} files)\n",
            "Rendered snapshot at".bold(),
            self.revision,
            self.files
        );
        push_status(&mut out, &self.render);
        push_diagnostics(&mut out, &self.diagnostics);
        if let Some(preview) = &self.preview {
            push_preview(&mut out, preview);
        }
        out.trim_end().to_string()
    }
}

fn push_turn(out: &mut String, turn: &TurnSummary) {
    let report = &turn.report;
    out.push_str(&format!(
        "{} [{}] {} applied, {} failed\n",
        format!("Turn {}", report.turn).bold(),
        report.provider,
        report.applied(),
        report.failed()
    ));
    for outcome in &report.outcomes {
        let mark = if outcome.response.ok {
            "✓".green()
        } else {
            "✗".red()
        };
        let first_line = outcome.response.message.lines().next().unwrap_or_default();
        out.push_str(&format!("  {mark} {}: {first_line}\n", outcome.command));
    }
    match &report.halted {
        Some(TurnHalt::StepLimit { limit, dropped }) => out.push_str(&format!(
            "  {}\n",
            format!("halted at the {limit}-step limit; {dropped} command(s) dropped").yellow()
        )),
        Some(TurnHalt::Cancelled { dropped }) => out.push_str(&format!(
            "  {}\n",
            format!("cancelled; {dropped} command(s) dropped").yellow()
        )),
        None => {}
    }
    push_status(out, &turn.render);
    push_diagnostics(
        out,
        &turn
            .diagnostics
            .iter()
            .filter(|d| d.kind != studio_core::ErrorKind::StepLimitExceeded)
            .filter(|d| d.kind != studio_core::ErrorKind::Cancelled)
            .cloned()
            .collect::<Vec<_>>(),
    );
}

fn push_status(out: &mut String, status: &RenderStatus) {
    let line = match status {
        RenderStatus::Skipped => "preview: unchanged project, no rebuild".dimmed().to_string(),
        RenderStatus::Rendered { digest } => {
            format!("preview: {} {}", "rendered".green(), short(digest).dimmed())
        }
        RenderStatus::Unchanged { digest } => {
            format!("preview: {} {}", "unchanged".cyan(), short(digest).dimmed())
        }
        RenderStatus::Failed => format!("preview: {}", "failed".red().bold()),
    };
    out.push_str(&format!("  {line}\n"));
}

fn push_diagnostics(out: &mut String, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        out.push_str(&format!("  {} {diagnostic}\n", "!".red().bold()));
    }
}

fn push_preview(out: &mut String, preview: &PreviewInfo) {
    out.push_str(&format!(
        "{} {} {} ({} module(s), sandbox \"{}\")\n",
        "Preview".bold(),
        preview.revision,
        short(&preview.digest).dimmed(),
        preview.modules_evaluated,
        preview.sandbox
    ));
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::{ErrorKind, Revision};

    fn report() -> RenderReport {
        RenderReport {
            revision: Revision::new(3),
            files: 2,
            render: RenderStatus::Failed,
            diagnostics: vec![Diagnostic::new(
                ErrorKind::UnresolvedImport,
                Some("/App.jsx".to_string()),
                "Cannot resolve './Missing' from /App.jsx",
            )],
            preview: None,
        }
    }

    #[test]
    fn test_json_format() {
        let output = format_output(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["render"]["status"], "failed");
        assert_eq!(value["diagnostics"][0]["kind"], "UnresolvedImport");
        assert_eq!(value["revision"], 3);
    }

    #[test]
    fn test_pretty_format() {
        colored::control::set_override(false);
        let output = format_output(&report(), OutputFormat::Pretty).unwrap();
        assert!(output.starts_with("Rendered snapshot at r3 (2 files)"));
        assert!(output.contains("preview: failed"));
        assert!(output.contains("! UnresolvedImport: Cannot resolve './Missing' from /App.jsx"));
    }

    #[test]
    fn test_short_digest() {
        assert_eq!(short("0123456789abcdef"), "0123456789ab");
        assert_eq!(short("abc"), "abc");
    }
}
