//! Session statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use studio_core::SessionId;
use studio_linker::LinkerStats;
use studio_preview::RenderStats;

/// Snapshot of everything a session has done so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    /// Session the numbers belong to.
    pub session_id: SessionId,
    /// When the session was created (UTC).
    pub started_at: DateTime<Utc>,
    /// Turns run.
    pub turns: u32,
    /// Turns cut short by the step ceiling or cancellation.
    pub halted_turns: u32,
    /// Commands that applied.
    pub commands_applied: u64,
    /// Commands that failed.
    pub commands_failed: u64,
    /// Linker counters.
    pub linker: LinkerStats,
    /// Renderer counters.
    pub render: RenderStats,
}

impl SessionStats {
    /// Fraction of commands that applied.
    ///
    /// Returns `None` if no command ran yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn command_success_rate(&self) -> Option<f64> {
        let total = self.commands_applied + self.commands_failed;
        if total == 0 {
            return None;
        }
        Some(self.commands_applied as f64 / total as f64)
    }

    /// Fraction of linked modules carried over from a previous rebuild.
    ///
    /// Returns `None` if nothing was linked yet.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn module_reuse_rate(&self) -> Option<f64> {
        let total = self.linker.modules_linked + self.linker.modules_reused;
        if total == 0 {
            return None;
        }
        Some(self.linker.modules_reused as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> SessionStats {
        SessionStats {
            session_id: SessionId::new(),
            started_at: Utc::now(),
            turns: 0,
            halted_turns: 0,
            commands_applied: 0,
            commands_failed: 0,
            linker: LinkerStats::default(),
            render: RenderStats::default(),
        }
    }

    #[test]
    fn test_rates_empty() {
        let stats = stats();
        assert_eq!(stats.command_success_rate(), None);
        assert_eq!(stats.module_reuse_rate(), None);
    }

    #[test]
    fn test_rates() {
        let stats = SessionStats {
            commands_applied: 3,
            commands_failed: 1,
            linker: LinkerStats {
                rebuilds: 2,
                full_rebuilds: 1,
                modules_linked: 1,
                modules_reused: 3,
            },
            ..stats()
        };
        assert_eq!(stats.command_success_rate(), Some(0.75));
        assert_eq!(stats.module_reuse_rate(), Some(0.75));
    }
}
