//! Render statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of preview renderer activity.
///
/// # Examples
///
/// ```
/// use studio_preview::RenderStats;
///
/// let stats = RenderStats::new(10, 2, 3, 1500);
/// assert_eq!(stats.success_rate(), Some(0.8));
/// assert_eq!(stats.reuse_rate(), Some(0.3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Render requests received.
    pub total_renders: u32,

    /// Renders that ended without publishing a preview.
    pub failed_renders: u32,

    /// Renders skipped because the document was unchanged.
    pub reused_documents: u32,

    /// Average sandbox load time in microseconds.
    pub avg_render_time_us: u64,

    /// When the snapshot was taken (UTC).
    pub captured_at: DateTime<Utc>,
}

impl RenderStats {
    /// Creates a snapshot stamped with the current time.
    #[must_use]
    pub fn new(
        total_renders: u32,
        failed_renders: u32,
        reused_documents: u32,
        avg_render_time_us: u64,
    ) -> Self {
        Self {
            total_renders,
            failed_renders,
            reused_documents,
            avg_render_time_us,
            captured_at: Utc::now(),
        }
    }

    /// Fraction of renders that did not fail.
    ///
    /// Returns `None` if nothing was rendered yet.
    #[must_use]
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_renders == 0 {
            return None;
        }
        let succeeded = self.total_renders.saturating_sub(self.failed_renders);
        Some(f64::from(succeeded) / f64::from(self.total_renders))
    }

    /// Fraction of renders answered with the current document.
    ///
    /// Returns `None` if nothing was rendered yet.
    #[must_use]
    pub fn reuse_rate(&self) -> Option<f64> {
        if self.total_renders == 0 {
            return None;
        }
        Some(f64::from(self.reused_documents) / f64::from(self.total_renders))
    }
}

impl Default for RenderStats {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}
