//! Strong domain types for Component Studio.
//!
//! # Examples
//!
//! ```
//! use studio_core::Revision;
//!
//! let first = Revision::ZERO.next();
//! assert!(first > Revision::ZERO);
//! assert_eq!(first.get(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Monotonic revision counter.
///
/// Revisions stamp VFS entries and bundles. They are never derived from the
/// wall clock, so two runs of the same command sequence produce the same
/// revisions.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// The revision before any mutation.
    pub const ZERO: Self = Self(0);

    /// Creates a revision from a raw counter value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw counter value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the following revision.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Session identifier (newtype over UUID v4).
///
/// # Examples
///
/// ```
/// use studio_core::SessionId;
///
/// let a = SessionId::new();
/// let b = SessionId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_ordering() {
        let r1 = Revision::new(1);
        let r2 = r1.next();
        assert!(r2 > r1);
        assert_eq!(r2.get(), 2);
    }

    #[test]
    fn test_revision_display() {
        assert_eq!(Revision::new(7).to_string(), "r7");
    }

    #[test]
    fn test_revision_serializes_as_number() {
        let json = serde_json::to_string(&Revision::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_revision_saturates() {
        assert_eq!(Revision::new(u64::MAX).next().get(), u64::MAX);
    }

    #[test]
    fn test_session_id_display_roundtrip() {
        let id = SessionId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
    }
}
