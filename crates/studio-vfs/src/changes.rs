//! Change journal for VFS mutations.
//!
//! Every mutation records the paths it touched. Successive changes to the
//! same path within one journal window are coalesced, so consumers see the
//! net effect of a batch instead of every intermediate step:
//!
//! | earlier    | later     | result     |
//! |------------|-----------|------------|
//! | `Created`  | `Modified`| `Created`  |
//! | `Created`  | `Deleted` | (dropped)  |
//! | `Modified` | `Deleted` | `Deleted`  |
//! | `Deleted`  | `Created` | `Modified` |
//!
//! # Examples
//!
//! ```
//! use studio_vfs::{ChangeKind, ChangeSet, VfsPath};
//!
//! let path = VfsPath::parse("/App.jsx").unwrap();
//! let mut changes = ChangeSet::new();
//! changes.record(path.clone(), ChangeKind::Created);
//! changes.record(path.clone(), ChangeKind::Modified);
//! assert_eq!(changes.kind_of(&path), Some(ChangeKind::Created));
//!
//! changes.record(path.clone(), ChangeKind::Deleted);
//! assert!(changes.is_empty());
//! ```

use crate::path::VfsPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of change applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The entry did not exist before.
    Created,
    /// The entry's content changed.
    Modified,
    /// The entry no longer exists.
    Deleted,
}

impl ChangeKind {
    /// Combines an earlier change with a later one.
    ///
    /// Returns `None` when the two cancel out.
    #[must_use]
    pub const fn coalesce(earlier: Self, later: Self) -> Option<Self> {
        match (earlier, later) {
            (Self::Created, Self::Deleted) => None,
            (Self::Created, Self::Created | Self::Modified) => Some(Self::Created),
            (Self::Modified | Self::Deleted, Self::Deleted) => Some(Self::Deleted),
            (Self::Deleted, Self::Created | Self::Modified)
            | (Self::Modified, Self::Created | Self::Modified) => Some(Self::Modified),
        }
    }
}

/// Coalesced set of path changes.
///
/// Besides per-path changes, a set may be flagged as a reset, which means
/// the whole tree was replaced (for example by restoring a snapshot) and any
/// cached state derived from it must be discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: BTreeMap<VfsPath, ChangeKind>,
    reset: bool,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a change set flagged as a full reset.
    #[must_use]
    pub fn reset() -> Self {
        Self {
            changes: BTreeMap::new(),
            reset: true,
        }
    }

    /// Records a change, coalescing with any earlier change to the same path.
    pub fn record(&mut self, path: VfsPath, kind: ChangeKind) {
        match self.changes.get(&path).copied() {
            None => {
                self.changes.insert(path, kind);
            }
            Some(earlier) => match ChangeKind::coalesce(earlier, kind) {
                Some(net) => {
                    self.changes.insert(path, net);
                }
                None => {
                    self.changes.remove(&path);
                }
            },
        }
    }

    /// Folds a later change set into this one.
    pub fn merge(&mut self, later: Self) {
        self.reset |= later.reset;
        for (path, kind) in later.changes {
            self.record(path, kind);
        }
    }

    /// Marks the set as a full reset.
    pub const fn mark_reset(&mut self) {
        self.reset = true;
    }

    /// Returns `true` if the whole tree was replaced.
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        self.reset
    }

    /// Returns `true` if there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && !self.reset
    }

    /// Number of changed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterates changes in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&VfsPath, ChangeKind)> {
        self.changes.iter().map(|(path, kind)| (path, *kind))
    }

    /// Iterates changed paths in order.
    pub fn paths(&self) -> impl Iterator<Item = &VfsPath> {
        self.changes.keys()
    }

    /// Returns `true` if the path has a net change.
    #[must_use]
    pub fn contains(&self, path: &VfsPath) -> bool {
        self.changes.contains_key(path)
    }

    /// Returns the net change for a path.
    #[must_use]
    pub fn kind_of(&self, path: &VfsPath) -> Option<ChangeKind> {
        self.changes.get(path).copied()
    }
}
