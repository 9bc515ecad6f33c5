//! Whole-state VFS serialization.
//!
//! A snapshot is a mapping from path to `{content, kind, lastModified}` and
//! is all an external store needs to persist a project. The root directory is
//! implicit and never serialized.
//!
//! # Examples
//!
//! ```
//! use studio_vfs::{Vfs, VfsSnapshot};
//!
//! let mut vfs = Vfs::new();
//! vfs.write("/App.jsx", "export default () => null;").unwrap();
//!
//! let json = vfs.snapshot().to_json().unwrap();
//! let restored = Vfs::from_snapshot(&VfsSnapshot::from_json(&json).unwrap()).unwrap();
//! assert_eq!(restored.read("/App.jsx").unwrap(), "export default () => null;");
//! ```

use crate::path::VfsPath;
use crate::vfs::{EntryKind, Vfs, VirtualFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use studio_core::{Error, Result, Revision};

/// One serialized entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    /// Text content (empty for directories).
    #[serde(default)]
    pub content: String,

    /// Entry kind.
    pub kind: EntryKind,

    /// Revision of the last mutation.
    #[serde(default)]
    pub last_modified: Revision,
}

/// Serializable image of a whole VFS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VfsSnapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl VfsSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any previous one at the same path.
    pub fn insert(&mut self, path: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(path.into(), entry);
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&SnapshotEntry> {
        self.entries.get(path)
    }

    /// Iterates entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Vfs {
    /// Captures the whole filesystem state.
    #[must_use]
    pub fn snapshot(&self) -> VfsSnapshot {
        let entries = self
            .entries()
            .filter(|(path, _)| !path.is_root())
            .map(|(path, entry)| {
                (
                    path.to_string(),
                    SnapshotEntry {
                        content: entry.content().to_string(),
                        kind: entry.kind(),
                        last_modified: entry.last_modified(),
                    },
                )
            })
            .collect();
        VfsSnapshot { entries }
    }

    /// Builds a filesystem from a snapshot.
    ///
    /// # Errors
    ///
    /// See [`Vfs::restore`].
    pub fn from_snapshot(snapshot: &VfsSnapshot) -> Result<Self> {
        let mut vfs = Self::new();
        vfs.restore(snapshot)?;
        vfs.clear_changes();
        Ok(vfs)
    }

    /// Replaces the whole filesystem state with a snapshot.
    ///
    /// Directories missing from the snapshot but implied by a deeper path are
    /// recreated. The revision counter never moves backwards: it becomes the
    /// larger of the next local revision and the newest revision in the
    /// snapshot. The change journal is flagged as a reset.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` for a malformed path,
    /// `Error::PathConflict` if two keys name the same normalized path,
    /// `Error::IsADirectory` if the snapshot stores a file at the root, or
    /// `Error::NotADirectory` if a path descends from a file. On error the
    /// filesystem is left unchanged.
    pub fn restore(&mut self, snapshot: &VfsSnapshot) -> Result<()> {
        let mut entries = BTreeMap::new();
        entries.insert(VfsPath::root(), VirtualFile::directory(Revision::ZERO));
        let mut newest = Revision::ZERO;

        for (raw, entry) in snapshot.iter() {
            let path = VfsPath::parse(raw)?;
            newest = newest.max(entry.last_modified);
            if path.is_root() {
                if entry.kind == EntryKind::File {
                    return Err(Error::IsADirectory {
                        path: path.to_string(),
                    });
                }
                continue;
            }
            if entries.contains_key(&path) {
                return Err(Error::PathConflict {
                    path: path.to_string(),
                });
            }
            let restored = match entry.kind {
                EntryKind::File => VirtualFile::file(entry.content.clone(), entry.last_modified),
                EntryKind::Directory => VirtualFile::directory(entry.last_modified),
            };
            entries.insert(path, restored);
        }

        let mut implied = Vec::new();
        for (path, entry) in &entries {
            for ancestor in path.ancestors() {
                match entries.get(&ancestor) {
                    Some(parent) if parent.is_file() => {
                        return Err(Error::NotADirectory {
                            path: ancestor.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => implied.push((ancestor, entry.last_modified())),
                }
            }
        }
        for (ancestor, revision) in implied {
            entries
                .entry(ancestor)
                .or_insert_with(|| VirtualFile::directory(revision));
        }

        let revision = self.revision().next().max(newest);
        tracing::debug!(
            entries = entries.len(),
            %revision,
            "restored vfs from snapshot"
        );
        self.replace_entries(entries, revision);
        Ok(())
    }
}
