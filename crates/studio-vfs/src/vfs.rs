//! Virtual filesystem implementation.
//!
//! Entries live in a single ordered map keyed by normalized path. There is no
//! parent/child pointer structure: a directory's children are the keys that
//! sit directly below it, so moving a subtree is a re-keying of its entries.
//!
//! # Examples
//!
//! ```
//! use studio_vfs::Vfs;
//!
//! let mut vfs = Vfs::new();
//! vfs.write("/components/Button.jsx", "export default () => null;").unwrap();
//! vfs.rename("/components", "/ui").unwrap();
//!
//! assert!(vfs.exists("/ui/Button.jsx"));
//! assert!(!vfs.exists("/components"));
//! ```

use crate::changes::{ChangeKind, ChangeSet};
use crate::path::VfsPath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use studio_core::{Error, Result, Revision};

/// Kind of a VFS entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Text file.
    File,
    /// Directory.
    Directory,
}

/// A single VFS entry.
///
/// Directories carry empty content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    kind: EntryKind,
    content: String,
    last_modified: Revision,
}

impl VirtualFile {
    pub(crate) fn file(content: impl Into<String>, revision: Revision) -> Self {
        Self {
            kind: EntryKind::File,
            content: content.into(),
            last_modified: revision,
        }
    }

    pub(crate) const fn directory(revision: Revision) -> Self {
        Self {
            kind: EntryKind::Directory,
            content: String::new(),
            last_modified: revision,
        }
    }

    /// Returns the entry kind.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the text content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the revision of the last mutation touching this entry.
    #[must_use]
    pub const fn last_modified(&self) -> Revision {
        self.last_modified
    }

    /// Returns `true` for files.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    /// Returns `true` for directories.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

/// A child listed by [`Vfs::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Full path of the child.
    pub path: VfsPath,
    /// Kind of the child.
    pub kind: EntryKind,
}

/// An in-memory virtual filesystem.
///
/// Every mutating operation validates its whole effect before touching any
/// entry, so it either fully succeeds or leaves the filesystem unchanged.
/// Each successful mutation advances the revision counter exactly once and
/// stamps every entry it touched with the new revision.
///
/// The root directory (`/`) always exists and cannot be removed.
///
/// # Examples
///
/// ```
/// use studio_vfs::Vfs;
///
/// let mut vfs = Vfs::new();
/// vfs.write("/App.jsx", "export default function App() {}").unwrap();
///
/// let err = vfs.rename("/App.jsx", "/App.jsx").unwrap_err();
/// assert!(err.is_conflict());
/// assert_eq!(vfs.file_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Vfs {
    entries: BTreeMap<VfsPath, VirtualFile>,
    revision: Revision,
    journal: ChangeSet,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    /// Creates an empty filesystem containing only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(VfsPath::root(), VirtualFile::directory(Revision::ZERO));
        Self {
            entries,
            revision: Revision::ZERO,
            journal: ChangeSet::new(),
        }
    }

    /// Returns the current revision.
    #[must_use]
    pub const fn revision(&self) -> Revision {
        self.revision
    }

    /// Reads a file's content.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if nothing exists at the path,
    /// `Error::IsADirectory` if it is a directory, or `Error::InvalidPath`.
    pub fn read(&self, path: impl AsRef<str>) -> Result<&str> {
        let path = VfsPath::parse(path)?;
        match self.entries.get(&path) {
            Some(entry) if entry.is_file() => Ok(entry.content()),
            Some(_) => Err(Error::IsADirectory {
                path: path.to_string(),
            }),
            None => Err(Error::PathNotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Writes a file, creating it and any missing ancestor directories.
    ///
    /// Writing identical content to an existing file is a no-op and does not
    /// advance the revision.
    ///
    /// # Errors
    ///
    /// Returns `Error::IsADirectory` if the path names a directory,
    /// `Error::NotADirectory` if an ancestor is a file, or
    /// `Error::InvalidPath`.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::Vfs;
    ///
    /// let mut vfs = Vfs::new();
    /// vfs.write("/a/b/c.js", "export {}").unwrap();
    /// assert!(vfs.is_dir("/a"));
    /// assert!(vfs.is_dir("/a/b"));
    ///
    /// // Files cannot act as directories
    /// assert!(vfs.write("/a/b/c.js/d.js", "").is_err());
    /// ```
    pub fn write(&mut self, path: impl AsRef<str>, content: impl Into<String>) -> Result<()> {
        let path = VfsPath::parse(path)?;
        let content = content.into();
        let previous = self.entries.get(&path);

        match previous {
            Some(entry) if entry.is_dir() => {
                return Err(Error::IsADirectory {
                    path: path.to_string(),
                });
            }
            Some(entry) if entry.content() == content => return Ok(()),
            _ => {}
        }
        let existed = previous.is_some();
        self.check_ancestors(&path)?;

        let revision = self.bump();
        self.create_missing_ancestors(&path, revision);
        self.entries
            .insert(path.clone(), VirtualFile::file(content, revision));
        let kind = if existed {
            ChangeKind::Modified
        } else {
            ChangeKind::Created
        };
        tracing::trace!(path = %path, ?kind, %revision, "vfs write");
        self.journal.record(path, kind);
        Ok(())
    }

    /// Creates a new file.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathConflict` if anything exists at the path, plus
    /// the errors of [`Vfs::write`].
    pub fn create_file(&mut self, path: impl AsRef<str>, content: impl Into<String>) -> Result<()> {
        let path = VfsPath::parse(path)?;
        if self.entries.contains_key(&path) {
            return Err(Error::PathConflict {
                path: path.to_string(),
            });
        }
        self.write(&path, content)
    }

    /// Creates a directory and any missing ancestors.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathConflict` if anything exists at the path,
    /// `Error::NotADirectory` if an ancestor is a file, or
    /// `Error::InvalidPath`.
    pub fn create_dir(&mut self, path: impl AsRef<str>) -> Result<()> {
        let path = VfsPath::parse(path)?;
        if self.entries.contains_key(&path) {
            return Err(Error::PathConflict {
                path: path.to_string(),
            });
        }
        self.check_ancestors(&path)?;

        let revision = self.bump();
        self.create_missing_ancestors(&path, revision);
        self.entries
            .insert(path.clone(), VirtualFile::directory(revision));
        self.journal.record(path, ChangeKind::Created);
        Ok(())
    }

    /// Deletes an entry and, for directories, every descendant.
    ///
    /// Returns the removed paths in path order.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound` if nothing exists at the path, or
    /// `Error::InvalidPath` for the root or a malformed path.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::Vfs;
    ///
    /// let mut vfs = Vfs::new();
    /// vfs.write("/components/Button.jsx", "").unwrap();
    /// vfs.write("/components/forms/Input.jsx", "").unwrap();
    ///
    /// let removed = vfs.delete("/components").unwrap();
    /// assert_eq!(removed.len(), 4);
    /// assert!(vfs.read("/components/forms/Input.jsx").unwrap_err().is_not_found());
    /// ```
    pub fn delete(&mut self, path: impl AsRef<str>) -> Result<Vec<VfsPath>> {
        let path = VfsPath::parse(path)?;
        if path.is_root() {
            return Err(Error::InvalidPath {
                path: path.to_string(),
                reason: "the root directory cannot be deleted".to_string(),
            });
        }
        if !self.entries.contains_key(&path) {
            return Err(Error::PathNotFound {
                path: path.to_string(),
            });
        }

        let mut removed = vec![path.clone()];
        removed.extend(self.descendants(&path));

        self.bump();
        for victim in &removed {
            self.entries.remove(victim);
            self.journal.record(victim.clone(), ChangeKind::Deleted);
        }
        tracing::trace!(path = %path, count = removed.len(), "vfs delete");
        Ok(removed)
    }

    /// Renames or moves an entry together with its whole subtree.
    ///
    /// Missing ancestors of the destination are created. Returns the moved
    /// `(old, new)` path pairs in old-path order.
    ///
    /// # Errors
    ///
    /// Checked in this order, before anything is mutated:
    /// - `Error::PathNotFound` if `from` does not exist
    /// - `Error::PathConflict` if `to` exists (including `to == from`)
    /// - `Error::CyclicMove` if `to` lies inside `from`
    /// - `Error::NotADirectory` if an ancestor of `to` is a file
    /// - `Error::InvalidPath` for malformed paths or moving the root
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::Vfs;
    ///
    /// let mut vfs = Vfs::new();
    /// vfs.write("/components/Button.jsx", "").unwrap();
    ///
    /// let err = vfs.rename("/components", "/components/nested").unwrap_err();
    /// assert!(err.is_cyclic_move());
    /// assert!(vfs.exists("/components/Button.jsx"));
    /// ```
    pub fn rename(
        &mut self,
        from: impl AsRef<str>,
        to: impl AsRef<str>,
    ) -> Result<Vec<(VfsPath, VfsPath)>> {
        let from = VfsPath::parse(from)?;
        let to = VfsPath::parse(to)?;

        if from.is_root() {
            return Err(Error::InvalidPath {
                path: from.to_string(),
                reason: "the root directory cannot be moved".to_string(),
            });
        }
        if !self.entries.contains_key(&from) {
            return Err(Error::PathNotFound {
                path: from.to_string(),
            });
        }
        if from == to || self.entries.contains_key(&to) {
            return Err(Error::PathConflict {
                path: to.to_string(),
            });
        }
        if from.is_ancestor_of(&to) {
            return Err(Error::CyclicMove {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.check_ancestors(&to)?;

        let mut moved = vec![from.clone()];
        moved.extend(self.descendants(&from));
        let pairs: Vec<(VfsPath, VfsPath)> = moved
            .into_iter()
            .filter_map(|old| old.rebase(&from, &to).map(|new| (old, new)))
            .collect();

        let revision = self.bump();
        self.create_missing_ancestors(&to, revision);
        for (old, new) in &pairs {
            if let Some(mut entry) = self.entries.remove(old) {
                entry.last_modified = revision;
                self.entries.insert(new.clone(), entry);
            }
            self.journal.record(old.clone(), ChangeKind::Deleted);
            self.journal.record(new.clone(), ChangeKind::Created);
        }
        tracing::trace!(from = %from, to = %to, count = pairs.len(), "vfs rename");
        Ok(pairs)
    }

    /// Lists the direct children of a directory in path order.
    ///
    /// # Errors
    ///
    /// Returns `Error::PathNotFound`, `Error::NotADirectory`, or
    /// `Error::InvalidPath`.
    pub fn list(&self, dir: impl AsRef<str>) -> Result<Vec<DirEntry>> {
        let dir = VfsPath::parse(dir)?;
        match self.entries.get(&dir) {
            None => {
                return Err(Error::PathNotFound {
                    path: dir.to_string(),
                });
            }
            Some(entry) if entry.is_file() => {
                return Err(Error::NotADirectory {
                    path: dir.to_string(),
                });
            }
            Some(_) => {}
        }

        let child_depth = dir.depth() + 1;
        Ok(self
            .subtree(&dir)
            .filter(|(path, _)| path.depth() == child_depth)
            .map(|(path, entry)| DirEntry {
                path: path.clone(),
                kind: entry.kind(),
            })
            .collect())
    }

    /// Returns `true` if an entry exists at the path.
    ///
    /// Malformed paths never exist.
    #[must_use]
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        self.get(path).is_some()
    }

    /// Returns `true` if a file exists at the path.
    #[must_use]
    pub fn is_file(&self, path: impl AsRef<str>) -> bool {
        self.get(path).is_some_and(VirtualFile::is_file)
    }

    /// Returns `true` if a directory exists at the path.
    #[must_use]
    pub fn is_dir(&self, path: impl AsRef<str>) -> bool {
        self.get(path).is_some_and(VirtualFile::is_dir)
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, path: impl AsRef<str>) -> Option<&VirtualFile> {
        VfsPath::parse(path)
            .ok()
            .and_then(|path| self.entries.get(&path))
    }

    /// Iterates over all files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&VfsPath, &VirtualFile)> {
        self.entries.iter().filter(|(_, entry)| entry.is_file())
    }

    /// Iterates over all entries, including the root, in path order.
    pub fn entries(&self) -> impl Iterator<Item = (&VfsPath, &VirtualFile)> {
        self.entries.iter()
    }

    /// Returns all file paths in order.
    #[must_use]
    pub fn file_paths(&self) -> Vec<VfsPath> {
        self.files().map(|(path, _)| path.clone()).collect()
    }

    /// Number of files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Returns and clears the change journal.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.journal)
    }

    /// Returns the changes recorded since the last [`Vfs::take_changes`].
    #[must_use]
    pub const fn pending_changes(&self) -> &ChangeSet {
        &self.journal
    }

    /// Runs several mutations as one atomic step.
    ///
    /// The closure operates on a staged copy; the copy replaces `self` only
    /// if the closure succeeds.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, leaving `self` untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::Vfs;
    ///
    /// let mut vfs = Vfs::new();
    /// let result = vfs.transaction(|tx| {
    ///     tx.write("/a.js", "a")?;
    ///     tx.read("/missing.js").map(|_| ())
    /// });
    /// assert!(result.is_err());
    /// assert!(!vfs.exists("/a.js"));
    /// ```
    pub fn transaction<T>(&mut self, apply: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut staged = self.clone();
        let value = apply(&mut staged)?;
        *self = staged;
        Ok(value)
    }

    pub(crate) fn replace_entries(
        &mut self,
        entries: BTreeMap<VfsPath, VirtualFile>,
        revision: Revision,
    ) {
        self.entries = entries;
        self.revision = revision;
        self.journal.mark_reset();
    }

    pub(crate) fn clear_changes(&mut self) {
        self.journal = ChangeSet::new();
    }

    fn bump(&mut self) -> Revision {
        self.revision = self.revision.next();
        self.revision
    }

    fn check_ancestors(&self, path: &VfsPath) -> Result<()> {
        for ancestor in path.ancestors() {
            if self.entries.get(&ancestor).is_some_and(VirtualFile::is_file) {
                return Err(Error::NotADirectory {
                    path: ancestor.to_string(),
                });
            }
        }
        Ok(())
    }

    fn create_missing_ancestors(&mut self, path: &VfsPath, revision: Revision) {
        for ancestor in path.ancestors() {
            if !self.entries.contains_key(&ancestor) {
                self.entries
                    .insert(ancestor.clone(), VirtualFile::directory(revision));
                self.journal.record(ancestor, ChangeKind::Created);
            }
        }
    }

    fn subtree<'a>(
        &'a self,
        dir: &'a VfsPath,
    ) -> impl Iterator<Item = (&'a VfsPath, &'a VirtualFile)> + 'a {
        let prefix = if dir.is_root() {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        self.entries
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(move |(path, _)| path.as_str().starts_with(prefix.as_str()))
            .filter(move |(path, _)| dir.is_ancestor_of(path))
    }

    fn descendants(&self, dir: &VfsPath) -> Vec<VfsPath> {
        self.subtree(dir).map(|(path, _)| path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.write("/App.jsx", "import Button from '@/components/Button';")
            .unwrap();
        vfs.write("/components/Button.jsx", "export default () => null;")
            .unwrap();
        vfs.write("/components/forms/Input.jsx", "export default () => null;")
            .unwrap();
        vfs.take_changes();
        vfs
    }

    fn listing(vfs: &Vfs, dir: &str) -> Vec<String> {
        vfs.list(dir)
            .unwrap()
            .into_iter()
            .map(|entry| entry.path.to_string())
            .collect()
    }

    #[test]
    fn test_new_has_root_only() {
        let vfs = Vfs::new();
        assert!(vfs.is_dir("/"));
        assert_eq!(vfs.file_count(), 0);
        assert_eq!(vfs.revision(), Revision::ZERO);
    }

    #[test]
    fn test_write_then_read() {
        let mut vfs = Vfs::new();
        vfs.write("/a.js", "hello").unwrap();
        assert_eq!(vfs.read("/a.js").unwrap(), "hello");
    }

    #[test]
    fn test_write_stamps_revision() {
        let mut vfs = Vfs::new();
        vfs.write("/a.js", "1").unwrap();
        let first = vfs.get("/a.js").unwrap().last_modified();
        vfs.write("/a.js", "2").unwrap();
        let second = vfs.get("/a.js").unwrap().last_modified();
        assert!(second > first);
        assert_eq!(vfs.revision(), second);
    }

    #[test]
    fn test_identical_write_is_noop() {
        let mut vfs = Vfs::new();
        vfs.write("/a.js", "same").unwrap();
        let revision = vfs.revision();
        vfs.take_changes();
        vfs.write("/a.js", "same").unwrap();
        assert_eq!(vfs.revision(), revision);
        assert!(vfs.pending_changes().is_empty());
    }

    #[test]
    fn test_read_missing_and_directory() {
        let vfs = sample();
        assert!(vfs.read("/nope.jsx").unwrap_err().is_not_found());
        let err = vfs.read("/components").unwrap_err();
        assert!(matches!(err, Error::IsADirectory { .. }));
    }

    #[test]
    fn test_write_over_directory_fails() {
        let mut vfs = sample();
        assert!(vfs.write("/components", "x").is_err());
        assert!(vfs.write("/", "x").is_err());
    }

    #[test]
    fn test_write_under_file_fails_unchanged() {
        let mut vfs = sample();
        let revision = vfs.revision();
        let err = vfs.write("/App.jsx/child.js", "x").unwrap_err();
        assert!(matches!(err, Error::NotADirectory { ref path } if path == "/App.jsx"));
        assert_eq!(vfs.revision(), revision);
        assert!(vfs.pending_changes().is_empty());
    }

    #[test]
    fn test_create_file_conflict() {
        let mut vfs = sample();
        let err = vfs.create_file("/App.jsx", "").unwrap_err();
        assert!(err.is_conflict());
        assert!(vfs.read("/App.jsx").unwrap().contains("Button"));
    }

    #[test]
    fn test_create_dir() {
        let mut vfs = Vfs::new();
        vfs.create_dir("/hooks/internal").unwrap();
        assert!(vfs.is_dir("/hooks"));
        assert!(vfs.is_dir("/hooks/internal"));
        assert!(vfs.create_dir("/hooks").unwrap_err().is_conflict());
    }

    #[test]
    fn test_delete_file() {
        let mut vfs = sample();
        let removed = vfs.delete("/App.jsx").unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!vfs.exists("/App.jsx"));
    }

    #[test]
    fn test_delete_directory_cascades() {
        let mut vfs = sample();
        vfs.write("/components-old.jsx", "kept").unwrap();
        vfs.delete("/components").unwrap();
        assert!(!vfs.exists("/components/Button.jsx"));
        assert!(!vfs.exists("/components/forms"));
        assert!(vfs.exists("/components-old.jsx"));
        assert!(vfs.exists("/App.jsx"));
    }

    #[test]
    fn test_delete_root_rejected() {
        let mut vfs = sample();
        assert!(vfs.delete("/").unwrap_err().is_invalid_path());
    }

    #[test]
    fn test_delete_missing() {
        let mut vfs = sample();
        assert!(vfs.delete("/ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_file() {
        let mut vfs = sample();
        let pairs = vfs
            .rename("/components/Button.jsx", "/components/PrimaryButton.jsx")
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(vfs.exists("/components/PrimaryButton.jsx"));
        assert!(!vfs.exists("/components/Button.jsx"));
    }

    #[test]
    fn test_rename_directory_moves_subtree() {
        let mut vfs = sample();
        vfs.rename("/components", "/src/ui").unwrap();
        assert!(vfs.is_dir("/src"));
        assert_eq!(
            vfs.read("/src/ui/forms/Input.jsx").unwrap(),
            "export default () => null;"
        );
        assert!(!vfs.exists("/components"));
    }

    #[test]
    fn test_rename_conflict_leaves_state() {
        let mut vfs = sample();
        let before: Vec<_> = vfs
            .entries()
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        let err = vfs
            .rename("/components/Button.jsx", "/App.jsx")
            .unwrap_err();
        assert!(err.is_conflict());
        let after: Vec<_> = vfs
            .entries()
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rename_into_own_subtree() {
        let mut vfs = sample();
        let err = vfs.rename("/components", "/components/forms/x").unwrap_err();
        assert!(err.is_cyclic_move());
    }

    #[test]
    fn test_rename_missing_source() {
        let mut vfs = sample();
        assert!(vfs.rename("/ghost", "/x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_journal() {
        let mut vfs = sample();
        vfs.rename("/App.jsx", "/Main.jsx").unwrap();
        let changes = vfs.take_changes();
        let app = VfsPath::parse("/App.jsx").unwrap();
        let main = VfsPath::parse("/Main.jsx").unwrap();
        assert_eq!(changes.kind_of(&app), Some(ChangeKind::Deleted));
        assert_eq!(changes.kind_of(&main), Some(ChangeKind::Created));
    }

    #[test]
    fn test_list_direct_children_only() {
        let vfs = sample();
        assert_eq!(listing(&vfs, "/"), vec!["/App.jsx", "/components"]);
        assert_eq!(
            listing(&vfs, "/components"),
            vec!["/components/Button.jsx", "/components/forms"]
        );
    }

    #[test]
    fn test_list_errors() {
        let vfs = sample();
        assert!(vfs.list("/missing").unwrap_err().is_not_found());
        let err = vfs.list("/App.jsx").unwrap_err();
        assert!(matches!(err, Error::NotADirectory { .. }));
    }

    #[test]
    fn test_list_ignores_prefix_siblings() {
        let mut vfs = Vfs::new();
        vfs.write("/a/x.js", "").unwrap();
        vfs.write("/a-b/y.js", "").unwrap();
        vfs.write("/a.js", "").unwrap();
        assert_eq!(listing(&vfs, "/a"), vec!["/a/x.js"]);
    }

    #[test]
    fn test_transaction_commits() {
        let mut vfs = Vfs::new();
        vfs.transaction(|tx| {
            tx.write("/a.js", "a")?;
            tx.write("/b.js", "b")
        })
        .unwrap();
        assert_eq!(vfs.file_count(), 2);
    }

    #[test]
    fn test_invalid_path_never_exists() {
        let vfs = sample();
        assert!(!vfs.exists("App.jsx"));
        assert!(!vfs.exists("/components/../App.jsx"));
    }
}
