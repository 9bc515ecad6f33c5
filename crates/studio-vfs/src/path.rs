//! Validated virtual filesystem paths.
//!
//! # Examples
//!
//! ```
//! use studio_vfs::VfsPath;
//!
//! let path = VfsPath::parse("/components//Button.jsx").unwrap();
//! assert_eq!(path.as_str(), "/components/Button.jsx");
//! assert_eq!(path.file_name(), Some("Button.jsx"));
//!
//! // Invalid paths are rejected
//! assert!(VfsPath::parse("components/Button.jsx").is_err());
//! assert!(VfsPath::parse("/components/../App.jsx").is_err());
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use studio_core::{Error, Result};

/// A validated, normalized virtual filesystem path.
///
/// `VfsPath` always uses Unix conventions:
/// - Starts with '/' (absolute paths only)
/// - Never contains '..' segments
/// - No empty or '.' segments and no trailing slash (except the root)
///
/// Because normalization happens at construction, two `VfsPath` values are
/// equal exactly when they address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VfsPath(String);

impl VfsPath {
    /// Returns the root path (`/`).
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parses and normalizes a path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the path is empty, relative, contains
    /// a '..' segment, or contains a backslash or control character.
    pub fn parse(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        let invalid = |reason: &str| Error::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("path is empty"));
        }
        if !raw.starts_with('/') {
            return Err(invalid("path must be absolute (start with '/')"));
        }
        if raw.contains('\\') {
            return Err(invalid("path must use '/' separators"));
        }
        if raw.chars().any(char::is_control) {
            return Err(invalid("path contains control characters"));
        }

        let mut normalized = String::with_capacity(raw.len());
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(invalid("path must not contain '..' segments")),
                name => {
                    normalized.push('/');
                    normalized.push_str(name);
                }
            }
        }

        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Returns the parent directory, or `None` for the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::VfsPath;
    ///
    /// let path = VfsPath::parse("/components/Button.jsx").unwrap();
    /// assert_eq!(path.parent().unwrap().as_str(), "/components");
    /// assert_eq!(path.parent().unwrap().parent().unwrap().as_str(), "/");
    /// assert!(VfsPath::root().parent().is_none());
    /// ```
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        self.0.rfind('/').map(|pos| {
            if pos == 0 {
                Self::root()
            } else {
                Self(self.0[..pos].to_string())
            }
        })
    }

    /// Returns the last segment, or `None` for the root.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Returns the extension of the last segment including the dot.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        name.rfind('.')
            .filter(|&pos| pos > 0)
            .map(|pos| &name[pos..])
    }

    /// Appends a single segment.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the resulting path is invalid.
    pub fn join(&self, segment: &str) -> Result<Self> {
        if self.is_root() {
            Self::parse(format!("/{segment}"))
        } else {
            Self::parse(format!("{}/{segment}", self.0))
        }
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::VfsPath;
    ///
    /// let dir = VfsPath::parse("/components").unwrap();
    /// let file = VfsPath::parse("/components/ui/Button.jsx").unwrap();
    /// let sibling = VfsPath::parse("/components-old/Button.jsx").unwrap();
    ///
    /// assert!(dir.is_ancestor_of(&file));
    /// assert!(!dir.is_ancestor_of(&sibling));
    /// assert!(!dir.is_ancestor_of(&dir));
    /// ```
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .0
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns all strict ancestors from the root down, excluding `self`.
    #[must_use]
    pub fn ancestors(&self) -> Vec<Self> {
        let mut chain = Vec::new();
        let mut current = self.parent();
        while let Some(dir) = current {
            current = dir.parent();
            chain.push(dir);
        }
        chain.reverse();
        chain
    }

    /// Moves this path from under `from` to under `to`.
    ///
    /// Returns `None` if `self` is neither `from` nor a descendant of it.
    #[must_use]
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        if self == from {
            return Some(to.clone());
        }
        if !from.is_ancestor_of(self) {
            return None;
        }
        let rest = if from.is_root() {
            &self.0[1..]
        } else {
            &self.0[from.0.len() + 1..]
        };
        if to.is_root() {
            Some(Self(format!("/{rest}")))
        } else {
            Some(Self(format!("{}/{rest}", to.0)))
        }
    }

    /// Number of segments below the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count()
        }
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Ordering and hashing of `VfsPath` match those of the inner string, which
// lets maps keyed by `VfsPath` be range-queried with plain prefixes.
impl Borrow<str> for VfsPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for VfsPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VfsPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
