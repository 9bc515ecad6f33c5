//! Builder pattern for constructing virtual filesystems.
//!
//! Provides a fluent API for seeding a project, mostly useful for tests and
//! starter templates.
//!
//! # Examples
//!
//! ```
//! use studio_vfs::VfsBuilder;
//!
//! let vfs = VfsBuilder::new()
//!     .add_file("/App.jsx", "export default function App() { return null; }")
//!     .add_file("/components/Button.jsx", "export default () => null;")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(vfs.file_count(), 2);
//! assert!(vfs.pending_changes().is_empty());
//! ```

use crate::vfs::Vfs;
use studio_core::{Error, Result};

/// Builder for constructing a virtual filesystem.
///
/// Errors from individual additions are collected and the first one is
/// returned from [`VfsBuilder::build`].
#[derive(Debug, Default)]
pub struct VfsBuilder {
    vfs: Vfs,
    errors: Vec<Error>,
}

impl VfsBuilder {
    /// Creates a new empty VFS builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            vfs: Vfs::new(),
            errors: Vec::new(),
        }
    }

    /// Adds a file, creating missing ancestor directories.
    #[must_use]
    pub fn add_file(mut self, path: impl AsRef<str>, content: impl Into<String>) -> Self {
        if let Err(e) = self.vfs.write(path, content) {
            self.errors.push(e);
        }
        self
    }

    /// Adds multiple files at once.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::VfsBuilder;
    ///
    /// let vfs = VfsBuilder::new()
    ///     .add_files([("/a.js", "a"), ("/b.js", "b")])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(vfs.file_count(), 2);
    /// ```
    #[must_use]
    pub fn add_files<P, C, I>(mut self, files: I) -> Self
    where
        P: AsRef<str>,
        C: Into<String>,
        I: IntoIterator<Item = (P, C)>,
    {
        for (path, content) in files {
            self = self.add_file(path, content);
        }
        self
    }

    /// Adds an (empty) directory.
    #[must_use]
    pub fn add_dir(mut self, path: impl AsRef<str>) -> Self {
        if let Err(e) = self.vfs.create_dir(path) {
            self.errors.push(e);
        }
        self
    }

    /// Builds the VFS with an empty change journal.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while adding entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_vfs::VfsBuilder;
    ///
    /// let result = VfsBuilder::new()
    ///     .add_file("relative.js", "")
    ///     .build();
    /// assert!(result.is_err());
    /// ```
    pub fn build(self) -> Result<Vfs> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        let mut vfs = self.vfs;
        vfs.clear_changes();
        Ok(vfs)
    }
}
