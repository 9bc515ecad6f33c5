//! Per-module link results.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_core::Revision;
use studio_transform::{ImportKind, TransformOutput};
use studio_vfs::VfsPath;

/// What an import specifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "snake_case")]
pub enum ImportTarget {
    /// A source module in the VFS.
    Module(VfsPath),
    /// A stylesheet in the VFS.
    Style(VfsPath),
    /// A package served from outside the VFS; the specifier is kept as written.
    External(String),
}

impl ImportTarget {
    /// Returns the VFS path for local targets.
    #[must_use]
    pub const fn local_path(&self) -> Option<&VfsPath> {
        match self {
            Self::Module(path) | Self::Style(path) => Some(path),
            Self::External(_) => None,
        }
    }

    /// Returns `true` for external packages.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

/// One resolved import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImport {
    /// Specifier as written.
    pub specifier: String,
    /// Declaration form.
    pub kind: ImportKind,
    /// Resolution result.
    pub target: ImportTarget,
}

/// A successfully transformed and linked module.
///
/// Records are shared behind `Arc`. A rebuild that does not invalidate a
/// module hands out the same allocation again, so callers can detect reuse
/// with [`Arc::ptr_eq`].
///
/// Importers of a module are tracked by the graph, not by the record; see
/// [`crate::ModuleGraph::dependents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Module path.
    pub path: VfsPath,
    /// Revision at which the source was last written.
    pub source_revision: Revision,
    /// Transform result, shared with the transform cache.
    pub output: Arc<TransformOutput>,
    /// Imports in source order, each with its resolution.
    pub resolved_imports: Vec<ResolvedImport>,
}

impl ModuleRecord {
    /// Executable code for the module.
    #[must_use]
    pub fn transformed_code(&self) -> &str {
        &self.output.code
    }

    /// Import specifiers in source order, as written.
    #[must_use]
    pub fn import_specifiers(&self) -> Vec<&str> {
        self.output.import_specifiers()
    }

    /// Local modules this module imports, in source order.
    pub fn module_dependencies(&self) -> impl Iterator<Item = &VfsPath> {
        self.resolved_imports.iter().filter_map(|import| match &import.target {
            ImportTarget::Module(path) => Some(path),
            _ => None,
        })
    }

    /// Stylesheets this module imports, in source order.
    pub fn stylesheets(&self) -> impl Iterator<Item = &VfsPath> {
        self.resolved_imports.iter().filter_map(|import| match &import.target {
            ImportTarget::Style(path) => Some(path),
            _ => None,
        })
    }

    /// Returns the resolution of a specifier.
    #[must_use]
    pub fn target_of(&self, specifier: &str) -> Option<&ImportTarget> {
        self.resolved_imports
            .iter()
            .find(|import| import.specifier == specifier)
            .map(|import| &import.target)
    }
}
