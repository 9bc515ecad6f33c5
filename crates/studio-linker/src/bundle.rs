//! Linked bundles.

use crate::graph::ModuleGraph;
use crate::record::ModuleRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use studio_core::{Diagnostic, Revision};
use studio_vfs::{Vfs, VfsPath};

/// A stylesheet imported by a bundled module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stylesheet {
    /// Stylesheet path.
    pub path: VfsPath,
    /// Stylesheet text at link time.
    pub content: String,
}

/// Everything the preview needs to run one revision of the project.
///
/// A bundle is immutable once built. `modules` is in load order: every
/// module appears after the modules it imports, except along a recorded
/// cycle, and the entry (when it linked) comes last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Entry module path.
    pub entry: VfsPath,
    /// VFS revision the bundle was linked from.
    pub revision: Revision,
    /// Successfully linked modules in load order.
    pub modules: Vec<Arc<ModuleRecord>>,
    /// Reachable modules that failed to transform or link.
    pub failed: BTreeMap<VfsPath, Vec<Diagnostic>>,
    /// Import cycles found while ordering, each listed from the module the
    /// cycle re-enters.
    pub cycles: Vec<Vec<VfsPath>>,
    /// Stylesheets in first-import order.
    pub styles: Vec<Stylesheet>,
}

impl Bundle {
    pub(crate) fn assemble(entry: &VfsPath, graph: &ModuleGraph, vfs: &Vfs) -> Self {
        let mut walk = OrderWalk {
            graph,
            visited: BTreeSet::new(),
            stack: Vec::new(),
            order: Vec::new(),
            cycles: Vec::new(),
        };
        if graph.record(entry).is_some() {
            walk.visit(entry);
        }
        let OrderWalk { order, cycles, .. } = walk;

        let failed = graph
            .failures()
            .map(|(path, diagnostics)| (path.clone(), diagnostics.to_vec()))
            .collect();

        let mut seen = BTreeSet::new();
        let styles = order
            .iter()
            .flat_map(|record| record.stylesheets())
            .filter(|path| seen.insert((*path).clone()))
            .filter_map(|path| {
                vfs.read(path).ok().map(|content| Stylesheet {
                    path: path.clone(),
                    content: content.to_string(),
                })
            })
            .collect();

        Self {
            entry: entry.clone(),
            revision: vfs.revision(),
            modules: order,
            failed,
            cycles,
            styles,
        }
    }

    /// Returns `true` if the entry module linked and can be executed.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.entry_record().is_some()
    }

    /// Record of the entry module.
    #[must_use]
    pub fn entry_record(&self) -> Option<&Arc<ModuleRecord>> {
        self.modules.last().filter(|record| record.path == self.entry)
    }

    /// Module paths in load order.
    #[must_use]
    pub fn load_order(&self) -> Vec<&VfsPath> {
        self.modules.iter().map(|record| &record.path).collect()
    }

    /// Looks up a bundled module.
    #[must_use]
    pub fn module(&self, path: &VfsPath) -> Option<&Arc<ModuleRecord>> {
        self.modules.iter().find(|record| &record.path == path)
    }

    /// Returns `true` if the module is reachable but failed.
    #[must_use]
    pub fn is_failed(&self, path: &VfsPath) -> bool {
        self.failed.contains_key(path)
    }

    /// All diagnostics, grouped by module in path order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.failed.values().flatten()
    }

    /// Returns `true` if any reachable module failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Post-order walk over linked records.
struct OrderWalk<'g> {
    graph: &'g ModuleGraph,
    visited: BTreeSet<VfsPath>,
    stack: Vec<VfsPath>,
    order: Vec<Arc<ModuleRecord>>,
    cycles: Vec<Vec<VfsPath>>,
}

impl OrderWalk<'_> {
    fn visit(&mut self, path: &VfsPath) {
        let graph = self.graph;
        let Some(record) = graph.record(path) else {
            return;
        };
        self.visited.insert(path.clone());
        self.stack.push(path.clone());

        for dependency in record.module_dependencies() {
            if let Some(pos) = self.stack.iter().position(|p| p == dependency) {
                self.cycles.push(self.stack[pos..].to_vec());
            } else if !self.visited.contains(dependency) {
                self.visit(dependency);
            }
        }

        self.stack.pop();
        self.order.push(Arc::clone(record));
    }
}
