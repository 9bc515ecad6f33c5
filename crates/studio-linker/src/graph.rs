//! Module graph and invalidation.
//!
//! The graph holds one entry per linked module: either a [`ModuleRecord`] or
//! the diagnostics that kept it from linking. Reverse edges live in a
//! separate index so records stay immutable and shareable; a module's
//! importers are looked up with [`ModuleGraph::dependents`].
//!
//! Besides real edges the graph remembers which candidate paths each module
//! tried without finding a file. Creating one of those paths can change a
//! resolution, so that importer is invalidated along with the new file.

use crate::record::ModuleRecord;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use studio_core::Diagnostic;
use studio_vfs::{ChangeSet, VfsPath};

/// Outgoing edges of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Links {
    /// Resolved module imports.
    pub(crate) modules: BTreeSet<VfsPath>,
    /// Resolved stylesheet imports.
    pub(crate) styles: BTreeSet<VfsPath>,
    /// Lookup candidates that did not exist.
    pub(crate) watched: BTreeSet<VfsPath>,
}

/// Result of linking one module.
#[derive(Debug)]
pub(crate) struct Linked {
    pub(crate) record: Option<Arc<ModuleRecord>>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) links: Links,
}

/// Dependency graph of the modules reachable from the entry.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    records: BTreeMap<VfsPath, Arc<ModuleRecord>>,
    failures: BTreeMap<VfsPath, Vec<Diagnostic>>,
    links: BTreeMap<VfsPath, Links>,
    dependents: BTreeMap<VfsPath, BTreeSet<VfsPath>>,
    watchers: BTreeMap<VfsPath, BTreeSet<VfsPath>>,
}

impl ModuleGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of linked modules, failed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns `true` if nothing has been linked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Returns `true` if the module has been linked, successfully or not.
    #[must_use]
    pub fn contains(&self, path: &VfsPath) -> bool {
        self.links.contains_key(path)
    }

    /// Returns the record of a successfully linked module.
    #[must_use]
    pub fn record(&self, path: &VfsPath) -> Option<&Arc<ModuleRecord>> {
        self.records.get(path)
    }

    /// Iterates successfully linked modules in path order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<ModuleRecord>> {
        self.records.values()
    }

    /// Diagnostics that kept a module from linking.
    #[must_use]
    pub fn diagnostics(&self, path: &VfsPath) -> &[Diagnostic] {
        self.failures.get(path).map_or(&[], Vec::as_slice)
    }

    /// Iterates failed modules in path order.
    pub fn failures(&self) -> impl Iterator<Item = (&VfsPath, &[Diagnostic])> {
        self.failures
            .iter()
            .map(|(path, diagnostics)| (path, diagnostics.as_slice()))
    }

    /// Returns `true` if the module was linked and failed.
    #[must_use]
    pub fn is_failed(&self, path: &VfsPath) -> bool {
        self.failures.contains_key(path)
    }

    /// Modules that import `path` directly.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::LinkerConfig;
    /// use studio_linker::Linker;
    /// use studio_vfs::{VfsBuilder, VfsPath};
    ///
    /// let vfs = VfsBuilder::new()
    ///     .add_file(
    ///         "/App.jsx",
    ///         "import Button from './Button';\nexport default () => <Button />;",
    ///     )
    ///     .add_file("/Button.jsx", "export default () => <button />;")
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut linker = Linker::new(&LinkerConfig::default(), 16).unwrap();
    /// linker.link(&vfs);
    ///
    /// let button = VfsPath::parse("/Button.jsx").unwrap();
    /// let importers: Vec<_> = linker.graph().dependents(&button).map(VfsPath::as_str).collect();
    /// assert_eq!(importers, vec!["/App.jsx"]);
    /// ```
    pub fn dependents(&self, path: &VfsPath) -> impl Iterator<Item = &VfsPath> {
        self.dependents.get(path).into_iter().flatten()
    }

    /// Local modules a linked module imports, in path order.
    pub fn module_imports(&self, path: &VfsPath) -> impl Iterator<Item = &VfsPath> {
        self.links.get(path).into_iter().flat_map(|links| &links.modules)
    }

    /// Computes the modules a change set invalidates.
    ///
    /// The result holds every changed path, every module that looked up a
    /// changed path without finding it, and everything that transitively
    /// imports any of those.
    #[must_use]
    pub fn compute_invalidation(&self, changes: &ChangeSet) -> BTreeSet<VfsPath> {
        let mut invalid = BTreeSet::new();
        let mut queue = VecDeque::new();
        for path in changes.paths() {
            queue.push_back(path.clone());
            if let Some(watchers) = self.watchers.get(path) {
                queue.extend(watchers.iter().cloned());
            }
        }

        while let Some(path) = queue.pop_front() {
            if let Some(importers) = self.dependents.get(&path) {
                queue.extend(
                    importers
                        .iter()
                        .filter(|importer| !invalid.contains(*importer))
                        .cloned(),
                );
            }
            invalid.insert(path);
        }
        invalid
    }

    pub(crate) fn insert(&mut self, path: VfsPath, linked: Linked) {
        self.remove(&path);
        for target in linked.links.modules.iter().chain(&linked.links.styles) {
            self.dependents
                .entry(target.clone())
                .or_default()
                .insert(path.clone());
        }
        for candidate in &linked.links.watched {
            self.watchers
                .entry(candidate.clone())
                .or_default()
                .insert(path.clone());
        }
        if let Some(record) = linked.record {
            self.records.insert(path.clone(), record);
        }
        if !linked.diagnostics.is_empty() {
            self.failures.insert(path.clone(), linked.diagnostics);
        }
        self.links.insert(path, linked.links);
    }

    pub(crate) fn remove(&mut self, path: &VfsPath) {
        self.records.remove(path);
        self.failures.remove(path);
        let Some(links) = self.links.remove(path) else {
            return;
        };
        for target in links.modules.iter().chain(&links.styles) {
            detach(&mut self.dependents, target, path);
        }
        for candidate in &links.watched {
            detach(&mut self.watchers, candidate, path);
        }
    }

    /// Drops every module not in `keep`.
    pub(crate) fn retain(&mut self, keep: &BTreeSet<VfsPath>) {
        let stale: Vec<VfsPath> = self
            .links
            .keys()
            .filter(|path| !keep.contains(*path))
            .cloned()
            .collect();
        for path in &stale {
            self.remove(path);
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

fn detach(index: &mut BTreeMap<VfsPath, BTreeSet<VfsPath>>, key: &VfsPath, path: &VfsPath) {
    if let Some(set) = index.get_mut(key) {
        set.remove(path);
        if set.is_empty() {
            index.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_vfs::ChangeKind;

    fn path(p: &str) -> VfsPath {
        VfsPath::parse(p).unwrap()
    }

    fn links(modules: &[&str], watched: &[&str]) -> Linked {
        Linked {
            record: None,
            diagnostics: Vec::new(),
            links: Links {
                modules: modules.iter().map(|p| path(p)).collect(),
                styles: BTreeSet::new(),
                watched: watched.iter().map(|p| path(p)).collect(),
            },
        }
    }

    fn chain() -> ModuleGraph {
        // App -> Page -> Button, App -> Footer
        let mut graph = ModuleGraph::new();
        graph.insert(path("/App.jsx"), links(&["/Page.jsx", "/Footer.jsx"], &[]));
        graph.insert(path("/Page.jsx"), links(&["/Button.jsx"], &["/Icon", "/Icon.jsx"]));
        graph.insert(path("/Button.jsx"), links(&[], &[]));
        graph.insert(path("/Footer.jsx"), links(&[], &[]));
        graph
    }

    fn changed(paths: &[(&str, ChangeKind)]) -> ChangeSet {
        let mut changes = ChangeSet::new();
        for (p, kind) in paths {
            changes.record(path(p), *kind);
        }
        changes
    }

    #[test]
    fn test_invalidation_follows_dependents() {
        let graph = chain();
        let changes = changed(&[("/Button.jsx", ChangeKind::Modified)]);
        let invalid = graph.compute_invalidation(&changes);
        let expected: BTreeSet<_> = ["/Button.jsx", "/Page.jsx", "/App.jsx"]
            .into_iter()
            .map(path)
            .collect();
        assert_eq!(invalid, expected);
    }

    #[test]
    fn test_invalidation_of_leaf_sibling() {
        let graph = chain();
        let changes = changed(&[("/Footer.jsx", ChangeKind::Modified)]);
        let invalid = graph.compute_invalidation(&changes);
        assert!(!invalid.contains(&path("/Page.jsx")));
        assert!(!invalid.contains(&path("/Button.jsx")));
        assert_eq!(invalid.len(), 2);
    }

    #[test]
    fn test_created_lookup_candidate_invalidates_importer() {
        let graph = chain();
        let invalid = graph.compute_invalidation(&changed(&[("/Icon.jsx", ChangeKind::Created)]));
        assert!(invalid.contains(&path("/Icon.jsx")));
        assert!(invalid.contains(&path("/Page.jsx")));
        assert!(invalid.contains(&path("/App.jsx")));
        assert!(!invalid.contains(&path("/Footer.jsx")));
    }

    #[test]
    fn test_remove_detaches_edges() {
        let mut graph = chain();
        graph.remove(&path("/Page.jsx"));
        assert_eq!(graph.dependents(&path("/Button.jsx")).count(), 0);
        assert!(graph.watchers.is_empty());
        assert_eq!(graph.dependents(&path("/Page.jsx")).count(), 1);
    }

    #[test]
    fn test_retain_prunes_unreachable() {
        let mut graph = chain();
        let keep: BTreeSet<_> = ["/App.jsx", "/Footer.jsx"].into_iter().map(path).collect();
        graph.retain(&keep);
        assert_eq!(graph.len(), 2);
        assert!(!graph.contains(&path("/Button.jsx")));
    }

    #[test]
    fn test_cycle_invalidation_terminates() {
        let mut graph = ModuleGraph::new();
        graph.insert(path("/A.jsx"), links(&["/B.jsx"], &[]));
        graph.insert(path("/B.jsx"), links(&["/A.jsx"], &[]));
        let invalid = graph.compute_invalidation(&changed(&[("/A.jsx", ChangeKind::Modified)]));
        assert_eq!(invalid.len(), 2);
    }
}
