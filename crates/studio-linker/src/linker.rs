//! Incremental linking.

use crate::bundle::Bundle;
use crate::cache::TransformCache;
use crate::graph::{Linked, Links, ModuleGraph};
use crate::record::{ImportTarget, ModuleRecord, ResolvedImport};
use crate::resolve::Resolver;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use studio_core::{Diagnostic, Error, LinkerConfig, Result, StudioConfig};
use studio_vfs::{ChangeKind, ChangeSet, Vfs, VfsPath};
use tracing::{debug, info};

/// Counters accumulated across rebuilds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkerStats {
    /// Rebuilds performed.
    pub rebuilds: u64,
    /// Rebuilds that discarded the whole graph.
    pub full_rebuilds: u64,
    /// Modules linked from source (cache hits included).
    pub modules_linked: u64,
    /// Modules carried over unchanged from the previous graph.
    pub modules_reused: u64,
}

/// Builds bundles from the VFS, reusing work between revisions.
///
/// # Examples
///
/// ```
/// use studio_core::LinkerConfig;
/// use studio_linker::Linker;
/// use studio_vfs::VfsBuilder;
///
/// let mut vfs = VfsBuilder::new()
///     .add_file("/components/Button.jsx", "export default () => <button>Go</button>;")
///     .add_file(
///         "/App.jsx",
///         "import Button from '@/components/Button';\nexport default () => <Button />;",
///     )
///     .build()
///     .unwrap();
///
/// let mut linker = Linker::new(&LinkerConfig::default(), 64).unwrap();
/// let bundle = linker.link(&vfs);
/// let order: Vec<_> = bundle.load_order().iter().map(|p| p.as_str()).collect();
/// assert_eq!(order, vec!["/components/Button.jsx", "/App.jsx"]);
///
/// vfs.write("/components/Button.jsx", "export default () => <button>Stop</button>;").unwrap();
/// let changes = vfs.take_changes();
/// let next = linker.rebuild(&vfs, &changes);
/// assert!(next.is_renderable());
/// assert!(next.revision > bundle.revision);
/// ```
#[derive(Debug)]
pub struct Linker {
    entry: VfsPath,
    resolver: Resolver,
    graph: ModuleGraph,
    cache: TransformCache,
    stats: LinkerStats,
}

impl Linker {
    /// Creates a linker with an empty graph.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the configured entry is not a valid
    /// VFS path.
    pub fn new(config: &LinkerConfig, cache_capacity: usize) -> Result<Self> {
        Ok(Self {
            entry: VfsPath::parse(&config.entry)?,
            resolver: Resolver::new(config),
            graph: ModuleGraph::new(),
            cache: TransformCache::new(cache_capacity),
            stats: LinkerStats::default(),
        })
    }

    /// Creates a linker from the studio configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if the configured entry is invalid.
    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        Self::new(&config.linker, config.preview.transform_cache_capacity)
    }

    /// Entry module path.
    #[must_use]
    pub const fn entry(&self) -> &VfsPath {
        &self.entry
    }

    /// The resolver used for every import.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Current module graph.
    #[must_use]
    pub const fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Transform cache.
    #[must_use]
    pub const fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Counters accumulated across rebuilds.
    #[must_use]
    pub const fn stats(&self) -> LinkerStats {
        self.stats
    }

    /// Links the whole project from scratch.
    ///
    /// The transform cache is kept, so unchanged sources are not
    /// re-transformed.
    pub fn link(&mut self, vfs: &Vfs) -> Bundle {
        self.rebuild(vfs, &ChangeSet::reset())
    }

    /// Brings the graph up to date with `changes` and builds a bundle.
    ///
    /// Modules outside the invalidation set keep their records (the same
    /// `Arc`s). The graph is discarded and rebuilt when `changes` is a reset
    /// or removes the entry module.
    #[tracing::instrument(skip_all, fields(revision = %vfs.revision(), changes = changes.len()))]
    pub fn rebuild(&mut self, vfs: &Vfs, changes: &ChangeSet) -> Bundle {
        let started = Instant::now();
        self.stats.rebuilds += 1;

        let full = changes.is_reset()
            || self.graph.is_empty()
            || changes.kind_of(&self.entry) == Some(ChangeKind::Deleted);
        if full {
            self.stats.full_rebuilds += 1;
            self.graph.clear();
        } else {
            let invalid = self.graph.compute_invalidation(changes);
            debug!(invalidated = invalid.len(), "computed invalidation set");
            for path in &invalid {
                self.graph.remove(path);
            }
        }

        let mut reachable = BTreeSet::new();
        let mut pending = vec![self.entry.clone()];
        let (mut linked, mut reused) = (0u64, 0u64);
        while let Some(path) = pending.pop() {
            if !reachable.insert(path.clone()) {
                continue;
            }
            if self.graph.contains(&path) {
                reused += 1;
            } else {
                let outcome = self.link_module(vfs, &path);
                self.graph.insert(path.clone(), outcome);
                linked += 1;
            }
            pending.extend(
                self.graph
                    .module_imports(&path)
                    .filter(|target| !reachable.contains(*target))
                    .cloned(),
            );
        }
        self.graph.retain(&reachable);
        self.stats.modules_linked += linked;
        self.stats.modules_reused += reused;

        let bundle = Bundle::assemble(&self.entry, &self.graph, vfs);
        info!(
            revision = %bundle.revision,
            modules = bundle.modules.len(),
            failed = bundle.failed.len(),
            linked,
            reused,
            full,
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "bundle linked"
        );
        bundle
    }

    fn link_module(&mut self, vfs: &Vfs, path: &VfsPath) -> Linked {
        let failed = |err: &Error| Linked {
            record: None,
            diagnostics: vec![Diagnostic::from(err)],
            links: Links::default(),
        };

        let Some(file) = vfs.get(path) else {
            return failed(&Error::PathNotFound {
                path: path.to_string(),
            });
        };
        if file.is_dir() {
            return failed(&Error::IsADirectory {
                path: path.to_string(),
            });
        }

        let output = match self.cache.get_or_transform(path.as_str(), file.content()) {
            Ok(output) => output,
            Err(err) => {
                debug!(path = %path, error = %err, "module failed to transform");
                return failed(&err);
            }
        };

        let mut links = Links::default();
        let mut diagnostics = Vec::new();
        let mut resolved_imports = Vec::with_capacity(output.imports.len());
        for decl in &output.imports {
            let lookup = self.resolver.lookup(vfs, path, &decl.specifier);
            links.watched.extend(lookup.missed);
            match lookup.target {
                Ok(target) => {
                    match &target {
                        ImportTarget::Module(dep) => {
                            links.modules.insert(dep.clone());
                        }
                        ImportTarget::Style(sheet) => {
                            links.styles.insert(sheet.clone());
                        }
                        ImportTarget::External(_) => {}
                    }
                    resolved_imports.push(ResolvedImport {
                        specifier: decl.specifier.clone(),
                        kind: decl.kind,
                        target,
                    });
                }
                Err(err) => {
                    debug!(path = %path, specifier = %decl.specifier, "unresolved import");
                    diagnostics.push(Diagnostic::from(&err));
                }
            }
        }

        let record = diagnostics.is_empty().then(|| {
            Arc::new(ModuleRecord {
                path: path.clone(),
                source_revision: file.last_modified(),
                output: Arc::clone(&output),
                resolved_imports,
            })
        });
        debug!(
            path = %path,
            imports = output.imports.len(),
            ok = record.is_some(),
            "linked module"
        );

        Linked {
            record,
            diagnostics,
            links,
        }
    }
}
