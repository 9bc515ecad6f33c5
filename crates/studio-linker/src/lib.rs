//! Module graph linking for Component Studio.
//!
//! The linker turns the VFS into a [`Bundle`]: it resolves every import
//! specifier, transforms each reachable module (through an LRU
//! [`TransformCache`]), records failures per module, and orders the
//! successful modules so every module loads after its imports.
//!
//! # Incremental rebuilds
//!
//! After the first link, [`Linker::rebuild`] takes the coalesced
//! [`studio_vfs::ChangeSet`] of a turn and only relinks the modules it
//! invalidates: the changed paths and everything that transitively imports
//! them. All other records are reused as-is.
//!
//! # Failure scoping
//!
//! A syntax error or an unresolvable local import fails only the module
//! that contains it. The failure is recorded in [`Bundle::failed`], the
//! module is left out of [`Bundle::modules`], and the rest of the graph is
//! still linked.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod bundle;
mod cache;
mod graph;
mod linker;
mod record;
mod resolve;

pub use bundle::{Bundle, Stylesheet};
pub use cache::{CacheKey, CacheStats, TransformCache};
pub use graph::ModuleGraph;
pub use linker::{Linker, LinkerStats};
pub use record::{ImportTarget, ModuleRecord, ResolvedImport};
pub use resolve::Resolver;
