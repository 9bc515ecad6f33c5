//! Virtual filesystem for Component Studio projects.
//!
//! Provides an in-memory, path-addressed store of text files and
//! directories. It is the single source of truth for project contents: every
//! structural edit (create, write, rename, delete) is validated up front and
//! then applied in one step, so readers never observe a half-applied change.
//!
//! # Features
//!
//! - **Arena storage**: entries keyed by normalized path, no pointer tree
//! - **Atomic mutations**: validation happens before any entry is touched
//! - **Change journal**: every mutation records the affected paths
//! - **Snapshots**: whole-state serialization for external persistence
//!
//! # Examples
//!
//! ```
//! use studio_vfs::Vfs;
//!
//! let mut vfs = Vfs::new();
//! vfs.write("/components/Button.jsx", "export default () => null;").unwrap();
//!
//! assert!(vfs.is_dir("/components"));
//! assert_eq!(
//!     vfs.read("/components/Button.jsx").unwrap(),
//!     "export default () => null;"
//! );
//!
//! let changes = vfs.take_changes();
//! assert_eq!(changes.len(), 2); // the directory and the file
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod builder;
pub mod changes;
pub mod path;
pub mod snapshot;
pub mod vfs;

pub use builder::VfsBuilder;
pub use changes::{ChangeKind, ChangeSet};
pub use path::VfsPath;
pub use snapshot::{SnapshotEntry, VfsSnapshot};
pub use vfs::{DirEntry, EntryKind, Vfs, VirtualFile};
