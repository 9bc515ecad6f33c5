//! Live preview rendering for Component Studio.
//!
//! [`PreviewRenderer`] takes a linked [`studio_linker::Bundle`], packs it
//! into one self-contained HTML [`Artifact`], and loads it into a
//! [`Sandbox`]. The artifact owns all of its modules as `data:` URLs behind
//! an import map, so the sandbox never reaches back into the host.
//!
//! Successful renders are published on a watch channel and fully replace the
//! previous preview. A render that fails in the sandbox is reported as
//! diagnostics while the last good preview stays up.
//!
//! # Examples
//!
//! ```
//! use studio_core::{LinkerConfig, PreviewConfig};
//! use studio_linker::Linker;
//! use studio_preview::{PreviewRenderer, RenderOutcome};
//! use studio_vfs::VfsBuilder;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let vfs = VfsBuilder::new()
//!     .add_file("/components/Button.jsx", "export default () => <button>Go</button>;")
//!     .add_file(
//!         "/App.jsx",
//!         "import Button from '@/components/Button';\nexport default () => <Button />;",
//!     )
//!     .build()
//!     .unwrap();
//! let bundle = Linker::new(&LinkerConfig::default(), 8).unwrap().link(&vfs);
//!
//! let renderer = PreviewRenderer::new(PreviewConfig::default());
//! let RenderOutcome::Rendered(preview) = renderer.render(&bundle).await else {
//!     panic!("render failed");
//! };
//! assert_eq!(preview.report.modules_evaluated, 2);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod artifact;
mod renderer;
mod runtime;
mod sandbox;
mod stats;

pub use artifact::{
    Artifact, ImportMap, MESSAGE_CHANNEL, MODULE_PREFIX, PreviewDocument, module_key,
};
pub use renderer::{Preview, PreviewRenderer, RenderOutcome};
pub use sandbox::{IsolatedSandbox, Sandbox, SandboxLimits, SandboxReport};
pub use stats::RenderStats;
