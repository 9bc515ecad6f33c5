//! The preview renderer.

use crate::artifact::{Artifact, PreviewDocument};
use crate::sandbox::{IsolatedSandbox, Sandbox, SandboxLimits, SandboxReport, module_in_stack};
use crate::stats::RenderStats;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use studio_core::{Diagnostic, Error, PreviewConfig, Revision};
use studio_linker::Bundle;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// A successfully rendered revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Bundle revision.
    pub revision: Revision,
    /// The document the sandbox loaded.
    pub document: PreviewDocument,
    /// Sandbox load report.
    pub report: SandboxReport,
}

/// Result of one render request.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// A new preview replaced the previous one.
    Rendered(Arc<Preview>),
    /// The bundle produced the document already running; nothing was loaded.
    Unchanged(Arc<Preview>),
    /// The render failed. The previous preview, if any, is still current.
    Failed {
        /// Revision of the bundle that failed.
        revision: Revision,
        /// What went wrong.
        diagnostics: Vec<Diagnostic>,
    },
}

impl RenderOutcome {
    /// Returns `true` unless the render failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// The preview now running, for successful outcomes.
    #[must_use]
    pub const fn preview(&self) -> Option<&Arc<Preview>> {
        match self {
            Self::Rendered(preview) | Self::Unchanged(preview) => Some(preview),
            Self::Failed { .. } => None,
        }
    }

    /// Diagnostics of a failed render.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Failed { diagnostics, .. } => diagnostics,
            Self::Rendered(_) | Self::Unchanged(_) => &[],
        }
    }
}

/// Turns bundles into running previews.
///
/// Each successful render publishes a new [`Preview`] on a watch channel,
/// fully replacing the previous one. Subscribers only ever see complete
/// previews. A failed render leaves the last good preview in place.
///
/// # Examples
///
/// ```
/// use studio_core::{LinkerConfig, PreviewConfig};
/// use studio_linker::Linker;
/// use studio_preview::PreviewRenderer;
/// use studio_vfs::VfsBuilder;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let vfs = VfsBuilder::new()
///     .add_file("/App.jsx", "export default () => <h1>Hello</h1>;")
///     .build()
///     .unwrap();
/// let bundle = Linker::new(&LinkerConfig::default(), 8).unwrap().link(&vfs);
///
/// let renderer = PreviewRenderer::new(PreviewConfig::default());
/// let outcome = renderer.render(&bundle).await;
/// assert!(outcome.is_success());
/// assert!(renderer.current().is_some());
/// # }
/// ```
pub struct PreviewRenderer {
    config: PreviewConfig,
    sandbox: Arc<dyn Sandbox>,
    published: watch::Sender<Option<Arc<Preview>>>,

    total_renders: AtomicU32,
    failed_renders: AtomicU32,
    reused_documents: AtomicU32,
    sandbox_loads: AtomicU32,
    total_render_time_us: AtomicU64,
}

impl std::fmt::Debug for PreviewRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRenderer")
            .field("config", &self.config)
            .field("sandbox", &self.sandbox)
            .field("total_renders", &self.total_renders.load(Ordering::Relaxed))
            .field("failed_renders", &self.failed_renders.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl PreviewRenderer {
    /// Creates a renderer backed by an [`IsolatedSandbox`] limited by the
    /// configuration.
    #[must_use]
    pub fn new(config: PreviewConfig) -> Self {
        let sandbox = IsolatedSandbox::with_limits(SandboxLimits::from_config(&config));
        Self::with_sandbox(config, Arc::new(sandbox))
    }

    /// Creates a renderer backed by a custom sandbox.
    #[must_use]
    pub fn with_sandbox(config: PreviewConfig, sandbox: Arc<dyn Sandbox>) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            config,
            sandbox,
            published,
            total_renders: AtomicU32::new(0),
            failed_renders: AtomicU32::new(0),
            reused_documents: AtomicU32::new(0),
            sandbox_loads: AtomicU32::new(0),
            total_render_time_us: AtomicU64::new(0),
        }
    }

    /// Subscribes to published previews.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Preview>>> {
        self.published.subscribe()
    }

    /// The preview currently running.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Preview>> {
        self.published.borrow().clone()
    }

    /// Renderer configuration.
    #[must_use]
    pub const fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Packs a bundle without rendering it.
    #[must_use]
    pub fn artifact(&self, bundle: &Bundle) -> Artifact {
        Artifact::build(bundle, &self.config)
    }

    /// Renders a bundle.
    ///
    /// A bundle whose entry did not link fails without touching the
    /// sandbox. A bundle that assembles to the document already running is
    /// answered with [`RenderOutcome::Unchanged`]. Sandbox loads are bounded
    /// by the configured render timeout.
    #[tracing::instrument(skip_all, fields(revision = %bundle.revision))]
    pub async fn render(&self, bundle: &Bundle) -> RenderOutcome {
        self.total_renders.fetch_add(1, Ordering::Relaxed);

        if !bundle.is_renderable() {
            let diagnostics = entry_diagnostics(bundle);
            debug!(count = diagnostics.len(), "bundle is not renderable");
            return self.fail(bundle.revision, diagnostics);
        }

        let artifact = Arc::new(self.artifact(bundle));
        if let Some(current) = self.current()
            && current.document.digest == artifact.digest()
        {
            self.reused_documents.fetch_add(1, Ordering::Relaxed);
            debug!(digest = %artifact.digest(), "document unchanged");
            return RenderOutcome::Unchanged(current);
        }

        let timeout = self.config.render_timeout();
        let started = Instant::now();
        let result = tokio::time::timeout(timeout, self.sandbox.load(Arc::clone(&artifact)))
            .await
            .unwrap_or_else(|_| {
                Err(Error::SandboxRuntimeError {
                    message: format!("Render timed out after {} ms", timeout.as_millis()),
                    module: None,
                })
            });
        let elapsed = started.elapsed();
        self.sandbox_loads.fetch_add(1, Ordering::Relaxed);
        self.total_render_time_us.fetch_add(
            u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );

        match result {
            Ok(report) => {
                let preview = Arc::new(Preview {
                    revision: bundle.revision,
                    document: Arc::unwrap_or_clone(artifact).into_document(),
                    report,
                });
                self.published.send_replace(Some(Arc::clone(&preview)));
                info!(
                    modules = preview.report.modules_evaluated,
                    elapsed_ms = elapsed.as_millis(),
                    "preview rendered"
                );
                RenderOutcome::Rendered(preview)
            }
            Err(err) => {
                error!(error = %err, "preview render failed");
                self.fail(bundle.revision, vec![Diagnostic::from(err)])
            }
        }
    }

    /// Records an error the running preview document reported after loading.
    ///
    /// The iframe posts `{type: "error"}` messages for errors thrown after
    /// the first render, for example in event handlers. The report is
    /// surfaced as a failed render of `revision`; the preview stays up. A
    /// `message` that carries a stack trace is attributed to the first VFS
    /// module in it.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::{ErrorKind, PreviewConfig, Revision};
    /// use studio_preview::PreviewRenderer;
    ///
    /// let renderer = PreviewRenderer::new(PreviewConfig::default());
    /// let outcome = renderer.report_runtime_error(Revision::new(3), "TypeError: x is undefined");
    /// assert_eq!(outcome.diagnostics()[0].kind, ErrorKind::SandboxRuntimeError);
    /// ```
    pub fn report_runtime_error(&self, revision: Revision, message: &str) -> RenderOutcome {
        let module = module_in_stack(message);
        let stale = self
            .current()
            .is_some_and(|current| current.revision != revision);
        warn!(%revision, stale, module = module.as_deref(), "preview reported a runtime error");
        self.fail(
            revision,
            vec![Diagnostic::from(Error::SandboxRuntimeError {
                message: message.to_string(),
                module,
            })],
        )
    }

    /// Returns a snapshot of render statistics.
    #[must_use]
    pub fn stats(&self) -> RenderStats {
        let loads = self.sandbox_loads.load(Ordering::Relaxed);
        let total_time = self.total_render_time_us.load(Ordering::Relaxed);
        let avg_render_time_us = if loads > 0 {
            total_time / u64::from(loads)
        } else {
            0
        };
        RenderStats::new(
            self.total_renders.load(Ordering::Relaxed),
            self.failed_renders.load(Ordering::Relaxed),
            self.reused_documents.load(Ordering::Relaxed),
            avg_render_time_us,
        )
    }

    fn fail(&self, revision: Revision, diagnostics: Vec<Diagnostic>) -> RenderOutcome {
        self.failed_renders.fetch_add(1, Ordering::Relaxed);
        RenderOutcome::Failed {
            revision,
            diagnostics,
        }
    }
}

/// Diagnostics explaining why the entry did not link.
fn entry_diagnostics(bundle: &Bundle) -> Vec<Diagnostic> {
    if let Some(diagnostics) = bundle.failed.get(&bundle.entry) {
        return diagnostics.clone();
    }
    let all: Vec<_> = bundle.diagnostics().cloned().collect();
    if all.is_empty() {
        vec![Diagnostic::from(Error::PathNotFound {
            path: bundle.entry.to_string(),
        })]
    } else {
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::{ErrorKind, LinkerConfig};
    use studio_linker::Linker;
    use studio_vfs::VfsBuilder;

    fn bundle(files: &[(&str, &str)]) -> Bundle {
        let vfs = VfsBuilder::new()
            .add_files(files.iter().copied())
            .build()
            .unwrap();
        Linker::new(&LinkerConfig::default(), 16).unwrap().link(&vfs)
    }

    #[tokio::test]
    async fn test_missing_entry_fails() {
        let renderer = PreviewRenderer::new(PreviewConfig::default());
        let outcome = renderer.render(&bundle(&[("/Other.jsx", "export default 1;")])).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.diagnostics()[0].kind, ErrorKind::PathNotFound);
        assert!(renderer.current().is_none());
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let renderer = PreviewRenderer::new(PreviewConfig::default());
        let good = bundle(&[("/App.jsx", "export default () => null;")]);
        renderer.render(&good).await;
        renderer.render(&good).await;
        renderer
            .render(&bundle(&[("/App.jsx", "export const x = 1;")]))
            .await;

        let stats = renderer.stats();
        assert_eq!(stats.total_renders, 3);
        assert_eq!(stats.failed_renders, 1);
        assert_eq!(stats.reused_documents, 1);
    }

    #[tokio::test]
    async fn test_reported_runtime_error_keeps_preview() {
        let renderer = PreviewRenderer::new(PreviewConfig::default());
        let good = bundle(&[("/App.jsx", "export default () => <button>Go</button>;")]);
        let RenderOutcome::Rendered(preview) = renderer.render(&good).await else {
            panic!("render failed");
        };

        let outcome = renderer.report_runtime_error(
            preview.revision,
            "TypeError: cannot read property 'x' of undefined\n    at onClick (@vfs/App.jsx:1:30)",
        );
        let RenderOutcome::Failed {
            revision,
            diagnostics,
        } = outcome
        else {
            panic!("expected a failed outcome");
        };
        assert_eq!(revision, preview.revision);
        assert_eq!(diagnostics[0].kind, ErrorKind::SandboxRuntimeError);
        assert!(diagnostics[0].concerns("/App.jsx"));
        assert_eq!(renderer.current(), Some(preview));
        assert_eq!(renderer.stats().failed_renders, 1);
    }

    #[test]
    fn test_entry_diagnostics_prefers_entry() {
        let bundle = bundle(&[("/App.jsx", "export default () => <div>;")]);
        let diagnostics = entry_diagnostics(&bundle);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::TransformSyntaxError);
    }
}
