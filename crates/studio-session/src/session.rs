//! The editing session.

use crate::stats::SessionStats;
use crate::summary::{RenderStatus, TurnSummary};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use studio_core::{Diagnostic, Result, Revision, SessionId, StudioConfig};
use studio_linker::{Bundle, Linker};
use studio_preview::{Preview, PreviewRenderer, RenderOutcome, Sandbox};
use studio_tools::{CommandProvider, MockProvider, ToolCommand, ToolResponse, TurnDriver};
use studio_vfs::{ChangeSet, Vfs, VfsSnapshot};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Builder for [`Session`].
///
/// Everything is optional: the default session starts from an empty
/// project, the default configuration, the [`MockProvider`] and the
/// isolated sandbox.
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: Option<StudioConfig>,
    provider: Option<Arc<dyn CommandProvider>>,
    sandbox: Option<Arc<dyn Sandbox>>,
    vfs: Option<Vfs>,
}

impl SessionBuilder {
    /// Creates a builder with every setting at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: StudioConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets where commands come from.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn CommandProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replaces the isolated sandbox.
    #[must_use]
    pub fn sandbox(mut self, sandbox: Arc<dyn Sandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Starts from an existing project.
    #[must_use]
    pub fn vfs(mut self, vfs: Vfs) -> Self {
        self.vfs = Some(vfs);
        self
    }

    /// Builds the session.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration does not validate,
    /// or `Error::InvalidPath` if the configured entry is not a valid path.
    pub fn build(self) -> Result<Session> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let linker = Linker::from_config(&config)?;
        let renderer = match self.sandbox {
            Some(sandbox) => PreviewRenderer::with_sandbox(config.preview.clone(), sandbox),
            None => PreviewRenderer::new(config.preview.clone()),
        };
        let driver = TurnDriver::from_config(&config);
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(MockProvider::new()));

        let session = Session {
            id: SessionId::new(),
            started_at: Utc::now(),
            vfs: self.vfs.unwrap_or_default(),
            linker,
            renderer,
            driver,
            provider,
            bundle: None,
            turns: 0,
            halted_turns: 0,
            commands_applied: 0,
            commands_failed: 0,
            config,
        };
        debug!(session = %session.id, provider = session.provider.name(), "session created");
        Ok(session)
    }
}

/// One editing session: a project, the commands that change it, and the
/// preview that follows it.
///
/// A turn applies the provider's commands one by one, then collapses every
/// change they made into a single rebuild and a single render. A session
/// therefore never renders an intermediate state of a turn. Subscribers
/// receive each successfully rendered preview as one complete replacement.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use studio_session::Session;
/// use studio_tools::{ScriptedProvider, ToolCommand};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = ScriptedProvider::from_batches([vec![ToolCommand::CreateFile {
///     path: "/App.jsx".to_string(),
///     content: "export default () => <h1>Hello</h1>;".to_string(),
/// }]]);
/// let mut session = Session::builder().provider(Arc::new(provider)).build().unwrap();
/// let preview = session.subscribe();
///
/// let summary = session.run_turn("hello", &CancellationToken::new()).await.unwrap();
/// assert!(summary.published());
/// assert!(preview.borrow().is_some());
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    config: StudioConfig,
    vfs: Vfs,
    linker: Linker,
    renderer: PreviewRenderer,
    driver: TurnDriver,
    provider: Arc<dyn CommandProvider>,
    bundle: Option<Bundle>,
    turns: u32,
    halted_turns: u32,
    commands_applied: u64,
    commands_failed: u64,
}

impl Session {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates an empty session with the mock provider.
    ///
    /// # Errors
    ///
    /// See [`SessionBuilder::build`].
    pub fn new(config: StudioConfig) -> Result<Self> {
        SessionBuilder::new().config(config).build()
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// The project.
    #[must_use]
    pub const fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    /// Bundle from the last rebuild.
    #[must_use]
    pub const fn bundle(&self) -> Option<&Bundle> {
        self.bundle.as_ref()
    }

    /// Turns run so far.
    #[must_use]
    pub const fn turns(&self) -> u32 {
        self.turns
    }

    /// Name of the current command provider.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Switches command providers between turns.
    pub fn set_provider(&mut self, provider: Arc<dyn CommandProvider>) {
        self.provider = provider;
    }

    /// Subscribes to rendered previews.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Preview>>> {
        self.renderer.subscribe()
    }

    /// The preview currently running.
    #[must_use]
    pub fn current_preview(&self) -> Option<Arc<Preview>> {
        self.renderer.current()
    }

    /// Records an error the running preview reported after it loaded.
    ///
    /// The preview stays up; the returned outcome carries the diagnostic.
    pub fn report_runtime_error(&self, revision: Revision, message: &str) -> RenderOutcome {
        self.renderer.report_runtime_error(revision, message)
    }

    /// Applies a single command outside of any turn.
    ///
    /// The preview is not updated until the next [`Session::refresh`] or
    /// turn; the change stays in the VFS journal until then.
    pub fn execute(&mut self, command: &ToolCommand) -> ToolResponse {
        let response = self.driver.executor().execute(&mut self.vfs, command);
        if response.ok {
            self.commands_applied += 1;
        } else {
            self.commands_failed += 1;
        }
        response
    }

    /// Runs one turn and updates the preview.
    ///
    /// All changes the turn made are coalesced into one rebuild and one
    /// render. A turn that changed nothing skips both, unless nothing was
    /// rendered yet.
    ///
    /// # Errors
    ///
    /// Returns the provider's error. Commands applied before it stay in the
    /// VFS and are picked up by the next rebuild.
    #[tracing::instrument(skip_all, fields(session = %self.id, turn = self.turns + 1))]
    pub async fn run_turn(
        &mut self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnSummary> {
        let started = Instant::now();
        self.turns += 1;

        let report = self
            .driver
            .run(self.provider.as_ref(), &mut self.vfs, self.turns, prompt, cancel)
            .await?;
        self.commands_applied += report.applied() as u64;
        self.commands_failed += report.failed() as u64;
        if !report.is_complete() {
            self.halted_turns += 1;
        }

        let changes = self.vfs.take_changes();
        let outcome = if changes.is_empty() && self.bundle.is_some() {
            debug!("turn left the project unchanged; skipping rebuild");
            None
        } else {
            Some(self.rebuild(&changes).await)
        };

        let mut diagnostics: Vec<Diagnostic> =
            report.halted.iter().map(|halt| halt.diagnostic()).collect();
        if let (Some(outcome), Some(bundle)) = (&outcome, &self.bundle) {
            diagnostics.extend(bundle.diagnostics().cloned());
            for diagnostic in outcome.diagnostics() {
                if !diagnostics.contains(diagnostic) {
                    diagnostics.push(diagnostic.clone());
                }
            }
        }

        let summary = TurnSummary {
            changes: changes.len(),
            revision: self.vfs.revision(),
            render: outcome
                .as_ref()
                .map_or(RenderStatus::Skipped, RenderStatus::from),
            diagnostics,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            outcome,
            report,
        };
        info!(
            steps = summary.report.steps(),
            applied = summary.report.applied(),
            changes = summary.changes,
            diagnostics = summary.diagnostics.len(),
            elapsed_ms = summary.elapsed_ms,
            "turn completed"
        );
        Ok(summary)
    }

    /// Rebuilds from pending VFS changes and renders.
    pub async fn refresh(&mut self) -> RenderOutcome {
        let changes = self.vfs.take_changes();
        self.rebuild(&changes).await
    }

    /// Captures the project.
    #[must_use]
    pub fn snapshot(&self) -> VfsSnapshot {
        self.vfs.snapshot()
    }

    /// Replaces the project with a snapshot and renders it.
    ///
    /// # Errors
    ///
    /// Returns the VFS error if the snapshot is inconsistent; the project
    /// and the preview are left untouched in that case.
    pub async fn restore(&mut self, snapshot: &VfsSnapshot) -> Result<RenderOutcome> {
        self.vfs.restore(snapshot)?;
        Ok(self.refresh().await)
    }

    /// Returns a snapshot of session statistics.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id,
            started_at: self.started_at,
            turns: self.turns,
            halted_turns: self.halted_turns,
            commands_applied: self.commands_applied,
            commands_failed: self.commands_failed,
            linker: self.linker.stats(),
            render: self.renderer.stats(),
        }
    }

    async fn rebuild(&mut self, changes: &ChangeSet) -> RenderOutcome {
        let bundle = self.linker.rebuild(&self.vfs, changes);
        let outcome = self.renderer.render(&bundle).await;
        self.bundle = Some(bundle);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::{ErrorKind, LinkerConfig};
    use studio_tools::ScriptedProvider;

    fn create(path: &str, content: &str) -> ToolCommand {
        ToolCommand::CreateFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn scripted(batches: Vec<Vec<ToolCommand>>) -> Session {
        Session::builder()
            .provider(Arc::new(ScriptedProvider::from_batches(batches)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_unchanged_turn_skips_rebuild() {
        let mut session = scripted(vec![
            vec![create("/App.jsx", "export default () => <p>Hi</p>;")],
            vec![ToolCommand::ViewFile {
                path: "/App.jsx".to_string(),
                range: None,
            }],
        ]);
        let cancel = CancellationToken::new();

        let first = session.run_turn("", &cancel).await.unwrap();
        assert!(first.published());
        let second = session.run_turn("", &cancel).await.unwrap();
        assert_eq!(second.render, RenderStatus::Skipped);
        assert_eq!(session.stats().linker.rebuilds, 1);
    }

    #[tokio::test]
    async fn test_first_turn_renders_even_without_changes() {
        let vfs = studio_vfs::VfsBuilder::new()
            .add_file("/App.jsx", "export default () => null;")
            .build()
            .unwrap();
        let mut session = Session::builder()
            .provider(Arc::new(ScriptedProvider::default()))
            .vfs(vfs)
            .build()
            .unwrap();

        let summary = session.run_turn("", &CancellationToken::new()).await.unwrap();
        assert!(summary.published());
    }

    #[tokio::test]
    async fn test_missing_entry_fails_render() {
        let mut session = scripted(vec![vec![create("/Other.jsx", "export default 1;")]]);
        let summary = session.run_turn("", &CancellationToken::new()).await.unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.diagnostics[0].kind, ErrorKind::PathNotFound);
        assert!(session.current_preview().is_none());
    }

    #[tokio::test]
    async fn test_reported_runtime_error_keeps_preview() {
        let mut session = scripted(vec![vec![create(
            "/App.jsx",
            "export default () => <button onClick={() => missing()}>Go</button>;",
        )]]);
        let summary = session.run_turn("", &CancellationToken::new()).await.unwrap();
        assert!(summary.published());
        let preview = session.current_preview().unwrap();

        let message = "ReferenceError: missing is not defined";
        let outcome = session.report_runtime_error(preview.revision, message);
        assert_eq!(outcome.diagnostics()[0].kind, ErrorKind::SandboxRuntimeError);
        assert_eq!(session.current_preview(), Some(preview));
        assert_eq!(session.stats().render.failed_renders, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StudioConfig {
            linker: LinkerConfig {
                entry: "App.jsx".to_string(),
                ..LinkerConfig::default()
            },
            ..StudioConfig::default()
        };
        assert!(Session::new(config).is_err());
    }

    #[tokio::test]
    async fn test_execute_counts_commands() {
        let mut session = scripted(Vec::new());
        assert!(session.execute(&create("/App.jsx", "export default () => null;")).ok);
        assert!(!session.execute(&create("/App.jsx", "")).ok);

        let stats = session.stats();
        assert_eq!((stats.commands_applied, stats.commands_failed), (1, 1));
        assert!(session.refresh().await.is_success());
    }
}
