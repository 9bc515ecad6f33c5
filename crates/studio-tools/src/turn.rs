//! Sequential turn execution.

use crate::command::{ToolCommand, ToolResponse};
use crate::executor::ToolExecutor;
use crate::provider::{CommandProvider, TurnContext};
use crate::queue::CommandQueue;
use serde::Serialize;
use studio_core::{Diagnostic, Error, ExecutionMode, ExecutorConfig, Result, StudioConfig};
use studio_vfs::Vfs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One command and the executor's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    /// The command as issued.
    pub command: ToolCommand,
    /// The executor's response.
    pub response: ToolResponse,
}

/// Why a turn stopped before its provider was done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TurnHalt {
    /// The step ceiling was reached with commands still queued.
    StepLimit {
        /// The ceiling
        limit: usize,
        /// Commands dropped from the queue
        dropped: usize,
    },
    /// The turn was cancelled.
    Cancelled {
        /// Commands dropped from the queue
        dropped: usize,
    },
}

impl TurnHalt {
    /// The halt as a diagnostic.
    #[must_use]
    pub fn diagnostic(&self) -> Diagnostic {
        let err = match self {
            Self::StepLimit { limit, .. } => Error::StepLimitExceeded { limit: *limit },
            Self::Cancelled { .. } => Error::Cancelled {
                operation: "turn".to_string(),
            },
        };
        Diagnostic::from(err)
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// 1-based turn number.
    pub turn: u32,
    /// Name of the provider that produced the commands.
    pub provider: String,
    /// Commands executed, in order, with their responses.
    pub outcomes: Vec<CommandOutcome>,
    /// Set if the turn was cut short.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<TurnHalt>,
}

impl TurnReport {
    /// Number of commands executed, successful or not.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of commands that applied.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.response.ok).count()
    }

    /// Number of commands that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.steps() - self.applied()
    }

    /// Returns `true` if the turn ran to completion.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.halted.is_none()
    }
}

/// Drives one turn: asks a provider for commands and applies them in order.
///
/// Commands are applied strictly one after another against a single VFS.
/// The turn ends when the provider returns an empty batch, when the step
/// ceiling is reached, or when the cancellation token fires. Commands already
/// applied are never rolled back.
///
/// # Examples
///
/// ```
/// use studio_core::ExecutorConfig;
/// use studio_tools::{ScriptedProvider, ToolCommand, TurnDriver};
/// use studio_vfs::Vfs;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = ScriptedProvider::from_batches([vec![ToolCommand::CreateFile {
///     path: "/App.jsx".to_string(),
///     content: "export default () => null;".to_string(),
/// }]]);
/// let driver = TurnDriver::new(&ExecutorConfig::default(), Default::default());
/// let mut vfs = Vfs::new();
///
/// let report = driver
///     .run(&provider, &mut vfs, 1, "scaffold", &CancellationToken::new())
///     .await
///     .unwrap();
/// assert_eq!(report.applied(), 1);
/// assert!(vfs.exists("/App.jsx"));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TurnDriver {
    executor: ToolExecutor,
    mode: ExecutionMode,
    step_limit: usize,
}

impl TurnDriver {
    /// Creates a driver with the executor's budget settings.
    #[must_use]
    pub fn new(config: &ExecutorConfig, executor: ToolExecutor) -> Self {
        Self {
            executor,
            mode: config.mode,
            step_limit: config.step_limit(),
        }
    }

    /// Creates a driver from the studio configuration.
    #[must_use]
    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(&config.executor, ToolExecutor::from_config(config))
    }

    /// Per-turn command ceiling.
    #[must_use]
    pub const fn step_limit(&self) -> usize {
        self.step_limit
    }

    /// The executor commands are applied with.
    #[must_use]
    pub const fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Runs one turn.
    ///
    /// # Errors
    ///
    /// Returns the provider's error. Commands applied before the provider
    /// failed stay applied.
    #[tracing::instrument(skip_all, fields(turn = turn, provider = provider.name()))]
    pub async fn run(
        &self,
        provider: &dyn CommandProvider,
        vfs: &mut Vfs,
        turn: u32,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnReport> {
        let mut report = TurnReport {
            turn,
            provider: provider.name().to_string(),
            outcomes: Vec::new(),
            halted: None,
        };
        let mut queue = CommandQueue::new();
        let mut context = TurnContext::new(turn, prompt, self.mode, self.step_limit);

        loop {
            context.files = vfs.file_paths().iter().map(ToString::to_string).collect();
            context.remaining_steps = self.step_limit.saturating_sub(report.steps());

            let batch = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    report.halted = Some(TurnHalt::Cancelled { dropped: 0 });
                    break;
                }
                batch = provider.produce_next_commands(&context) => batch?,
            };
            if batch.is_empty() {
                break;
            }
            debug!(round = context.round, commands = batch.len(), "received command batch");
            queue.extend(batch);

            let mut feedback = Vec::with_capacity(queue.len());
            while let Some(command) = queue.pop() {
                if cancel.is_cancelled() {
                    report.halted = Some(TurnHalt::Cancelled {
                        dropped: queue.clear() + 1,
                    });
                    break;
                }
                if report.steps() >= self.step_limit {
                    report.halted = Some(TurnHalt::StepLimit {
                        limit: self.step_limit,
                        dropped: queue.clear() + 1,
                    });
                    break;
                }
                let response = self.executor.execute(vfs, &command);
                feedback.push(response.clone());
                report.outcomes.push(CommandOutcome { command, response });
            }
            if report.halted.is_some() {
                break;
            }

            context.round += 1;
            context.feedback = feedback;
        }

        match &report.halted {
            Some(TurnHalt::StepLimit { limit, dropped }) => {
                warn!(limit, dropped, "step limit reached; remaining commands dropped");
            }
            Some(TurnHalt::Cancelled { dropped }) => warn!(dropped, "turn cancelled"),
            None => {}
        }
        debug!(
            steps = report.steps(),
            applied = report.applied(),
            "turn finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedProvider;
    use async_trait::async_trait;

    fn mkdir(path: &str) -> ToolCommand {
        ToolCommand::CreateDirectory {
            path: path.to_string(),
        }
    }

    fn driver(max_steps: usize) -> TurnDriver {
        let config = ExecutorConfig {
            mode: ExecutionMode::Constrained,
            max_steps: Some(max_steps),
        };
        TurnDriver::new(&config, ToolExecutor::default())
    }

    /// Keeps asking for one more directory until told to stop.
    #[derive(Debug)]
    struct Endless;

    #[async_trait]
    impl CommandProvider for Endless {
        fn name(&self) -> &str {
            "endless"
        }

        async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
            Ok(vec![mkdir(&format!("/d{}", context.round))])
        }
    }

    #[tokio::test]
    async fn test_feedback_rounds_until_step_limit() {
        let mut vfs = Vfs::new();
        let report = driver(3)
            .run(&Endless, &mut vfs, 1, "", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.steps(), 3);
        assert_eq!(report.halted, Some(TurnHalt::StepLimit { limit: 3, dropped: 1 }));
        assert!(vfs.is_dir("/d2"));
        assert!(!vfs.exists("/d3"));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_turn() {
        let provider = ScriptedProvider::from_batches([vec![
            ToolCommand::DeleteFile {
                path: "/missing.js".to_string(),
            },
            mkdir("/ok"),
        ]]);
        let mut vfs = Vfs::new();
        let report = driver(4)
            .run(&provider, &mut vfs, 1, "", &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!((report.applied(), report.failed()), (1, 1));
        assert!(vfs.is_dir("/ok"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let provider = ScriptedProvider::from_batches([vec![mkdir("/a")]]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut vfs = Vfs::new();
        let report = driver(4).run(&provider, &mut vfs, 1, "", &cancel).await.unwrap();

        assert_eq!(report.halted, Some(TurnHalt::Cancelled { dropped: 0 }));
        assert_eq!(report.steps(), 0);
        assert_eq!(provider.remaining(), 1);
    }

    #[test]
    fn test_halt_diagnostic_kind() {
        let halt = TurnHalt::StepLimit { limit: 4, dropped: 2 };
        assert_eq!(halt.diagnostic().kind, studio_core::ErrorKind::StepLimitExceeded);
    }
}
