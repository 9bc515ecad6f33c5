//! Command providers.
//!
//! A [`CommandProvider`] stands in for whatever decides which edits to make:
//! a recorded script, the deterministic [`crate::MockProvider`], or an
//! external model client. It is selected once when a session starts and
//! passed to the turn driver explicitly.

use crate::command::{ToolCommand, ToolResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use studio_core::{ExecutionMode, Result};

/// Everything a provider sees when asked for commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnContext {
    /// 1-based turn number within the session.
    pub turn: u32,
    /// 0-based round within the turn. Round 0 carries the user prompt;
    /// later rounds carry the feedback of the previous batch.
    pub round: u32,
    /// The user's instruction for this turn.
    pub prompt: String,
    /// Budget mode of the executor.
    pub mode: ExecutionMode,
    /// Commands left before the step ceiling.
    pub remaining_steps: usize,
    /// Project files in path order.
    pub files: Vec<String>,
    /// Responses to the previous batch, in command order.
    pub feedback: Vec<ToolResponse>,
}

impl TurnContext {
    /// Context for the first round of a turn.
    #[must_use]
    pub fn new(
        turn: u32,
        prompt: impl Into<String>,
        mode: ExecutionMode,
        remaining_steps: usize,
    ) -> Self {
        Self {
            turn,
            round: 0,
            prompt: prompt.into(),
            mode,
            remaining_steps,
            files: Vec::new(),
            feedback: Vec::new(),
        }
    }

    /// Returns `true` for the round that carries the prompt.
    #[must_use]
    pub const fn is_first_round(&self) -> bool {
        self.round == 0
    }

    /// Returns `true` if the project has a file at `path`.
    #[must_use]
    pub fn has_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// Source of tool commands.
///
/// The turn driver calls [`produce_next_commands`](Self::produce_next_commands)
/// repeatedly within a turn, feeding back the responses to the previous
/// batch, until the provider returns an empty batch.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use studio_core::Result;
/// use studio_tools::{CommandProvider, ToolCommand, TurnContext};
///
/// #[derive(Debug)]
/// struct Scaffold;
///
/// #[async_trait]
/// impl CommandProvider for Scaffold {
///     fn name(&self) -> &str {
///         "scaffold"
///     }
///
///     async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
///         if !context.is_first_round() || context.has_file("/App.jsx") {
///             return Ok(Vec::new());
///         }
///         Ok(vec![ToolCommand::CreateFile {
///             path: "/App.jsx".to_string(),
///             content: "export default () => null;".to_string(),
///         }])
///     }
/// }
/// ```
#[async_trait]
pub trait CommandProvider: Send + Sync + fmt::Debug {
    /// Short provider name for logs and reports.
    fn name(&self) -> &str;

    /// Produces the next batch of commands for a turn.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce commands. The turn
    /// ends without applying anything further.
    async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>>;
}
