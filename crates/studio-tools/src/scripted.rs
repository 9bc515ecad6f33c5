//! Replays recorded command batches.

use crate::command::ToolCommand;
use crate::provider::{CommandProvider, TurnContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use studio_core::{Error, Result};

/// One recorded turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedTurn {
    /// Prompt the batch was recorded for.
    #[serde(default)]
    pub prompt: String,
    /// Commands issued during the turn.
    pub commands: Vec<ToolCommand>,
}

/// Provider that answers each turn with the next recorded batch.
///
/// Only the first round of a turn consumes a batch; follow-up rounds get an
/// empty batch, which ends the turn. Once the script is exhausted every
/// turn is empty.
///
/// # Examples
///
/// ```
/// use studio_tools::ScriptedProvider;
///
/// let provider = ScriptedProvider::from_json(r#"[
///     {"prompt": "scaffold", "commands": [
///         {"name": "create_file", "args": {
///             "path": "/App.jsx",
///             "content": "export default () => null;"
///         }}
///     ]}
/// ]"#).unwrap();
/// assert_eq!(provider.remaining(), 1);
/// assert_eq!(provider.prompts(), vec!["scaffold".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<ScriptedTurn>>,
}

impl ScriptedProvider {
    /// Creates a provider replaying `turns` in order.
    #[must_use]
    pub fn new(turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into_iter().collect()),
        }
    }

    /// Creates a provider from bare command batches.
    #[must_use]
    pub fn from_batches(batches: impl IntoIterator<Item = Vec<ToolCommand>>) -> Self {
        Self::new(batches.into_iter().map(|commands| ScriptedTurn {
            prompt: String::new(),
            commands,
        }))
    }

    /// Parses a JSON array of [`ScriptedTurn`]s.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the script is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let turns: Vec<ScriptedTurn> =
            serde_json::from_str(json).map_err(|e| Error::SerializationError {
                message: format!("Invalid turn script: {e}"),
                source: Some(e),
            })?;
        Ok(Self::new(turns))
    }

    /// Number of turns not yet replayed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Prompts of the turns not yet replayed.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|turn| turn.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CommandProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
        if !context.is_first_round() {
            return Ok(Vec::new());
        }
        let next = self
            .turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.map(|turn| turn.commands).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::ExecutionMode;

    fn context(round: u32) -> TurnContext {
        TurnContext {
            round,
            ..TurnContext::new(1, "", ExecutionMode::Full, 40)
        }
    }

    #[tokio::test]
    async fn test_one_batch_per_turn() {
        let provider = ScriptedProvider::from_batches([
            vec![ToolCommand::CreateDirectory {
                path: "/a".to_string(),
            }],
            vec![],
        ]);

        assert_eq!(provider.produce_next_commands(&context(0)).await.unwrap().len(), 1);
        assert!(provider.produce_next_commands(&context(1)).await.unwrap().is_empty());
        assert_eq!(provider.remaining(), 1);
        assert!(provider.produce_next_commands(&context(0)).await.unwrap().is_empty());
        assert_eq!(provider.remaining(), 0);
        assert!(provider.produce_next_commands(&context(0)).await.unwrap().is_empty());
    }

    #[test]
    fn test_malformed_script() {
        let err = ScriptedProvider::from_json("{\"commands\": []}").unwrap_err();
        assert!(err.to_string().contains("Invalid turn script"));
    }
}
