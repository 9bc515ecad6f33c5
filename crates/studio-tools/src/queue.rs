//! Ordered command queue.

use crate::command::ToolCommand;
use std::collections::VecDeque;

/// FIFO queue of commands waiting for the executor.
///
/// Providers push whole batches; the turn driver pops one command at a
/// time, so commands are applied in exactly the order they were produced.
///
/// # Examples
///
/// ```
/// use studio_tools::{CommandQueue, ToolCommand};
///
/// let mut queue = CommandQueue::new();
/// queue.extend([
///     ToolCommand::CreateDirectory { path: "/a".to_string() },
///     ToolCommand::CreateDirectory { path: "/b".to_string() },
/// ]);
/// assert_eq!(queue.len(), 2);
/// assert_eq!(queue.pop().unwrap().paths(), vec!["/a"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandQueue {
    pending: VecDeque<ToolCommand>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one command.
    pub fn push(&mut self, command: ToolCommand) {
        self.pending.push_back(command);
    }

    /// Appends commands in order.
    pub fn extend(&mut self, commands: impl IntoIterator<Item = ToolCommand>) {
        self.pending.extend(commands);
    }

    /// Removes the oldest command.
    pub fn pop(&mut self) -> Option<ToolCommand> {
        self.pending.pop_front()
    }

    /// Number of waiting commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every waiting command, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
