//! Tool commands and their execution for Component Studio.
//!
//! Edits reach the project as [`ToolCommand`]s: tagged records produced by a
//! [`CommandProvider`] and applied by a [`ToolExecutor`], one atomic VFS
//! operation per command. Each command is answered with a [`ToolResponse`]
//! the provider can use to decide what to do next.
//!
//! # Components
//!
//! - [`ToolExecutor`]: path validation, single-occurrence edits, structural
//!   operations, optional import rewriting on rename
//! - [`CommandQueue`]: the ordered queue commands wait in
//! - [`TurnDriver`]: runs a turn sequentially under a step ceiling and a
//!   cancellation token
//! - [`ScriptedProvider`] and [`MockProvider`]: built-in command sources
//!
//! # Examples
//!
//! ```
//! use studio_core::{ExecutionMode, StudioConfig};
//! use studio_tools::{MockProvider, TurnDriver};
//! use studio_vfs::Vfs;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = StudioConfig::builder().mode(ExecutionMode::Constrained).build();
//! let driver = TurnDriver::from_config(&config);
//! let mut vfs = Vfs::new();
//!
//! let report = driver
//!     .run(&MockProvider::new(), &mut vfs, 1, "Make a card", &CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert!(report.is_complete());
//! assert!(vfs.exists("/components/ProfileCard.jsx"));
//! assert!(vfs.exists("/styles/card.css"));
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod command;
mod executor;
mod mock;
mod provider;
mod queue;
mod scripted;
mod turn;

pub use command::{ToolCommand, ToolResponse};
pub use executor::ToolExecutor;
pub use mock::MockProvider;
pub use provider::{CommandProvider, TurnContext};
pub use queue::CommandQueue;
pub use scripted::{ScriptedProvider, ScriptedTurn};
pub use turn::{CommandOutcome, TurnDriver, TurnHalt, TurnReport};
