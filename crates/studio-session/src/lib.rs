//! Editing sessions for Component Studio.
//!
//! A [`Session`] owns one project and everything that reacts to it: the
//! turn driver that applies tool commands, the incremental linker and the
//! preview renderer. Each turn ends with exactly one rebuild covering every
//! change the turn made, and each successful render is published to
//! subscribers as a complete replacement of the previous preview.
//!
//! # Examples
//!
//! ```
//! use studio_core::{ExecutionMode, StudioConfig};
//! use studio_session::Session;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = StudioConfig::builder().mode(ExecutionMode::Constrained).build();
//! let mut session = Session::new(config).unwrap();
//!
//! let summary = session
//!     .run_turn("Build a counter", &CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert!(summary.is_clean());
//! assert!(session.current_preview().is_some());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod session;
mod stats;
mod summary;

pub use session::{Session, SessionBuilder};
pub use stats::SessionStats;
pub use summary::{RenderStatus, TurnSummary};
