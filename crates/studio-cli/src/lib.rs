//! Component Studio command-line library.
//!
//! Exposes the argument definitions, commands and formatters behind the
//! `studio` binary so they can be tested.
//!
//! # Commands
//!
//! - `run <turns.json>`: replay a recorded turn script
//! - `prompt "<text>"...`: scaffold components with the offline provider
//! - `render <snapshot.json>`: render a saved project
//!
//! ```bash
//! studio prompt "a counter" "a profile card" --out preview.html --snapshot-out project.json
//! studio render project.json --format json
//! ```

#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod commands;
pub mod formatters;
pub mod report;

pub use cli::{Cli, Commands, ExitCode, LogFormat, OutputArgs, OutputFormat, SessionArgs};
