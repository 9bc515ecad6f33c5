//! Core types, errors, and configuration for Component Studio.
//!
//! This crate provides the foundational types shared by every other crate in
//! the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - Error taxonomy with contextual information ([`Error`], [`ErrorKind`])
//! - Strong domain types ([`Revision`], [`SessionId`])
//! - Cloneable diagnostics reported by every stage ([`Diagnostic`])
//! - Configuration ([`StudioConfig`] and its sections)

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod config;
mod diagnostic;
mod error;
mod types;

pub use config::{
    ExecutionMode, ExecutorConfig, LinkerConfig, PreviewConfig, SandboxPolicy, StudioConfig,
    StudioConfigBuilder,
};
pub use diagnostic::Diagnostic;
pub use error::{Error, ErrorKind, Result};
pub use types::{Revision, SessionId};
