//! Error types for Component Studio.
//!
//! Every failure the studio can report, from a rejected VFS path to a crash
//! inside the preview sandbox, is a variant of [`Error`]. Variants carry their
//! context as named fields so the message handed back to the command issuer
//! is self-explanatory.
//!
//! # Examples
//!
//! ```
//! use studio_core::{Error, ErrorKind, Result};
//!
//! fn require_single_match(path: &str, occurrences: usize) -> Result<()> {
//!     if occurrences != 1 {
//!         return Err(Error::AmbiguousEdit {
//!             path: path.to_string(),
//!             occurrences,
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_single_match("/App.jsx", 2).unwrap_err();
//! assert!(err.is_ambiguous_edit());
//! assert_eq!(err.kind(), ErrorKind::AmbiguousEdit);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Component Studio.
///
/// All crates in the workspace report failures through this type, so a
/// diagnostic produced by the linker and one produced by the tool executor
/// can be classified the same way.
#[derive(Error, Debug)]
pub enum Error {
    /// No entry exists at the given path.
    #[error("Path not found: {path}")]
    PathNotFound {
        /// The path that was looked up
        path: String,
    },

    /// A create or rename target already exists.
    #[error("Path already exists: {path}")]
    PathConflict {
        /// The colliding target path
        path: String,
    },

    /// A directory was moved into its own subtree.
    #[error("Cannot move {from} into its own subtree ({to})")]
    CyclicMove {
        /// Source of the move
        from: String,
        /// Requested destination inside the source
        to: String,
    },

    /// An edit fragment did not occur exactly once.
    #[error(
        "Edit fragment occurs {occurrences} time(s) in {path}; it must match exactly once"
    )]
    AmbiguousEdit {
        /// File the edit targeted
        path: String,
        /// Number of occurrences found (counting stops at 2)
        occurrences: usize,
    },

    /// A module could not be parsed.
    #[error("Syntax error in {path} ({line}:{column}): {message}")]
    TransformSyntaxError {
        /// Module path
        path: String,
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
        /// Parser message
        message: String,
    },

    /// A local import specifier does not name an existing module.
    #[error("Unable to resolve '{specifier}' imported from {importer}")]
    UnresolvedImport {
        /// Module containing the import
        importer: String,
        /// Specifier as written
        specifier: String,
    },

    /// The preview sandbox reported a failure while running the artifact.
    #[error("Sandbox runtime error: {message}")]
    SandboxRuntimeError {
        /// Description of the failure
        message: String,
        /// Module the failure is attributed to, if known
        module: Option<String>,
    },

    /// The per-turn command budget was exhausted.
    #[error("Step limit of {limit} commands reached for this turn")]
    StepLimitExceeded {
        /// The configured ceiling
        limit: usize,
    },

    /// Path is relative, empty, or contains traversal segments.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A file was used where a directory is required.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// The offending path
        path: String,
    },

    /// A directory was used where a file is required.
    #[error("Is a directory: {path}")]
    IsADirectory {
        /// The offending path
        path: String,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// JSON conversion failed.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The operation was cancelled before it started.
    #[error("Operation cancelled: {operation}")]
    Cancelled {
        /// Name of the cancelled operation
        operation: String,
    },
}

/// Stable classification of an [`Error`].
///
/// Used in tool responses and preview diagnostics where the full error value
/// (which may own a non-cloneable source) cannot be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`Error::PathNotFound`]
    PathNotFound,
    /// See [`Error::PathConflict`]
    PathConflict,
    /// See [`Error::CyclicMove`]
    CyclicMove,
    /// See [`Error::AmbiguousEdit`]
    AmbiguousEdit,
    /// See [`Error::TransformSyntaxError`]
    TransformSyntaxError,
    /// See [`Error::UnresolvedImport`]
    UnresolvedImport,
    /// See [`Error::SandboxRuntimeError`]
    SandboxRuntimeError,
    /// See [`Error::StepLimitExceeded`]
    StepLimitExceeded,
    /// See [`Error::InvalidPath`]
    InvalidPath,
    /// See [`Error::NotADirectory`]
    NotADirectory,
    /// See [`Error::IsADirectory`]
    IsADirectory,
    /// See [`Error::ConfigError`]
    Config,
    /// See [`Error::SerializationError`]
    Serialization,
    /// See [`Error::Cancelled`]
    Cancelled,
}

impl ErrorKind {
    /// Returns the kind name as it appears in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PathNotFound => "PathNotFound",
            Self::PathConflict => "PathConflict",
            Self::CyclicMove => "CyclicMove",
            Self::AmbiguousEdit => "AmbiguousEdit",
            Self::TransformSyntaxError => "TransformSyntaxError",
            Self::UnresolvedImport => "UnresolvedImport",
            Self::SandboxRuntimeError => "SandboxRuntimeError",
            Self::StepLimitExceeded => "StepLimitExceeded",
            Self::InvalidPath => "InvalidPath",
            Self::NotADirectory => "NotADirectory",
            Self::IsADirectory => "IsADirectory",
            Self::Config => "ConfigError",
            Self::Serialization => "SerializationError",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound { .. } => ErrorKind::PathNotFound,
            Self::PathConflict { .. } => ErrorKind::PathConflict,
            Self::CyclicMove { .. } => ErrorKind::CyclicMove,
            Self::AmbiguousEdit { .. } => ErrorKind::AmbiguousEdit,
            Self::TransformSyntaxError { .. } => ErrorKind::TransformSyntaxError,
            Self::UnresolvedImport { .. } => ErrorKind::UnresolvedImport,
            Self::SandboxRuntimeError { .. } => ErrorKind::SandboxRuntimeError,
            Self::StepLimitExceeded { .. } => ErrorKind::StepLimitExceeded,
            Self::InvalidPath { .. } => ErrorKind::InvalidPath,
            Self::NotADirectory { .. } => ErrorKind::NotADirectory,
            Self::IsADirectory { .. } => ErrorKind::IsADirectory,
            Self::ConfigError { .. } => ErrorKind::Config,
            Self::SerializationError { .. } => ErrorKind::Serialization,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns the path the error is attributed to, if it has one.
    ///
    /// For import failures this is the importing module; for cyclic moves
    /// it is the source of the move.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::PathNotFound { path }
            | Self::PathConflict { path }
            | Self::AmbiguousEdit { path, .. }
            | Self::TransformSyntaxError { path, .. }
            | Self::InvalidPath { path, .. }
            | Self::NotADirectory { path }
            | Self::IsADirectory { path } => Some(path.as_str()),
            Self::CyclicMove { from, .. } => Some(from.as_str()),
            Self::UnresolvedImport { importer, .. } => Some(importer.as_str()),
            Self::SandboxRuntimeError { module, .. } => module.as_deref(),
            Self::StepLimitExceeded { .. }
            | Self::ConfigError { .. }
            | Self::SerializationError { .. }
            | Self::Cancelled { .. } => None,
        }
    }

    /// Returns `true` if this is a path not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::Error;
    ///
    /// let err = Error::PathNotFound {
    ///     path: "/missing.jsx".to_string(),
    /// };
    /// assert!(err.is_not_found());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }

    /// Returns `true` if this is a path conflict error.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::PathConflict { .. })
    }

    /// Returns `true` if this is a cyclic move error.
    #[must_use]
    pub const fn is_cyclic_move(&self) -> bool {
        matches!(self, Self::CyclicMove { .. })
    }

    /// Returns `true` if this is an ambiguous edit error.
    #[must_use]
    pub const fn is_ambiguous_edit(&self) -> bool {
        matches!(self, Self::AmbiguousEdit { .. })
    }

    /// Returns `true` if this is a transform syntax error.
    #[must_use]
    pub const fn is_syntax_error(&self) -> bool {
        matches!(self, Self::TransformSyntaxError { .. })
    }

    /// Returns `true` if this is an unresolved import error.
    #[must_use]
    pub const fn is_unresolved_import(&self) -> bool {
        matches!(self, Self::UnresolvedImport { .. })
    }

    /// Returns `true` if this is a sandbox runtime error.
    #[must_use]
    pub const fn is_sandbox_error(&self) -> bool {
        matches!(self, Self::SandboxRuntimeError { .. })
    }

    /// Returns `true` if this is a step limit error.
    #[must_use]
    pub const fn is_step_limit(&self) -> bool {
        matches!(self, Self::StepLimitExceeded { .. })
    }

    /// Returns `true` if the error was caused by a malformed path.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::Error;
    ///
    /// let err = Error::InvalidPath {
    ///     path: "../escape".to_string(),
    ///     reason: "must be absolute".to_string(),
    /// };
    /// assert!(err.is_invalid_path());
    /// ```
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// Result type alias for studio operations.
pub type Result<T> = std::result::Result<T, Error>;
