//! Structured diagnostics.
//!
//! A [`Diagnostic`] is the cloneable, serializable summary of an [`Error`]
//! that outlives the operation which produced it. The linker attaches them to
//! bundles, the preview renderer reports sandbox failures with them, and the
//! tool executor folds them into command responses.

use crate::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reported problem, attributed to a path where possible.
///
/// # Examples
///
/// ```
/// use studio_core::{Diagnostic, Error, ErrorKind};
///
/// let err = Error::PathNotFound {
///     path: "/Missing.jsx".to_string(),
/// };
/// let diagnostic = Diagnostic::from(&err);
/// assert_eq!(diagnostic.kind, ErrorKind::PathNotFound);
/// assert_eq!(diagnostic.path.as_deref(), Some("/Missing.jsx"));
/// assert_eq!(diagnostic.to_string(), "PathNotFound: Path not found: /Missing.jsx");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Classification of the problem.
    pub kind: ErrorKind,
    /// Path the problem is attributed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(kind: ErrorKind, path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Returns `true` if the diagnostic is attributed to `path`.
    #[must_use]
    pub fn concerns(&self, path: &str) -> bool {
        self.path.as_deref() == Some(path)
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            path: err.path().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
