//! The tool command protocol.
//!
//! Commands travel as tagged records, `{"name": ..., "args": {...}}`, and
//! every command is answered with a [`ToolResponse`], `{"ok": ..., "message": ...}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use studio_core::{Error, ErrorKind, Result};

/// A structured edit instruction.
///
/// # Examples
///
/// ```
/// use studio_tools::ToolCommand;
///
/// let json = r#"{"name":"edit_file",
///     "args":{"path":"/App.jsx","oldFragment":"Hi","newFragment":"Hello"}}"#;
/// let command: ToolCommand = serde_json::from_str(json).unwrap();
/// assert_eq!(
///     command,
///     ToolCommand::EditFile {
///         path: "/App.jsx".to_string(),
///         old_fragment: "Hi".to_string(),
///         new_fragment: "Hello".to_string(),
///     }
/// );
/// assert_eq!(command.name(), "edit_file");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "snake_case")]
pub enum ToolCommand {
    /// Creates a file. Fails if anything exists at `path`.
    CreateFile {
        /// Target path
        path: String,
        /// Initial content
        content: String,
    },

    /// Replaces the single occurrence of `old_fragment`.
    #[serde(rename_all = "camelCase")]
    EditFile {
        /// File to edit
        path: String,
        /// Text that must occur exactly once
        old_fragment: String,
        /// Replacement text
        new_fragment: String,
    },

    /// Deletes a file, or a directory with everything below it.
    DeleteFile {
        /// Entry to delete
        path: String,
    },

    /// Renames or moves a file or directory.
    RenameOrMove {
        /// Current path
        from: String,
        /// New path
        to: String,
    },

    /// Shows a file with line numbers, or lists a directory.
    ViewFile {
        /// Entry to show
        path: String,
        /// Inclusive 1-based line range
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<[usize; 2]>,
    },

    /// Creates a directory and any missing ancestors.
    CreateDirectory {
        /// Directory path
        path: String,
    },

    /// Inserts text after a 1-based line; line 0 inserts at the top.
    InsertText {
        /// File to edit
        path: String,
        /// Line to insert after
        line: usize,
        /// Inserted text
        text: String,
    },
}

impl ToolCommand {
    /// Protocol name of the command.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateFile { .. } => "create_file",
            Self::EditFile { .. } => "edit_file",
            Self::DeleteFile { .. } => "delete_file",
            Self::RenameOrMove { .. } => "rename_or_move",
            Self::ViewFile { .. } => "view_file",
            Self::CreateDirectory { .. } => "create_directory",
            Self::InsertText { .. } => "insert_text",
        }
    }

    /// Every path the command names.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::CreateFile { path, .. }
            | Self::EditFile { path, .. }
            | Self::DeleteFile { path }
            | Self::ViewFile { path, .. }
            | Self::CreateDirectory { path }
            | Self::InsertText { path, .. } => vec![path.as_str()],
            Self::RenameOrMove { from, to } => vec![from.as_str(), to.as_str()],
        }
    }

    /// Returns `true` if the command never mutates the VFS.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::ViewFile { .. })
    }

    /// Parses a JSON array of commands.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the JSON is malformed.
    pub fn parse_batch(json: &str) -> Result<Vec<Self>> {
        serde_json::from_str(json).map_err(|e| Error::SerializationError {
            message: format!("Invalid tool command batch: {e}"),
            source: Some(e),
        })
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenameOrMove { from, to } => write!(f, "{} {from} -> {to}", self.name()),
            Self::CreateFile { path, .. }
            | Self::EditFile { path, .. }
            | Self::DeleteFile { path }
            | Self::ViewFile { path, .. }
            | Self::CreateDirectory { path }
            | Self::InsertText { path, .. } => write!(f, "{} {path}", self.name()),
        }
    }
}

/// The executor's answer to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the command was applied.
    pub ok: bool,
    /// Result text or failure description.
    pub message: String,
    /// Failure classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ToolResponse {
    /// A successful response.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            error: None,
        }
    }

    /// A failed response describing `err`.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
            error: Some(err.kind()),
        }
    }
}

impl From<Result<String>> for ToolResponse {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(message) => Self::success(message),
            Err(err) => Self::failure(&err),
        }
    }
}
