//! Applies tool commands to the VFS.

use crate::command::{ToolCommand, ToolResponse};
use std::ops::Range;
use studio_core::{Error, LinkerConfig, Result, StudioConfig};
use studio_linker::Resolver;
use studio_transform::transform;
use studio_vfs::{EntryKind, Vfs, VfsPath};
use tracing::debug;

/// Applies [`ToolCommand`]s to a [`Vfs`], one atomic operation each.
///
/// Every path a command names is validated before the VFS is touched, and
/// every command either applies fully or leaves the VFS unchanged.
///
/// # Examples
///
/// ```
/// use studio_core::ErrorKind;
/// use studio_tools::{ToolCommand, ToolExecutor};
/// use studio_vfs::Vfs;
///
/// let executor = ToolExecutor::default();
/// let mut vfs = Vfs::new();
/// vfs.write("/App.jsx", "<p>Hi</p>\n<p>Hi</p>").unwrap();
///
/// let response = executor.execute(
///     &mut vfs,
///     &ToolCommand::EditFile {
///         path: "/App.jsx".to_string(),
///         old_fragment: "Hi".to_string(),
///         new_fragment: "Hello".to_string(),
///     },
/// );
/// assert!(!response.ok);
/// assert_eq!(response.error, Some(ErrorKind::AmbiguousEdit));
/// assert_eq!(vfs.read("/App.jsx").unwrap(), "<p>Hi</p>\n<p>Hi</p>");
/// ```
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    resolver: Resolver,
    module_extensions: Vec<String>,
    rewrite_imports_on_rename: bool,
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new(&LinkerConfig::default())
    }
}

impl ToolExecutor {
    /// Creates an executor using the linker's resolution rules.
    #[must_use]
    pub fn new(config: &LinkerConfig) -> Self {
        Self {
            resolver: Resolver::new(config),
            module_extensions: config.extensions.clone(),
            rewrite_imports_on_rename: config.rewrite_imports_on_rename,
        }
    }

    /// Creates an executor from the studio configuration.
    #[must_use]
    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(&config.linker)
    }

    /// Returns `true` if renames rewrite the imports that point at moved files.
    #[must_use]
    pub const fn rewrites_imports_on_rename(&self) -> bool {
        self.rewrite_imports_on_rename
    }

    /// Applies a command and reports the outcome as a response.
    pub fn execute(&self, vfs: &mut Vfs, command: &ToolCommand) -> ToolResponse {
        let result = self.apply(vfs, command);
        match &result {
            Ok(_) => debug!(command = %command, revision = %vfs.revision(), "command applied"),
            Err(err) => debug!(command = %command, error = %err, "command failed"),
        }
        ToolResponse::from(result)
    }

    /// Applies a command.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` for a malformed path before anything else
    /// is checked, then the command's own failure (`PathNotFound`,
    /// `PathConflict`, `CyclicMove`, `AmbiguousEdit`, `NotADirectory`,
    /// `IsADirectory`). The VFS is unchanged on error.
    pub fn apply(&self, vfs: &mut Vfs, command: &ToolCommand) -> Result<String> {
        for path in command.paths() {
            VfsPath::parse(path)?;
        }

        match command {
            ToolCommand::CreateFile { path, content } => {
                vfs.create_file(path, content.as_str())?;
                Ok(format!("Created {path} ({} lines)", content.lines().count()))
            }
            ToolCommand::EditFile {
                path,
                old_fragment,
                new_fragment,
            } => {
                edit(vfs, path, old_fragment, new_fragment)?;
                Ok(format!("Edited {path}"))
            }
            ToolCommand::DeleteFile { path } => {
                let removed = vfs.delete(path)?;
                Ok(match removed.len() {
                    1 => format!("Deleted {path}"),
                    n => format!("Deleted {path} and {} nested entries", n - 1),
                })
            }
            ToolCommand::RenameOrMove { from, to } => self.rename(vfs, from, to),
            ToolCommand::ViewFile { path, range } => view(vfs, path, *range),
            ToolCommand::CreateDirectory { path } => {
                vfs.create_dir(path)?;
                Ok(format!("Created directory {path}"))
            }
            ToolCommand::InsertText { path, line, text } => {
                insert(vfs, path, *line, text)?;
                Ok(format!(
                    "Inserted {} line(s) into {path} after line {line}",
                    text.lines().count().max(1)
                ))
            }
        }
    }

    fn rename(&self, vfs: &mut Vfs, from: &str, to: &str) -> Result<String> {
        if !self.rewrite_imports_on_rename {
            let moved = vfs.rename(from, to)?;
            return Ok(moved_message(from, to, moved.len(), 0));
        }

        let from_path = VfsPath::parse(from)?;
        let to_path = VfsPath::parse(to)?;
        let rewrites = self.plan_import_rewrites(vfs, &from_path, &to_path);
        let moved = vfs.transaction(|tx| {
            let moved = tx.rename(&from_path, &to_path)?;
            for (path, content) in &rewrites {
                tx.write(path, content.as_str())?;
            }
            Ok(moved)
        })?;
        Ok(moved_message(from, to, moved.len(), rewrites.len()))
    }

    /// Computes the post-rename content of every module whose imports point
    /// into, or out of, the moved subtree.
    ///
    /// Modules that do not parse are left alone.
    fn plan_import_rewrites(
        &self,
        vfs: &Vfs,
        from: &VfsPath,
        to: &VfsPath,
    ) -> Vec<(VfsPath, String)> {
        let mut rewrites = Vec::new();
        for (importer, file) in vfs.files() {
            if !self.is_module(importer) {
                continue;
            }
            let source = file.content();
            let Ok(output) = transform(importer.as_str(), source) else {
                continue;
            };
            let new_importer = importer.rebase(from, to).unwrap_or_else(|| importer.clone());

            let mut edits = Vec::new();
            for decl in &output.imports {
                let Some(span) = decl.source_span.clone() else {
                    continue;
                };
                let Ok(target) = self.resolver.resolve(vfs, importer, &decl.specifier) else {
                    continue;
                };
                let Some(target) = target.local_path() else {
                    continue;
                };
                let new_target = target.rebase(from, to).unwrap_or_else(|| target.clone());
                if new_importer == *importer && new_target == *target {
                    continue;
                }
                if let Some(specifier) = self.resolver.respecify(
                    &decl.specifier,
                    importer,
                    target,
                    &new_importer,
                    &new_target,
                ) {
                    let quote = &source[span.start..=span.start];
                    edits.push((span, format!("{quote}{specifier}{quote}")));
                }
            }
            if !edits.is_empty() {
                debug!(importer = %importer, edits = edits.len(), "rewriting imports for rename");
                rewrites.push((new_importer, splice(source, edits)));
            }
        }
        rewrites
    }

    fn is_module(&self, path: &VfsPath) -> bool {
        self.module_extensions
            .iter()
            .any(|ext| path.as_str().ends_with(ext.as_str()))
    }
}

fn edit(vfs: &mut Vfs, path: &str, old_fragment: &str, new_fragment: &str) -> Result<()> {
    let content = vfs.read(path)?;
    let occurrences = content.matches(old_fragment).take(2).count();
    if occurrences != 1 {
        return Err(Error::AmbiguousEdit {
            path: path.to_string(),
            occurrences,
        });
    }
    let updated = content.replacen(old_fragment, new_fragment, 1);
    vfs.write(path, updated)
}

fn insert(vfs: &mut Vfs, path: &str, line: usize, text: &str) -> Result<()> {
    let content = vfs.read(path)?;
    let offset: usize = content.split_inclusive('\n').take(line).map(str::len).sum();

    let mut inserted = String::with_capacity(text.len() + 2);
    if offset > 0 && !content[..offset].ends_with('\n') {
        inserted.push('\n');
    }
    inserted.push_str(text);
    if offset < content.len() && !text.ends_with('\n') {
        inserted.push('\n');
    }

    let updated = format!("{}{inserted}{}", &content[..offset], &content[offset..]);
    vfs.write(path, updated)
}

fn view(vfs: &Vfs, path: &str, range: Option<[usize; 2]>) -> Result<String> {
    if vfs.is_dir(path) {
        let entries = vfs.list(path)?;
        if entries.is_empty() {
            return Ok(format!("{path} is empty"));
        }
        let listing: Vec<String> = entries
            .iter()
            .map(|entry| {
                let name = entry.path.file_name().unwrap_or_default();
                match entry.kind {
                    EntryKind::Directory => format!("{name}/"),
                    EntryKind::File => name.to_string(),
                }
            })
            .collect();
        return Ok(listing.join("\n"));
    }

    let content = vfs.read(path)?;
    let [start, end] = range.unwrap_or([1, usize::MAX]);
    let numbered: Vec<String> = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(number, _)| *number >= start && *number <= end)
        .map(|(number, line)| format!("{number:>5}\t{line}"))
        .collect();
    if numbered.is_empty() {
        return Ok(format!("{path}: no lines in range"));
    }
    Ok(numbered.join("\n"))
}

fn moved_message(from: &str, to: &str, entries: usize, rewritten: usize) -> String {
    let mut message = format!("Moved {from} to {to}");
    if entries > 1 {
        message.push_str(&format!(" ({entries} entries)"));
    }
    if rewritten > 0 {
        message.push_str(&format!("; updated imports in {rewritten} file(s)"));
    }
    message
}

fn splice(source: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(source.len());
    let mut copied = 0;
    for (range, text) in edits {
        out.push_str(&source[copied..range.start]);
        out.push_str(&text);
        copied = range.end;
    }
    out.push_str(&source[copied..]);
    out
}
