//! Types describing a transformed module.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How a module refers to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x from "m"`, `import { a } from "m"`, `import * as ns from "m"`.
    Static,
    /// `import "m"`.
    SideEffect,
    /// `export * from "m"`, `export { a } from "m"`.
    ReExport,
    /// `import("m")` with a string literal argument.
    Dynamic,
}

/// One `{ imported as local }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedImport {
    /// Name exported by the target module.
    pub imported: String,
    /// Name bound in the importing module (the exported name for re-exports).
    pub local: String,
}

/// Names an import declaration binds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBindings {
    /// Default import.
    pub default: Option<String>,
    /// Namespace import (`* as ns`).
    pub namespace: Option<String>,
    /// Named imports.
    pub named: Vec<NamedImport>,
}

impl ImportBindings {
    /// Export names this declaration requires from its target.
    pub fn required_exports(&self) -> impl Iterator<Item = &str> {
        self.default
            .as_ref()
            .map(|_| "default")
            .into_iter()
            .chain(self.named.iter().map(|n| n.imported.as_str()))
    }
}

/// An import or re-export declaration found in a module.
///
/// Spans are byte ranges covering the specifier string literal, quotes
/// included. Type-only imports are not reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// The specifier exactly as written.
    pub specifier: String,
    /// Declaration form.
    pub kind: ImportKind,
    /// Bound names.
    pub bindings: ImportBindings,
    /// Specifier literal in the transformed code.
    pub span: Range<usize>,
    /// Specifier literal in the original source, if the declaration was
    /// written there rather than emitted by the transform.
    pub source_span: Option<Range<usize>>,
    /// Whole statement in the transformed code, trailing `;` included.
    pub statement_span: Range<usize>,
}

/// What a module exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Whether the module has a default export.
    pub has_default: bool,
    /// Named exports in declaration order.
    pub names: Vec<String>,
    /// Specifiers re-exported wholesale with `export * from`.
    pub star_from: Vec<String>,
}

impl ExportSummary {
    pub(crate) fn add_name(&mut self, name: &str) {
        if name == "default" {
            self.has_default = true;
        } else if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
    }

    /// Returns `true` if the module itself declares `name`.
    ///
    /// Names reachable only through `export *` are not considered.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        if name == "default" {
            self.has_default
        } else {
            self.names.iter().any(|n| n == name)
        }
    }
}

/// Result of transforming one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Executable code with JSX expanded.
    pub code: String,
    /// Imports and re-exports in source order.
    pub imports: Vec<ImportDecl>,
    /// Export summary.
    pub exports: ExportSummary,
    /// Whether the source contained JSX (and the code imports the runtime).
    pub has_jsx: bool,
}

impl TransformOutput {
    /// Import specifiers in source order, as written.
    #[must_use]
    pub fn import_specifiers(&self) -> Vec<&str> {
        self.imports.iter().map(|d| d.specifier.as_str()).collect()
    }
}
