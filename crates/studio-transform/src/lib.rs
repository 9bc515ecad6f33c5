//! Per-module source transformation for Component Studio.
//!
//! [`transform`] turns one file's source into code a browser can execute
//! directly. The source is parsed with `oxc`, JSX is lowered to classic
//! `createElement` calls on a namespace import of the `react` runtime,
//! TypeScript syntax is stripped, and the result is printed back out.
//! Alongside the code it reports every import and export so the linker
//! never needs to re-parse.
//!
//! The transformation is a pure function of `(path, source)`; the same input
//! always yields byte-identical output.
//!
//! # Examples
//!
//! ```
//! use studio_transform::transform;
//!
//! let source = r#"import Button from "@/components/Button";
//! export default function App() {
//!   return <main className="app"><Button label="Go" /></main>;
//! }"#;
//!
//! let output = transform("/App.jsx", source).unwrap();
//! assert!(output.code.contains(r#"__jsx.createElement("main""#));
//! assert_eq!(output.import_specifiers(), vec!["@/components/Button"]);
//! assert!(output.exports.has_default);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod module;
mod scan;

pub use module::{
    ExportSummary, ImportBindings, ImportDecl, ImportKind, NamedImport, TransformOutput,
};

use oxc::allocator::Allocator;
use oxc::codegen::Codegen;
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::{Parser, ParserReturn};
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{JsxOptions, JsxRuntime, TransformOptions, Transformer, TypeScriptOptions};
use scan::{DynamicImport, ModuleSyntax};
use std::path::Path;
use studio_core::{Error, Result};

/// Module the JSX runtime is imported from.
pub const JSX_RUNTIME: &str = "react";

/// Local namespace the JSX runtime is bound to in transformed modules.
pub const JSX_NAMESPACE: &str = "__jsx";

/// Statement prepended, on its own line, to modules that contain JSX.
pub const RUNTIME_PRELUDE: &str = "import * as __jsx from \"react\";";

/// Transforms one module.
///
/// JSX is recognized in every file except plain `.ts` files, where `<` is a
/// type-assertion or generic bracket. `.ts` and `.tsx` files have their type
/// syntax removed; type-only imports disappear from the output.
///
/// # Errors
///
/// Returns `Error::TransformSyntaxError` with a 1-based line and column of
/// the first parse or lowering diagnostic.
///
/// # Examples
///
/// ```
/// use studio_transform::transform;
///
/// let err = transform("/Broken.jsx", "export default () => <div>;").unwrap_err();
/// assert!(err.is_syntax_error());
/// ```
pub fn transform(path: &str, source: &str) -> Result<TransformOutput> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type(path)).parse();
    if let Some(diagnostic) = parsed.errors.first() {
        return Err(syntax_error(path, source, diagnostic));
    }
    let written = scan_parsed(&parsed);
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let lowered = Transformer::new(&allocator, Path::new(path), &transform_options())
        .build_with_scoping(scoping, &mut program);
    if let Some(diagnostic) = lowered.errors.first() {
        return Err(syntax_error(path, source, diagnostic));
    }
    let generated = Codegen::new().build(&program).code;

    // The printed module is parsed again so spans refer to the emitted code.
    let emitted_allocator = Allocator::default();
    let reparsed = Parser::new(&emitted_allocator, &generated, SourceType::mjs()).parse();
    if let Some(diagnostic) = reparsed.errors.first() {
        return Err(syntax_error(path, &generated, diagnostic));
    }
    let emitted = scan_parsed(&reparsed);

    let has_jsx = generated.contains(&format!("{JSX_NAMESPACE}."));
    let shift = if has_jsx { RUNTIME_PRELUDE.len() + 1 } else { 0 };
    let mut code = String::with_capacity(shift + generated.len());
    if has_jsx {
        code.push_str(RUNTIME_PRELUDE);
        code.push('\n');
    }
    code.push_str(&generated);

    let imports = pair_source_spans(emitted.imports, written.imports, shift);

    tracing::trace!(
        path,
        imports = imports.len(),
        has_jsx,
        "transformed module"
    );

    Ok(TransformOutput {
        code,
        imports,
        exports: emitted.exports,
        has_jsx,
    })
}

fn source_type(path: &str) -> SourceType {
    let typescript = path.ends_with(".ts") || path.ends_with(".tsx");
    let jsx = !path.ends_with(".ts");
    SourceType::mjs().with_typescript(typescript).with_jsx(jsx)
}

fn transform_options() -> TransformOptions {
    TransformOptions {
        jsx: JsxOptions {
            runtime: JsxRuntime::Classic,
            pragma: Some(format!("{JSX_NAMESPACE}.createElement")),
            pragma_frag: Some(format!("{JSX_NAMESPACE}.Fragment")),
            pure: false,
            ..JsxOptions::default()
        },
        typescript: TypeScriptOptions {
            only_remove_type_imports: true,
            ..TypeScriptOptions::default()
        },
        ..TransformOptions::default()
    }
}

fn scan_parsed(parsed: &ParserReturn<'_>) -> ModuleSyntax {
    let dynamic: Vec<_> = parsed
        .module_record
        .dynamic_imports
        .iter()
        .map(|import| DynamicImport {
            call: import.span,
            request: import.module_request,
        })
        .collect();
    scan::scan(&parsed.program, &dynamic)
}

/// Moves emitted spans past the prelude and links each emitted declaration
/// to the one written in the source with the same specifier.
fn pair_source_spans(
    emitted: Vec<ImportDecl>,
    mut written: Vec<ImportDecl>,
    shift: usize,
) -> Vec<ImportDecl> {
    emitted
        .into_iter()
        .map(|decl| {
            let dynamic = decl.kind == ImportKind::Dynamic;
            let source_span = written
                .iter()
                .position(|w| {
                    w.specifier == decl.specifier && (w.kind == ImportKind::Dynamic) == dynamic
                })
                .and_then(|i| written.remove(i).source_span);
            ImportDecl {
                source_span,
                span: decl.span.start + shift..decl.span.end + shift,
                statement_span: decl.statement_span.start + shift..decl.statement_span.end + shift,
                ..decl
            }
        })
        .collect()
}

fn syntax_error(path: &str, source: &str, diagnostic: &OxcDiagnostic) -> Error {
    let offset = diagnostic
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset());
    let (line, column) = line_column(source, offset);
    Error::TransformSyntaxError {
        path: path.to_string(),
        line,
        column,
        message: diagnostic.message.to_string(),
    }
}

/// 1-based line and column (in characters) of a byte offset.
fn line_column(source: &str, pos: usize) -> (usize, usize) {
    let mut pos = pos.min(source.len());
    while !source.is_char_boundary(pos) {
        pos -= 1;
    }
    let before = &source[..pos];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = source[line_start..pos].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_module_keeps_its_code() {
        let source = "export const add = (a, b) => a + b;\n";
        let output = transform("/math.js", source).unwrap();
        assert!(output.code.contains("export const add = (a, b) => a + b;"));
        assert!(!output.has_jsx);
        assert_eq!(output.exports.names, vec!["add".to_string()]);
    }

    #[test]
    fn test_prelude_added_with_jsx() {
        let output = transform("/A.jsx", "export default () => <a />;").unwrap();
        assert!(output.code.starts_with(RUNTIME_PRELUDE));
        assert!(output.code.contains("__jsx.createElement(\"a\""));
        assert!(output.has_jsx);
        assert!(output.imports.is_empty());
    }

    #[test]
    fn test_fragments_use_runtime_namespace() {
        let output = transform("/F.jsx", "export default () => <><i /></>;").unwrap();
        assert!(output.code.contains("__jsx.Fragment"));
    }

    #[test]
    fn test_spans_in_code_and_source() {
        let source = "const x = <b />;\nimport y from './y';";
        let output = transform("/A.jsx", source).unwrap();
        let decl = &output.imports[0];
        let literal = &output.code[decl.span.clone()];
        assert_eq!(&literal[1..literal.len() - 1], "./y");
        assert_eq!(&source[decl.source_span.clone().unwrap()], "'./y'");
        assert!(output.code[decl.statement_span.clone()].starts_with("import y from"));
    }

    #[test]
    fn test_dynamic_import_paired_with_source() {
        let source = "import './a';\nexport const load = () => import('./a');\n";
        let output = transform("/lazy.js", source).unwrap();
        let spans: Vec<_> = output
            .imports
            .iter()
            .map(|d| (d.kind, &source[d.source_span.clone().unwrap()]))
            .collect();
        assert_eq!(
            spans,
            vec![(ImportKind::SideEffect, "'./a'"), (ImportKind::Dynamic, "'./a'")]
        );
        assert_ne!(output.imports[0].source_span, output.imports[1].source_span);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = transform("/Bad.jsx", "const a = 1;\nconst b = <div></span>;").unwrap_err();
        match err {
            Error::TransformSyntaxError {
                path, line, column, ..
            } => {
                assert_eq!(path, "/Bad.jsx");
                assert_eq!(line, 2);
                assert!(column > 10, "column {column}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_module_error_past_jsx() {
        let source = "const a = <p>hello</p>;\nimport { x from './x';";
        let err = transform("/Bad.jsx", source).unwrap_err();
        match err {
            Error::TransformSyntaxError { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ts_files_do_not_parse_jsx() {
        let source = "const id = <T,>(v: T) => v;\nexport default id;";
        let output = transform("/id.ts", source).unwrap();
        assert!(!output.has_jsx);
        assert!(!output.code.contains(": T"));
        assert!(output.exports.has_default);
    }

    #[test]
    fn test_type_only_imports_dropped() {
        let source = "import type { Props } from './types';\n\
                      import { helper } from './helper';\n\
                      export const run = (p: Props) => helper(p);\n";
        let output = transform("/run.ts", source).unwrap();
        assert_eq!(output.import_specifiers(), vec!["./helper"]);
        assert!(!output.code.contains("./types"));
    }

    #[test]
    fn test_line_column() {
        assert_eq!(line_column("abc", 0), (1, 1));
        assert_eq!(line_column("a\nbc", 3), (2, 2));
        assert_eq!(line_column("é\nx", 3), (2, 1));
    }
}
