//! Module declaration scanning.
//!
//! Reads the top-level `import` and `export` statements of a parsed program,
//! plus the `import()` calls listed in its module record, and records the
//! spans the linker needs to rewrite specifiers in place.

use crate::module::{ExportSummary, ImportBindings, ImportDecl, ImportKind, NamedImport};
use oxc::ast::ast::{Declaration, ImportDeclarationSpecifier, Program, Statement, StringLiteral};
use oxc::span::Span;
use std::ops::Range;

/// A dynamic `import()` call: the whole call and its argument.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DynamicImport {
    pub call: Span,
    pub request: Span,
}

#[derive(Debug, Default)]
pub(crate) struct ModuleSyntax {
    pub imports: Vec<ImportDecl>,
    pub exports: ExportSummary,
}

impl ModuleSyntax {
    fn push(
        &mut self,
        specifier: &StringLiteral<'_>,
        kind: ImportKind,
        bindings: ImportBindings,
        statement: Span,
    ) {
        let span = range(specifier.span);
        self.imports.push(ImportDecl {
            specifier: specifier.value.to_string(),
            kind,
            bindings,
            source_span: Some(span.clone()),
            span,
            statement_span: range(statement),
        });
    }
}

/// Collects the module declarations of `program`.
///
/// Spans are relative to the program's source text. Type-only imports and
/// exports are skipped; they have no runtime binding.
pub(crate) fn scan(program: &Program<'_>, dynamic_imports: &[DynamicImport]) -> ModuleSyntax {
    let mut module = ModuleSyntax::default();

    for statement in &program.body {
        match statement {
            Statement::ImportDeclaration(decl) if !decl.import_kind.is_type() => {
                let mut bindings = ImportBindings::default();
                for specifier in decl.specifiers.iter().flatten() {
                    match specifier {
                        ImportDeclarationSpecifier::ImportSpecifier(named) => {
                            if !named.import_kind.is_type() {
                                bindings.named.push(NamedImport {
                                    imported: named.imported.name().to_string(),
                                    local: named.local.name.to_string(),
                                });
                            }
                        }
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            bindings.default = Some(default.local.name.to_string());
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(namespace) => {
                            bindings.namespace = Some(namespace.local.name.to_string());
                        }
                    }
                }
                let kind = if decl.specifiers.is_some() {
                    ImportKind::Static
                } else {
                    ImportKind::SideEffect
                };
                module.push(&decl.source, kind, bindings, decl.span);
            }
            Statement::ExportAllDeclaration(decl) if !decl.export_kind.is_type() => {
                let mut bindings = ImportBindings::default();
                if let Some(exported) = &decl.exported {
                    let name = exported.name().to_string();
                    module.exports.add_name(&name);
                    bindings.namespace = Some(name);
                } else {
                    module.exports.star_from.push(decl.source.value.to_string());
                }
                module.push(&decl.source, ImportKind::ReExport, bindings, decl.span);
            }
            Statement::ExportNamedDeclaration(decl) if !decl.export_kind.is_type() => {
                let mut named = Vec::with_capacity(decl.specifiers.len());
                for specifier in decl.specifiers.iter().filter(|s| !s.export_kind.is_type()) {
                    let exported = specifier.exported.name().to_string();
                    module.exports.add_name(&exported);
                    named.push(NamedImport {
                        imported: specifier.local.name().to_string(),
                        local: exported,
                    });
                }
                if let Some(declaration) = &decl.declaration {
                    for name in declared_names(declaration) {
                        module.exports.add_name(&name);
                    }
                }
                if let Some(source) = &decl.source {
                    let bindings = ImportBindings {
                        named,
                        ..ImportBindings::default()
                    };
                    module.push(source, ImportKind::ReExport, bindings, decl.span);
                }
            }
            Statement::ExportDefaultDeclaration(_) => module.exports.has_default = true,
            _ => {}
        }
    }

    for dynamic in dynamic_imports {
        let request = range(dynamic.request);
        let Some(specifier) = program
            .source_text
            .get(request.clone())
            .and_then(string_literal_value)
        else {
            continue;
        };
        module.imports.push(ImportDecl {
            specifier: specifier.to_string(),
            kind: ImportKind::Dynamic,
            bindings: ImportBindings::default(),
            source_span: Some(request.clone()),
            span: request,
            statement_span: range(dynamic.call),
        });
    }

    module.imports.sort_by_key(|decl| decl.span.start);
    module
}

/// Runtime names bound by an exported declaration.
fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(variables) if !variables.declare => variables
            .declarations
            .iter()
            .flat_map(|declarator| declarator.id.get_binding_identifiers())
            .map(|ident| ident.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(function) if !function.declare => function
            .id
            .iter()
            .map(|ident| ident.name.to_string())
            .collect(),
        Declaration::ClassDeclaration(class) if !class.declare => {
            class.id.iter().map(|ident| ident.name.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

/// Value of a plain string literal argument such as `'./Lazy'`.
///
/// Template literals and computed arguments have no static specifier.
fn string_literal_value(text: &str) -> Option<&str> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = text.strip_prefix(quote)?.strip_suffix(quote)?;
    (!inner.contains(['\\', quote])).then_some(inner)
}

pub(crate) const fn range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}
