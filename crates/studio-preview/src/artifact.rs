//! Preview artifact assembly.
//!
//! An [`Artifact`] is a bundle packed into one self-contained HTML document.
//! Every module becomes a `data:` URL registered in an import map under a
//! `@vfs/<path>` key, and local import specifiers are rewritten to those
//! keys. External packages are mapped to the configured CDN. Stylesheets are
//! inlined as `<style>` blocks, and a module that failed to build is replaced
//! by a stub that throws its diagnostic when evaluated.
//!
//! Assembly is deterministic: the same bundle always produces byte-identical
//! HTML, so the document digest identifies a render.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use studio_core::{PreviewConfig, Revision};
use studio_linker::{Bundle, ImportTarget};
use studio_transform::{ExportSummary, ImportBindings, ImportKind};
use studio_vfs::VfsPath;

/// Prefix of the import-map keys that address VFS modules.
pub const MODULE_PREFIX: &str = "@vfs";

/// Packages the bootstrap script imports.
const BOOTSTRAP_PACKAGES: [&str; 2] = ["react", "react-dom/client"];

/// Message channel name used in `postMessage` payloads.
pub const MESSAGE_CHANNEL: &str = "component-studio";

const BOOTSTRAP: &str = r#"const channel = "__CHANNEL__";
const revision = __REVISION__;
const report = (error) => {
  const message = error && error.message ? error.message : String(error);
  const stack = (error && error.stack) || null;
  parent.postMessage({ channel, type: "error", revision, message, stack }, "*");
};
addEventListener("error", (event) => report(event.error ?? event.message));
addEventListener("unhandledrejection", (event) => report(event.reason));
try {
  const [{ createElement }, { createRoot }, entry] = await Promise.all([
    import("react"),
    import("react-dom/client"),
    import(__ENTRY_KEY__),
  ]);
  const App = entry.default;
  if (typeof App !== "function" && typeof App?.$$typeof !== "symbol") {
    throw new Error(__ENTRY_MESSAGE__);
  }
  createRoot(document.getElementById("root")).render(createElement(App));
  parent.postMessage({ channel, type: "rendered", revision }, "*");
} catch (error) {
  report(error);
}"#;

/// Returns the import-map key of a VFS module.
///
/// # Examples
///
/// ```
/// use studio_preview::module_key;
/// use studio_vfs::VfsPath;
///
/// let path = VfsPath::parse("/components/Button.jsx").unwrap();
/// assert_eq!(module_key(&path), "@vfs/components/Button.jsx");
/// ```
#[must_use]
pub fn module_key(path: &VfsPath) -> String {
    format!("{MODULE_PREFIX}{path}")
}

/// The browser import map embedded in a preview document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMap {
    /// Specifier to URL mapping.
    pub imports: BTreeMap<String, String>,
}

/// A self-contained HTML preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewDocument {
    /// The complete document.
    pub html: String,
    /// BLAKE3 digest of `html`, hex encoded.
    pub digest: String,
    /// Bundle revision the document was built from.
    pub revision: Revision,
    /// Value for the hosting iframe's `sandbox` attribute.
    pub sandbox: String,
}

impl PreviewDocument {
    /// Wraps the document in a sandboxed `<iframe srcdoc>` element.
    ///
    /// The iframe never receives `allow-same-origin` or
    /// `allow-top-navigation`, so the preview cannot reach host storage or
    /// navigate the host page.
    #[must_use]
    pub fn to_iframe(&self) -> String {
        format!(
            "<iframe title=\"Component preview\" sandbox=\"{}\" srcdoc=\"{}\"></iframe>",
            self.sandbox,
            escape_attribute(&self.html)
        )
    }
}

/// One import as the sandbox sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkedImport {
    pub(crate) specifier: String,
    pub(crate) kind: ImportKind,
    pub(crate) bindings: ImportBindings,
    /// Import-map key of a local module target.
    pub(crate) key: Option<String>,
}

/// A module packed into the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ModuleUnit {
    Linked {
        path: String,
        code: String,
        exports: ExportSummary,
        imports: Vec<LinkedImport>,
    },
    Stub {
        path: String,
        code: String,
        message: String,
    },
}

impl ModuleUnit {
    pub(crate) fn code(&self) -> &str {
        match self {
            Self::Linked { code, .. } | Self::Stub { code, .. } => code,
        }
    }
}

/// A bundle packed for delivery to a sandbox.
///
/// The artifact owns everything it references; nothing in it points back
/// into the host's VFS or graph.
///
/// # Examples
///
/// ```
/// use studio_core::{LinkerConfig, PreviewConfig};
/// use studio_linker::Linker;
/// use studio_preview::Artifact;
/// use studio_vfs::VfsBuilder;
///
/// let vfs = VfsBuilder::new()
///     .add_file("/App.jsx", "export default () => <h1>Hello</h1>;")
///     .build()
///     .unwrap();
/// let bundle = Linker::new(&LinkerConfig::default(), 8).unwrap().link(&vfs);
///
/// let artifact = Artifact::build(&bundle, &PreviewConfig::default());
/// assert!(artifact.import_map().imports.contains_key("@vfs/App.jsx"));
/// assert_eq!(artifact.import_map().imports["react"], "https://esm.sh/react");
/// assert!(artifact.document().html.contains(r#"<script type="importmap">"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    document: PreviewDocument,
    entry: String,
    entry_key: String,
    import_map: ImportMap,
    units: BTreeMap<String, ModuleUnit>,
    packages: BTreeMap<String, BTreeSet<String>>,
}

impl Artifact {
    /// Packs a bundle into a preview document.
    #[must_use]
    pub fn build(bundle: &Bundle, config: &PreviewConfig) -> Self {
        let mut imports = BTreeMap::new();
        let mut units = BTreeMap::new();
        let mut externals: BTreeSet<String> =
            BOOTSTRAP_PACKAGES.iter().map(ToString::to_string).collect();
        let mut stubs: BTreeMap<&VfsPath, BTreeSet<String>> = BTreeMap::new();
        let mut packages: BTreeMap<String, BTreeSet<String>> = BOOTSTRAP_PACKAGES
            .iter()
            .map(|name| ((*name).to_string(), BTreeSet::new()))
            .collect();

        for record in &bundle.modules {
            let mut edits = Vec::new();
            let mut linked = Vec::with_capacity(record.resolved_imports.len());

            for (decl, resolved) in record.output.imports.iter().zip(&record.resolved_imports) {
                let key = match &resolved.target {
                    ImportTarget::Module(path) => {
                        if bundle.is_failed(path) {
                            stubs.entry(path).or_default().extend(
                                decl.bindings
                                    .required_exports()
                                    .filter(|name| *name != "default")
                                    .map(str::to_string),
                            );
                        }
                        let key = module_key(path);
                        edits.push((decl.span.clone(), json_string(&key)));
                        Some(key)
                    }
                    ImportTarget::Style(_) => {
                        edits.push((decl.statement_span.clone(), style_binding(&decl.bindings)));
                        None
                    }
                    ImportTarget::External(specifier) => {
                        if !specifier.contains("://") {
                            externals.insert(specifier.clone());
                        }
                        packages.entry(decl.specifier.clone()).or_default().extend(
                            decl.bindings.required_exports().map(str::to_string),
                        );
                        None
                    }
                };
                linked.push(LinkedImport {
                    specifier: decl.specifier.clone(),
                    kind: decl.kind,
                    bindings: decl.bindings.clone(),
                    key,
                });
            }

            let code = apply_edits(&record.output.code, edits);
            let key = module_key(&record.path);
            imports.insert(key.clone(), data_url(&code));
            units.insert(
                key,
                ModuleUnit::Linked {
                    path: record.path.to_string(),
                    code,
                    exports: record.output.exports.clone(),
                    imports: linked,
                },
            );
        }

        for (path, names) in stubs {
            let message = bundle
                .failed
                .get(path)
                .map(|diagnostics| {
                    diagnostics
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();
            let key = module_key(path);
            let code = stub_source(&message, &names);
            imports.insert(key.clone(), data_url(&code));
            units.insert(
                key,
                ModuleUnit::Stub {
                    path: path.to_string(),
                    code,
                    message,
                },
            );
        }

        for specifier in externals {
            let url = cdn_url(&config.external_cdn, &specifier);
            imports.insert(specifier, url);
        }

        let import_map = ImportMap { imports };
        let entry_key = module_key(&bundle.entry);
        let html = render_html(bundle, &import_map, &entry_key, config);
        let document = PreviewDocument {
            digest: blake3::hash(html.as_bytes()).to_hex().to_string(),
            html,
            revision: bundle.revision,
            sandbox: config.sandbox.iframe_sandbox_attribute(),
        };

        Self {
            document,
            entry: bundle.entry.to_string(),
            entry_key,
            import_map,
            units,
            packages,
        }
    }

    /// The assembled document.
    #[must_use]
    pub const fn document(&self) -> &PreviewDocument {
        &self.document
    }

    /// Consumes the artifact, returning its document.
    #[must_use]
    pub fn into_document(self) -> PreviewDocument {
        self.document
    }

    /// Digest of the document.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.document.digest
    }

    /// Entry module path.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Import map embedded in the document.
    #[must_use]
    pub const fn import_map(&self) -> &ImportMap {
        &self.import_map
    }

    pub(crate) fn entry_key(&self) -> &str {
        &self.entry_key
    }

    pub(crate) fn unit(&self, key: &str) -> Option<&ModuleUnit> {
        self.units.get(key)
    }

    /// Modules by import-map key.
    pub(crate) fn units(&self) -> impl Iterator<Item = (&str, &ModuleUnit)> {
        self.units.iter().map(|(key, unit)| (key.as_str(), unit))
    }

    /// External specifiers as written, with the names importers require.
    pub(crate) fn packages(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.packages.iter().map(|(name, required)| (name.as_str(), required))
    }
}

fn render_html(
    bundle: &Bundle,
    import_map: &ImportMap,
    entry_key: &str,
    config: &PreviewConfig,
) -> String {
    let map_json = serde_json::to_string_pretty(import_map)
        .unwrap_or_else(|_| String::from("{\"imports\":{}}"))
        .replace("</", "<\\/");
    let entry_message = format!("{} must default-export a component", bundle.entry);
    let bootstrap = BOOTSTRAP
        .replace("__CHANNEL__", MESSAGE_CHANNEL)
        .replace("__REVISION__", &bundle.revision.get().to_string())
        .replace("__ENTRY_KEY__", &json_string(entry_key))
        .replace("__ENTRY_MESSAGE__", &json_string(&entry_message));

    let mut html = String::with_capacity(map_json.len() + bootstrap.len() + 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">\n",
        content_security_policy(&config.external_cdn)
    ));
    html.push_str("<title>Component preview</title>\n");
    for sheet in &bundle.styles {
        html.push_str(&format!(
            "<style data-path=\"{}\">\n{}\n</style>\n",
            escape_attribute(sheet.path.as_str()),
            sheet.content.replace("</style", "<\\/style")
        ));
    }
    html.push_str("<script type=\"importmap\">\n");
    html.push_str(&map_json);
    html.push_str("\n</script>\n</head>\n<body>\n");
    html.push_str("<div id=\"root\"></div>\n<script type=\"module\">\n");
    html.push_str(&bootstrap);
    html.push_str("\n</script>\n</body>\n</html>\n");
    html
}

fn content_security_policy(cdn: &str) -> String {
    let origin = origin_of(cdn);
    format!(
        "default-src 'none'; script-src 'unsafe-inline' data: {origin}; style-src 'unsafe-inline'; \
         img-src data: blob: https:; font-src data: https:; connect-src {origin}"
    )
}

fn origin_of(url: &str) -> &str {
    let Some(scheme_end) = url.find("://") else {
        return url;
    };
    let host_start = scheme_end + 3;
    url[host_start..]
        .find('/')
        .map_or(url, |pos| &url[..host_start + pos])
}

fn cdn_url(cdn: &str, specifier: &str) -> String {
    if cdn.ends_with('/') {
        format!("{cdn}{specifier}")
    } else {
        format!("{cdn}/{specifier}")
    }
}

fn data_url(code: &str) -> String {
    format!("data:text/javascript;base64,{}", STANDARD.encode(code))
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Replacement for a stylesheet import statement.
///
/// Stylesheets are injected into the document, so the import is dropped. A
/// binding it declared is kept as an empty object.
fn style_binding(bindings: &ImportBindings) -> String {
    bindings
        .default
        .as_ref()
        .or(bindings.namespace.as_ref())
        .map(|local| format!("const {local} = {{}};"))
        .unwrap_or_default()
}

fn stub_source(message: &str, names: &BTreeSet<String>) -> String {
    let mut code = format!(
        "throw new Error({});\nexport default undefined;\n",
        json_string(message)
    );
    for name in names {
        code.push_str(&format!("export const {name} = undefined;\n"));
    }
    code
}

fn apply_edits(code: &str, mut edits: Vec<(Range<usize>, String)>) -> String {
    edits.sort_by_key(|(range, _)| range.start);
    let mut out = String::with_capacity(code.len());
    let mut copied = 0;
    for (range, text) in edits {
        out.push_str(&code[copied..range.start]);
        out.push_str(&text);
        copied = range.end;
    }
    out.push_str(&code[copied..]);
    out
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
