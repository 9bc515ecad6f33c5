//! Import specifier resolution.
//!
//! Three kinds of specifiers are recognized:
//!
//! - alias specifiers (`@/components/Button`) are rooted at `/`;
//! - relative specifiers (`./Button`, `../lib/util`) are rooted at the
//!   importing module's directory;
//! - anything else (`react`, `lodash/debounce`) is external and passed
//!   through untouched.
//!
//! Local specifiers are looked up in a fixed order: the path as written, then
//! each source extension, then `index.<ext>` inside the named directory.
//!
//! # Examples
//!
//! ```
//! use studio_core::LinkerConfig;
//! use studio_linker::{ImportTarget, Resolver};
//! use studio_vfs::{VfsBuilder, VfsPath};
//!
//! let vfs = VfsBuilder::new()
//!     .add_file("/components/Button.jsx", "export default () => null;")
//!     .build()
//!     .unwrap();
//! let resolver = Resolver::new(&LinkerConfig::default());
//! let importer = VfsPath::parse("/pages/deep/Home.jsx").unwrap();
//!
//! let target = resolver.resolve(&vfs, &importer, "@/components/Button").unwrap();
//! assert_eq!(target, ImportTarget::Module(VfsPath::parse("/components/Button.jsx").unwrap()));
//!
//! let external = resolver.resolve(&vfs, &importer, "react").unwrap();
//! assert_eq!(external, ImportTarget::External("react".to_string()));
//! ```

use crate::record::ImportTarget;
use studio_core::{Error, LinkerConfig, Result};
use studio_vfs::{Vfs, VfsPath};

const STYLE_EXTENSION: &str = ".css";

/// Outcome of probing one specifier, including the candidates that missed.
#[derive(Debug)]
pub(crate) struct Lookup {
    pub(crate) target: Result<ImportTarget>,
    pub(crate) missed: Vec<VfsPath>,
}

/// Resolves import specifiers against a VFS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    alias: String,
    extensions: Vec<String>,
    index_files: bool,
}

impl Resolver {
    /// Creates a resolver from linker configuration.
    #[must_use]
    pub fn new(config: &LinkerConfig) -> Self {
        Self {
            alias: config.alias.clone(),
            extensions: config.extensions.clone(),
            index_files: config.index_files,
        }
    }

    /// Alias prefix mapped to the VFS root.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns `true` if the specifier names a file in the VFS.
    #[must_use]
    pub fn is_local(&self, specifier: &str) -> bool {
        specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
            || self.is_alias(specifier)
    }

    fn is_alias(&self, specifier: &str) -> bool {
        specifier.starts_with(&self.alias)
    }

    /// Resolves `specifier` as written in `importer`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnresolvedImport` attributed to `importer` if a local
    /// specifier escapes the root or matches no file.
    pub fn resolve(&self, vfs: &Vfs, importer: &VfsPath, specifier: &str) -> Result<ImportTarget> {
        self.lookup(vfs, importer, specifier).target
    }

    /// Returns the path a local specifier names before any extension lookup.
    ///
    /// Returns `Ok(None)` for external specifiers.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnresolvedImport` if the specifier climbs above the
    /// root or produces an invalid path.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::LinkerConfig;
    /// use studio_linker::Resolver;
    /// use studio_vfs::VfsPath;
    ///
    /// let resolver = Resolver::new(&LinkerConfig::default());
    /// let importer = VfsPath::parse("/pages/Home.jsx").unwrap();
    /// let base = resolver.base_path(&importer, "../lib/./format").unwrap().unwrap();
    /// assert_eq!(base.as_str(), "/lib/format");
    /// assert!(resolver.base_path(&importer, "../../escape").is_err());
    /// ```
    pub fn base_path(&self, importer: &VfsPath, specifier: &str) -> Result<Option<VfsPath>> {
        let dir = importer.parent().unwrap_or_else(VfsPath::root);
        let (mut segments, rest): (Vec<&str>, &str) = if self.is_alias(specifier) {
            (Vec::new(), &specifier[self.alias.len()..])
        } else if self.is_local(specifier) {
            let segments = dir.as_str().split('/').filter(|s| !s.is_empty()).collect();
            (segments, specifier)
        } else {
            return Ok(None);
        };

        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(unresolved(importer, specifier));
                    }
                }
                name => segments.push(name),
            }
        }

        VfsPath::parse(format!("/{}", segments.join("/")))
            .map(Some)
            .map_err(|_| unresolved(importer, specifier))
    }

    /// Candidate files for a base path, in lookup order.
    #[must_use]
    pub fn candidates(&self, base: &VfsPath) -> Vec<VfsPath> {
        let mut candidates = Vec::with_capacity(1 + self.extensions.len() * 2);
        if !base.is_root() {
            candidates.push(base.clone());
            candidates.extend(
                self.extensions
                    .iter()
                    .filter_map(|ext| VfsPath::parse(format!("{base}{ext}")).ok()),
            );
        }
        if self.index_files {
            candidates.extend(
                self.extensions
                    .iter()
                    .filter_map(|ext| base.join(&format!("index{ext}")).ok()),
            );
        }
        candidates
    }

    pub(crate) fn lookup(&self, vfs: &Vfs, importer: &VfsPath, specifier: &str) -> Lookup {
        let base = match self.base_path(importer, specifier) {
            Ok(Some(base)) => base,
            Ok(None) => {
                return Lookup {
                    target: Ok(ImportTarget::External(specifier.to_string())),
                    missed: Vec::new(),
                };
            }
            Err(err) => {
                return Lookup {
                    target: Err(err),
                    missed: Vec::new(),
                };
            }
        };

        if base.extension() == Some(STYLE_EXTENSION) {
            return if vfs.is_file(&base) {
                Lookup {
                    target: Ok(ImportTarget::Style(base)),
                    missed: Vec::new(),
                }
            } else {
                Lookup {
                    target: Err(unresolved(importer, specifier)),
                    missed: vec![base],
                }
            };
        }

        let mut missed = Vec::new();
        for candidate in self.candidates(&base) {
            if vfs.is_file(&candidate) {
                return Lookup {
                    target: Ok(ImportTarget::Module(candidate)),
                    missed,
                };
            }
            missed.push(candidate);
        }
        Lookup {
            target: Err(unresolved(importer, specifier)),
            missed,
        }
    }

    /// Computes the specifier that keeps pointing at a moved target.
    ///
    /// `importer` and `target` are the locations before a move; `new_importer`
    /// and `new_target` are the locations after it. The rewritten specifier
    /// keeps the original style: alias specifiers stay alias specifiers,
    /// relative ones stay relative, and an omitted extension or index file
    /// stays omitted when the moved file keeps it. Returns `None` for
    /// external specifiers or when the specifier needs no change.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::LinkerConfig;
    /// use studio_linker::Resolver;
    /// use studio_vfs::VfsPath;
    ///
    /// let resolver = Resolver::new(&LinkerConfig::default());
    /// let app = VfsPath::parse("/App.jsx").unwrap();
    /// let old = VfsPath::parse("/components/Button.jsx").unwrap();
    /// let new = VfsPath::parse("/ui/Button.jsx").unwrap();
    ///
    /// let alias = resolver.respecify("@/components/Button", &app, &old, &app, &new);
    /// assert_eq!(alias.as_deref(), Some("@/ui/Button"));
    ///
    /// let relative = resolver.respecify("./components/Button.jsx", &app, &old, &app, &new);
    /// assert_eq!(relative.as_deref(), Some("./ui/Button.jsx"));
    /// ```
    #[must_use]
    pub fn respecify(
        &self,
        specifier: &str,
        importer: &VfsPath,
        target: &VfsPath,
        new_importer: &VfsPath,
        new_target: &VfsPath,
    ) -> Option<String> {
        let base = self.base_path(importer, specifier).ok()??;
        let suffix = target.as_str().strip_prefix(base.as_str())?;
        let new_base = new_target
            .as_str()
            .strip_suffix(suffix)
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or_else(|| new_target.as_str());

        let rewritten = if self.is_alias(specifier) {
            format!("{}{}", self.alias, &new_base[1..])
        } else {
            let from_dir = new_importer.parent().unwrap_or_else(VfsPath::root);
            relative_specifier(from_dir.as_str(), new_base)
        };
        let rewritten = if specifier.ends_with('/') && !rewritten.ends_with('/') {
            format!("{rewritten}/")
        } else {
            rewritten
        };
        (rewritten != specifier).then_some(rewritten)
    }
}

fn unresolved(importer: &VfsPath, specifier: &str) -> Error {
    Error::UnresolvedImport {
        importer: importer.to_string(),
        specifier: specifier.to_string(),
    }
}

/// Relative specifier from directory `from_dir` to absolute path `to`.
fn relative_specifier(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let ups = from.len() - common;
    let mut spec = if ups == 0 {
        "./".to_string()
    } else {
        "../".repeat(ups)
    };
    spec.push_str(&to[common..].join("/"));
    if spec.ends_with('/') && spec.len() > 2 {
        spec.pop();
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_vfs::VfsBuilder;

    fn path(p: &str) -> VfsPath {
        VfsPath::parse(p).unwrap()
    }

    fn fixture() -> Vfs {
        VfsBuilder::new()
            .add_file("/App.jsx", "")
            .add_file("/components/Button.jsx", "")
            .add_file("/components/Button.js", "")
            .add_file("/lib/format.ts", "")
            .add_file("/widgets/index.tsx", "")
            .add_file("/styles/app.css", "")
            .build()
            .unwrap()
    }

    #[test]
    fn test_extension_priority() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let target = resolver
            .resolve(&fixture(), &path("/App.jsx"), "./components/Button")
            .unwrap();
        assert_eq!(target, ImportTarget::Module(path("/components/Button.jsx")));
    }

    #[test]
    fn test_exact_path_wins() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let target = resolver
            .resolve(&fixture(), &path("/App.jsx"), "./components/Button.js")
            .unwrap();
        assert_eq!(target, ImportTarget::Module(path("/components/Button.js")));
    }

    #[test]
    fn test_parent_relative() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let target = resolver
            .resolve(&fixture(), &path("/components/Button.jsx"), "../lib/format")
            .unwrap();
        assert_eq!(target, ImportTarget::Module(path("/lib/format.ts")));
    }

    #[test]
    fn test_index_file() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let vfs = fixture();
        let target = resolver.resolve(&vfs, &path("/App.jsx"), "@/widgets").unwrap();
        assert_eq!(target, ImportTarget::Module(path("/widgets/index.tsx")));

        let config = LinkerConfig {
            index_files: false,
            ..LinkerConfig::default()
        };
        let err = Resolver::new(&config)
            .resolve(&vfs, &path("/App.jsx"), "@/widgets")
            .unwrap_err();
        assert!(err.is_unresolved_import());
    }

    #[test]
    fn test_stylesheet() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let vfs = fixture();
        let target = resolver
            .resolve(&vfs, &path("/App.jsx"), "./styles/app.css")
            .unwrap();
        assert_eq!(target, ImportTarget::Style(path("/styles/app.css")));

        let lookup = resolver.lookup(&vfs, &path("/App.jsx"), "./styles/missing.css");
        assert!(lookup.target.is_err());
        assert_eq!(lookup.missed, vec![path("/styles/missing.css")]);
    }

    #[test]
    fn test_unresolved_attributed_to_importer() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let err = resolver
            .resolve(&fixture(), &path("/App.jsx"), "./Missing")
            .unwrap_err();
        assert_eq!(err.path(), Some("/App.jsx"));
    }

    #[test]
    fn test_lookup_records_misses() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let lookup = resolver.lookup(&fixture(), &path("/App.jsx"), "./lib/format");
        assert_eq!(lookup.target.unwrap(), ImportTarget::Module(path("/lib/format.ts")));
        assert_eq!(
            lookup.missed,
            vec![
                path("/lib/format"),
                path("/lib/format.jsx"),
                path("/lib/format.js"),
                path("/lib/format.tsx"),
            ]
        );
    }

    #[test]
    fn test_bare_specifiers_are_external() {
        let resolver = Resolver::new(&LinkerConfig::default());
        for spec in ["react", "react-dom/client", "@scope/pkg", "/absolute"] {
            let target = resolver.resolve(&fixture(), &path("/App.jsx"), spec).unwrap();
            assert_eq!(target, ImportTarget::External(spec.to_string()));
        }
    }

    #[test]
    fn test_base_path_from_nested_importer() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let importer = path("/pages/admin/Users.jsx");
        let base = |spec: &str| resolver.base_path(&importer, spec).unwrap();

        assert_eq!(base("./Row"), Some(path("/pages/admin/Row")));
        assert_eq!(base("../../lib/format"), Some(path("/lib/format")));
        assert_eq!(base("@/lib/format"), Some(path("/lib/format")));
        assert_eq!(base("react"), None);
        assert!(resolver.base_path(&importer, "../../../x").is_err());
        assert!(resolver.base_path(&path("/App.jsx"), "../x").is_err());
    }

    #[test]
    fn test_relative_specifier() {
        assert_eq!(relative_specifier("/", "/a/b.jsx"), "./a/b.jsx");
        assert_eq!(relative_specifier("/a", "/a/b.jsx"), "./b.jsx");
        assert_eq!(relative_specifier("/a/b", "/c.jsx"), "../../c.jsx");
        assert_eq!(relative_specifier("/a/b", "/a/c/d"), "../c/d");
    }

    #[test]
    fn test_respecify_index_and_moved_importer() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let rewritten = resolver.respecify(
            "./widgets",
            &path("/App.jsx"),
            &path("/widgets/index.tsx"),
            &path("/App.jsx"),
            &path("/ui/index.tsx"),
        );
        assert_eq!(rewritten.as_deref(), Some("./ui"));

        let rewritten = resolver.respecify(
            "../lib/format",
            &path("/components/Button.jsx"),
            &path("/lib/format.ts"),
            &path("/components/forms/Button.jsx"),
            &path("/lib/format.ts"),
        );
        assert_eq!(rewritten.as_deref(), Some("../../lib/format"));
    }

    #[test]
    fn test_respecify_changed_extension_spells_it_out() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let rewritten = resolver.respecify(
            "./Button",
            &path("/App.jsx"),
            &path("/Button.jsx"),
            &path("/App.jsx"),
            &path("/Button.tsx"),
        );
        assert_eq!(rewritten.as_deref(), Some("./Button.tsx"));
    }

    #[test]
    fn test_respecify_unchanged_is_none() {
        let resolver = Resolver::new(&LinkerConfig::default());
        let app = path("/App.jsx");
        let button = path("/components/Button.jsx");
        assert!(
            resolver
                .respecify("@/components/Button", &app, &button, &path("/pages/App.jsx"), &button)
                .is_none()
        );
    }
}
