//! Configuration types for Component Studio.
//!
//! Configuration is split into three sections mirroring the pipeline:
//! command execution, module linking, and preview rendering. Each section
//! deserializes from TOML with defaults for every field.
//!
//! # Examples
//!
//! ```
//! use studio_core::{ExecutionMode, StudioConfig};
//!
//! let config = StudioConfig::default();
//! assert_eq!(config.executor.mode, ExecutionMode::Full);
//! assert_eq!(config.executor.step_limit(), 40);
//! assert_eq!(config.linker.entry, "/App.jsx");
//!
//! let parsed = StudioConfig::from_toml_str(r#"
//! [executor]
//! mode = "constrained"
//! "#).unwrap();
//! assert_eq!(parsed.executor.step_limit(), 4);
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name used under the platform config dir.
const CONFIG_DIR_NAME: &str = "component-studio";

/// Default config file name.
const CONFIG_FILE_NAME: &str = "studio.toml";

/// Command budget mode for a conversation turn.
///
/// The constrained mode pairs with deterministic providers and keeps turns
/// short; the full mode allows long multi-file edits.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Small step ceiling (4 commands per turn).
    Constrained,
    /// Large step ceiling (40 commands per turn).
    #[default]
    Full,
}

impl ExecutionMode {
    /// Returns the default per-turn command ceiling for this mode.
    #[must_use]
    pub const fn default_step_limit(self) -> usize {
        match self {
            Self::Constrained => 4,
            Self::Full => 40,
        }
    }
}

/// Tool executor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Budget mode.
    pub mode: ExecutionMode,

    /// Explicit step ceiling overriding the mode default.
    pub max_steps: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Full,
            max_steps: None,
        }
    }
}

impl ExecutorConfig {
    /// Returns the effective per-turn command ceiling.
    #[must_use]
    pub fn step_limit(&self) -> usize {
        self.max_steps
            .unwrap_or_else(|| self.mode.default_step_limit())
    }
}

/// Module resolution configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Entry module path.
    pub entry: String,

    /// Import prefix mapped to the VFS root.
    pub alias: String,

    /// Source extensions tried in priority order.
    pub extensions: Vec<String>,

    /// Resolve directory specifiers to `<dir>/index.<ext>`.
    pub index_files: bool,

    /// Rewrite import specifiers in importers when a file is renamed.
    pub rewrite_imports_on_rename: bool,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            entry: "/App.jsx".to_string(),
            alias: "@/".to_string(),
            extensions: vec![
                ".jsx".to_string(),
                ".js".to_string(),
                ".tsx".to_string(),
                ".ts".to_string(),
            ],
            index_files: true,
            rewrite_imports_on_rename: false,
        }
    }
}

/// Privileges granted to the preview document.
///
/// Top-level navigation and same-origin access (which would expose host
/// storage) are never granted; only the flags below are configurable.
///
/// # Examples
///
/// ```
/// use studio_core::SandboxPolicy;
///
/// let strict = SandboxPolicy::strict();
/// assert_eq!(strict.iframe_sandbox_attribute(), "allow-scripts");
///
/// let interactive = SandboxPolicy::interactive();
/// assert_eq!(
///     interactive.iframe_sandbox_attribute(),
///     "allow-scripts allow-forms allow-modals"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SandboxPolicy {
    /// Allow script execution (required to render anything).
    pub allow_scripts: bool,

    /// Allow form submission inside the preview.
    pub allow_forms: bool,

    /// Allow `alert`/`confirm`/`prompt`.
    pub allow_modals: bool,

    /// Allow the preview to open popups.
    pub allow_popups: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self::interactive()
    }
}

impl SandboxPolicy {
    /// Scripts only.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            allow_scripts: true,
            allow_forms: false,
            allow_modals: false,
            allow_popups: false,
        }
    }

    /// Scripts, forms, and modals. Used for interactive component previews.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            allow_scripts: true,
            allow_forms: true,
            allow_modals: true,
            allow_popups: false,
        }
    }

    /// Renders the policy as an iframe `sandbox` attribute value.
    #[must_use]
    pub fn iframe_sandbox_attribute(&self) -> String {
        let mut tokens = Vec::new();
        if self.allow_scripts {
            tokens.push("allow-scripts");
        }
        if self.allow_forms {
            tokens.push("allow-forms");
        }
        if self.allow_modals {
            tokens.push("allow-modals");
        }
        if self.allow_popups {
            tokens.push("allow-popups");
        }
        tokens.join(" ")
    }
}

/// Preview rendering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Base URL bare specifiers are forwarded to.
    pub external_cdn: String,

    /// Maximum time a sandbox may take to load an artifact.
    pub render_timeout_ms: u64,

    /// Heap available to the sandbox engine for one render, in MiB.
    pub memory_limit_mb: usize,

    /// Number of transformed modules kept in the LRU cache.
    pub transform_cache_capacity: usize,

    /// Privileges granted to the preview document.
    pub sandbox: SandboxPolicy,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            external_cdn: "https://esm.sh/".to_string(),
            render_timeout_ms: 5_000,
            memory_limit_mb: 64,
            transform_cache_capacity: 256,
            sandbox: SandboxPolicy::default(),
        }
    }
}

impl PreviewConfig {
    /// Returns the render timeout as a `Duration`.
    #[must_use]
    pub const fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    /// Returns the sandbox heap limit in bytes.
    #[must_use]
    pub const fn memory_limit_bytes(&self) -> usize {
        self.memory_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Complete studio configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Tool executor section.
    pub executor: ExecutorConfig,

    /// Linker section.
    pub linker: LinkerConfig,

    /// Preview section.
    pub preview: PreviewConfig,
}

impl StudioConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use studio_core::{ExecutionMode, StudioConfig};
    ///
    /// let config = StudioConfig::builder()
    ///     .mode(ExecutionMode::Constrained)
    ///     .max_steps(2)
    ///     .build();
    /// assert_eq!(config.executor.step_limit(), 2);
    /// ```
    #[must_use]
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::new()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the document is malformed or fails
    /// validation.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: format!("Failed to parse configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Returns the default configuration file location, if the platform has
    /// a config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the default configuration file, falling back to defaults when
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the file exists but is invalid.
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if:
    /// - The step ceiling is zero
    /// - The entry is not an absolute path with a configured extension
    /// - The alias is empty or relative-looking
    /// - An extension does not start with '.'
    /// - The cache capacity or render timeout is zero
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(Error::ConfigError {
                message: message.to_string(),
            })
        };

        if self.executor.step_limit() == 0 {
            return fail("Step limit must be greater than zero");
        }

        let linker = &self.linker;
        if !linker.entry.starts_with('/') || linker.entry.contains("..") {
            return fail("Entry must be an absolute path without '..'");
        }
        if linker.alias.is_empty() || linker.alias.starts_with('.') || linker.alias.starts_with('/')
        {
            return fail("Alias must be a non-empty bare prefix such as '@/'");
        }
        if linker.extensions.is_empty() {
            return fail("At least one source extension is required");
        }
        if let Some(ext) = linker.extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(Error::ConfigError {
                message: format!("Extension '{ext}' must start with '.'"),
            });
        }

        if self.preview.transform_cache_capacity == 0 {
            return fail("Transform cache capacity must be greater than zero");
        }
        if self.preview.render_timeout_ms == 0 {
            return fail("Render timeout must be greater than zero");
        }
        if self.preview.memory_limit_mb == 0 {
            return fail("Sandbox memory limit must be greater than zero");
        }
        if !self.preview.sandbox.allow_scripts {
            return fail("The preview sandbox must allow scripts");
        }

        Ok(())
    }
}

/// Builder for [`StudioConfig`].
#[derive(Debug, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution mode.
    #[must_use]
    pub const fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.executor.mode = mode;
        self
    }

    /// Overrides the step ceiling.
    #[must_use]
    pub const fn max_steps(mut self, steps: usize) -> Self {
        self.config.executor.max_steps = Some(steps);
        self
    }

    /// Sets the import alias prefix.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.config.linker.alias = alias.into();
        self
    }

    /// Enables or disables import rewriting on rename.
    #[must_use]
    pub const fn rewrite_imports_on_rename(mut self, enable: bool) -> Self {
        self.config.linker.rewrite_imports_on_rename = enable;
        self
    }

    /// Sets the external module CDN.
    #[must_use]
    pub fn external_cdn(mut self, cdn: impl Into<String>) -> Self {
        self.config.preview.external_cdn = cdn.into();
        self
    }

    /// Sets the render timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn render_timeout(mut self, timeout: Duration) -> Self {
        self.config.preview.render_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the sandbox policy.
    #[must_use]
    pub const fn sandbox(mut self, policy: SandboxPolicy) -> Self {
        self.config.preview.sandbox = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> StudioConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        assert!(StudioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mode_step_limits() {
        assert_eq!(ExecutionMode::Constrained.default_step_limit(), 4);
        assert_eq!(ExecutionMode::Full.default_step_limit(), 40);
    }

    #[test]
    fn test_max_steps_override() {
        let config = StudioConfig::builder()
            .mode(ExecutionMode::Constrained)
            .max_steps(9)
            .build();
        assert_eq!(config.executor.step_limit(), 9);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config = StudioConfig::builder().max_steps(0).build();
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StudioConfig::from_toml_str(
            r#"
            [linker]
            alias = "~/"

            [preview]
            render_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.linker.alias, "~/");
        assert_eq!(config.linker.entry, "/App.jsx");
        assert_eq!(config.preview.render_timeout(), Duration::from_millis(250));
        assert_eq!(config.executor.mode, ExecutionMode::Full);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = StudioConfig::from_toml_str("[executor\nmode=").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_zero_memory_limit_rejected() {
        let mut config = StudioConfig::default();
        config.preview.memory_limit_mb = 0;
        assert!(config.validate().unwrap_err().is_config_error());
        assert_eq!(PreviewConfig::default().memory_limit_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_relative_alias_rejected() {
        let config = StudioConfig::builder().alias("./src/").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extension_without_dot_rejected() {
        let mut config = StudioConfig::default();
        config.linker.extensions.push("mjs".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scripts_required() {
        let mut config = StudioConfig::default();
        config.preview.sandbox.allow_scripts = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[executor]\nmode = \"constrained\"\nmax_steps = 3").unwrap();

        let config = StudioConfig::load(file.path()).unwrap();
        assert_eq!(config.executor.mode, ExecutionMode::Constrained);
        assert_eq!(config.executor.step_limit(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StudioConfig::load("/definitely/not/here/studio.toml").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_sandbox_attribute_never_grants_navigation() {
        let attr = SandboxPolicy::interactive().iframe_sandbox_attribute();
        assert!(!attr.contains("allow-top-navigation"));
        assert!(!attr.contains("allow-same-origin"));
    }
}
