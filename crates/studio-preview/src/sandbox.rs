//! Sandboxed artifact loading.
//!
//! A [`Sandbox`] receives an owned [`Artifact`] and reports whether its
//! entry module can be loaded and rendered. Delivery is one-directional: the
//! sandbox gets a shared, immutable artifact and returns a report or an
//! error, and it never touches the VFS or the host's graph.
//!
//! [`IsolatedSandbox`] loads in two passes. It first links the module graph
//! the way an ES module loader does: every statically imported binding must
//! be exported by its target, possibly through `export *` chains, and the
//! entry must have a default export. It then evaluates the artifact in a
//! fresh QuickJS runtime, renders the entry's default export once, and
//! reports anything thrown along the way.

use crate::artifact::{Artifact, MODULE_PREFIX, ModuleUnit};
use crate::runtime;
use async_trait::async_trait;
use rquickjs::loader::{BuiltinLoader, BuiltinResolver};
use rquickjs::{CatchResultExt, CaughtError, Context, Module, Runtime};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use studio_core::{Error, PreviewConfig, Result};
use studio_transform::ImportKind;
use tracing::debug;

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SandboxReport {
    /// Digest of the loaded document.
    pub digest: String,
    /// Modules evaluated before the entry rendered.
    pub modules_evaluated: usize,
    /// Load time in microseconds.
    pub elapsed_us: u64,
}

/// An isolated execution environment for preview artifacts.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use std::sync::Arc;
/// use studio_core::Result;
/// use studio_preview::{Artifact, Sandbox, SandboxReport};
///
/// #[derive(Debug)]
/// struct AcceptAll;
///
/// #[async_trait]
/// impl Sandbox for AcceptAll {
///     async fn load(&self, artifact: Arc<Artifact>) -> Result<SandboxReport> {
///         Ok(SandboxReport {
///             digest: artifact.digest().to_string(),
///             modules_evaluated: 0,
///             elapsed_us: 0,
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Sandbox: Send + Sync + fmt::Debug {
    /// Loads an artifact and invokes its entry module.
    ///
    /// # Errors
    ///
    /// Returns `Error::SandboxRuntimeError` if loading or rendering fails.
    async fn load(&self, artifact: Arc<Artifact>) -> Result<SandboxReport>;
}

/// Resource limits for one sandbox evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    /// Wall-clock budget; evaluation is interrupted once it runs out.
    pub timeout: Duration,
    /// Engine heap limit in bytes.
    pub memory_bytes: usize,
    /// Engine stack limit in bytes.
    pub stack_bytes: usize,
}

impl SandboxLimits {
    const DEFAULT: Self = Self {
        timeout: Duration::from_secs(5),
        memory_bytes: 64 * 1024 * 1024,
        stack_bytes: 1024 * 1024,
    };

    /// Limits taken from the preview configuration.
    #[must_use]
    pub const fn from_config(config: &PreviewConfig) -> Self {
        Self {
            timeout: config.render_timeout(),
            memory_bytes: config.memory_limit_bytes(),
            ..Self::DEFAULT
        }
    }
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sandbox that evaluates artifacts in an embedded JavaScript engine.
///
/// Each load gets its own engine runtime on a blocking worker thread and
/// sees only the artifact it was handed. Packages are replaced by inert
/// stand-ins, so nothing leaves the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsolatedSandbox {
    limits: SandboxLimits,
}

impl IsolatedSandbox {
    /// Creates a sandbox with default limits.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limits(SandboxLimits::DEFAULT)
    }

    /// Creates a sandbox with the given limits.
    #[must_use]
    pub const fn with_limits(limits: SandboxLimits) -> Self {
        Self { limits }
    }

    /// The limits applied to each load.
    #[must_use]
    pub const fn limits(&self) -> SandboxLimits {
        self.limits
    }
}

#[async_trait]
impl Sandbox for IsolatedSandbox {
    async fn load(&self, artifact: Arc<Artifact>) -> Result<SandboxReport> {
        let started = Instant::now();
        let digest = artifact.digest().to_string();
        let modules_evaluated = check_links(&artifact)?;

        let limits = self.limits;
        tokio::task::spawn_blocking(move || execute(&artifact, limits))
            .await
            .map_err(|join_error| {
                runtime_error(format!("Sandbox task failed: {join_error}"), None)
            })??;

        Ok(SandboxReport {
            digest,
            modules_evaluated,
            elapsed_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        })
    }
}

/// Links the module graph from the entry without running it.
///
/// Returns the number of modules the entry reaches.
pub(crate) fn check_links(artifact: &Artifact) -> Result<usize> {
    let entry_key = artifact.entry_key();
    let Some(ModuleUnit::Linked { exports, .. }) = artifact.unit(entry_key) else {
        return Err(runtime_error(
            format!("Entry module {} is not part of the artifact", artifact.entry()),
            Some(artifact.entry().to_string()),
        ));
    };

    let mut evaluated = BTreeSet::new();
    let mut pending = vec![entry_key.to_string()];
    while let Some(key) = pending.pop() {
        if !evaluated.insert(key.clone()) {
            continue;
        }

        match artifact.unit(&key) {
            Some(ModuleUnit::Stub { path, message, .. }) => {
                return Err(runtime_error(message.clone(), Some(path.clone())));
            }
            Some(ModuleUnit::Linked { path, imports, .. }) => {
                for import in imports.iter().filter(|i| i.kind != ImportKind::Dynamic) {
                    let Some(target) = &import.key else {
                        continue;
                    };
                    if let Some(missing) = import
                        .bindings
                        .required_exports()
                        .find(|name| !provides(artifact, target, name, &mut BTreeSet::new()))
                    {
                        return Err(runtime_error(
                            format!(
                                "The requested module '{}' does not provide an export named \
                                 '{missing}'",
                                import.specifier
                            ),
                            Some(path.clone()),
                        ));
                    }
                    pending.push(target.clone());
                }
            }
            None => {
                return Err(runtime_error(
                    format!("Module {key} is not part of the artifact"),
                    None,
                ));
            }
        }
    }

    if !exports.has_default {
        return Err(runtime_error(
            format!("{} must default-export a component", artifact.entry()),
            Some(artifact.entry().to_string()),
        ));
    }
    Ok(evaluated.len())
}

/// Returns `true` if the module at `key` exports `name`.
fn provides(artifact: &Artifact, key: &str, name: &str, seen: &mut BTreeSet<String>) -> bool {
    match artifact.unit(key) {
        Some(ModuleUnit::Stub { .. }) => true,
        Some(ModuleUnit::Linked {
            exports, imports, ..
        }) => {
            if exports.declares(name) {
                return true;
            }
            if name == "default" || !seen.insert(key.to_string()) {
                return false;
            }
            exports.star_from.iter().any(|specifier| {
                let target = imports
                    .iter()
                    .find(|i| i.kind == ImportKind::ReExport && i.specifier == *specifier);
                match target.map(|i| i.key.as_deref()) {
                    Some(Some(target)) => provides(artifact, target, name, seen),
                    // external packages: their export surface is unknown
                    Some(None) | None => true,
                }
            })
        }
        None => false,
    }
}

/// Evaluates the artifact and renders its entry once.
pub(crate) fn execute(artifact: &Artifact, limits: SandboxLimits) -> Result<()> {
    let engine_error = |err: rquickjs::Error| {
        runtime_error(format!("Sandbox engine failed: {err}"), None)
    };
    let runtime = Runtime::new().map_err(engine_error)?;
    runtime.set_memory_limit(limits.memory_bytes);
    runtime.set_max_stack_size(limits.stack_bytes);
    let deadline = Instant::now() + limits.timeout;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

    let mut resolver = BuiltinResolver::default();
    let mut loader = BuiltinLoader::default();
    for (key, unit) in artifact.units() {
        resolver.add_module(key);
        loader.add_module(key, unit.code());
    }
    for (name, required) in artifact.packages() {
        let code = match name {
            "react" => runtime::react_source(required),
            other => runtime::react_dom_source(other)
                .map_or_else(|| runtime::package_source(required), ToString::to_string),
        };
        resolver.add_module(name);
        loader.add_module(name, code);
    }
    let boot = runtime::boot_source(artifact.entry_key(), artifact.entry());
    runtime.set_loader(resolver, loader);

    let context = Context::full(&runtime).map_err(engine_error)?;
    let outcome = context.with(|ctx| {
        let result = ctx
            .eval::<(), _>(runtime::GLOBALS)
            .and_then(|()| Module::evaluate(ctx.clone(), runtime::BOOT_MODULE, boot))
            .and_then(|promise| promise.finish::<()>())
            // a module still awaiting something that never settles is left running
            .or_else(|err| match err {
                rquickjs::Error::WouldBlock => Ok(()),
                other => Err(other),
            })
            .catch(&ctx);
        result.map_err(|caught| describe(&caught))
    });

    outcome.map_err(|(message, stack)| {
        if Instant::now() >= deadline {
            return runtime_error(
                format!(
                    "Render did not finish within {} ms",
                    limits.timeout.as_millis()
                ),
                None,
            );
        }
        let module = stack
            .as_deref()
            .and_then(module_in_stack)
            .unwrap_or_else(|| artifact.entry().to_string());
        debug!(module = %module, %message, "sandbox evaluation threw");
        runtime_error(message, Some(module))
    })
}

/// Message and stack of a value thrown inside the engine.
fn describe(caught: &CaughtError<'_>) -> (String, Option<String>) {
    match caught {
        CaughtError::Exception(exception) => {
            let message = exception.message().unwrap_or_default();
            let name = exception.get::<_, String>("name").ok();
            let message = match name {
                Some(name) if !name.is_empty() && !message.starts_with(&name) => {
                    format!("{name}: {message}")
                }
                _ => message,
            };
            (message, exception.stack())
        }
        CaughtError::Value(value) => {
            let message = value
                .as_string()
                .and_then(|s| s.to_string().ok())
                .unwrap_or_else(|| format!("Uncaught {}", value.type_name()));
            (message, None)
        }
        CaughtError::Error(err) => (err.to_string(), None),
    }
}

/// Path of the first VFS module named in an engine stack trace.
///
/// Frames look like `at App (@vfs/components/App.jsx:3:20)`.
pub(crate) fn module_in_stack(stack: &str) -> Option<String> {
    let marker = format!("{MODULE_PREFIX}/");
    let start = stack.find(&marker)? + MODULE_PREFIX.len();
    let rest = &stack[start..];
    let end = rest
        .find(|c: char| c == ':' || c == ')' || c.is_whitespace())
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

fn runtime_error(message: String, module: Option<String>) -> Error {
    Error::SandboxRuntimeError { message, module }
}
