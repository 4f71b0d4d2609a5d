//! # Plugin Module
//!
//! Named emitters that persist built components, and the registry that
//! drives them over a batch.
//!
//! - [`FilePlugin`] renders Rust source through the askama templates
//! - [`JsonPlugin`] writes the serialized definition
//! - [`paths`] maps namespaces onto the output tree
//!
//! A registry is created per run and handed to the pipeline; there is no
//! process-wide instance.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::components::ComponentDefinition;
use crate::error::{Error, IoErrorKind, Result};

pub mod file;
pub mod json;
pub mod paths;
pub mod templates;

pub use file::FilePlugin;
pub use json::JsonPlugin;
pub use templates::{render_routes, Renderer, TemplateRenderer};

/// What an emitter did with one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitOutcome {
    Written(PathBuf),
    /// The target already existed and overwriting was not requested.
    Skipped(PathBuf),
}

impl EmitOutcome {
    pub fn path(&self) -> &Path {
        match self {
            EmitOutcome::Written(path) | EmitOutcome::Skipped(path) => path,
        }
    }
}

/// An emitter persisting built components.
pub trait Plugin {
    /// Render and persist `component`.
    ///
    /// `module` is the component's module tag, when it has one.
    ///
    /// # Errors
    ///
    /// Implementations must fail with [`Error::Build`] before writing
    /// anything when `component` is unbuilt.
    fn emit(&self, component: &ComponentDefinition, module: Option<&str>) -> Result<EmitOutcome>;
}

/// Write `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(IoErrorKind::Writable, parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| Error::io(IoErrorKind::Writable, path, e))
}

/// Successful emission of one component by one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionRecord {
    pub plugin: String,
    pub class: String,
    pub outcome: EmitOutcome,
}

/// Failed emission of one component by one plugin.
#[derive(Debug)]
pub struct EmissionFailure {
    pub plugin: String,
    pub class: String,
    pub error: Error,
}

/// Outcome of a batch: every (plugin, component) pair is attempted.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub emitted: Vec<EmissionRecord>,
    pub failures: Vec<EmissionFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.emitted.iter().filter_map(|r| match &r.outcome {
            EmitOutcome::Written(path) => Some(path.as_path()),
            EmitOutcome::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.emitted.iter().filter_map(|r| match &r.outcome {
            EmitOutcome::Skipped(path) => Some(path.as_path()),
            EmitOutcome::Written(_) => None,
        })
    }

    /// The successful records, or [`Error::Emission`] naming every failure.
    pub fn into_result(self) -> Result<Vec<EmissionRecord>> {
        if self.failures.is_empty() {
            return Ok(self.emitted);
        }
        Err(Error::Emission {
            failures: self
                .failures
                .iter()
                .map(|f| format!("{}/{}: {}", f.plugin, f.class, f.error))
                .collect(),
        })
    }
}

/// Emitters keyed by name, invoked in registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(String, Box<dyn Plugin>)>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `plugin` under `name`.
    ///
    /// Returns `false`, leaving the registry unchanged, when the name is
    /// already taken: the first registration wins.
    pub fn register(&mut self, name: impl Into<String>, plugin: impl Plugin + 'static) -> bool {
        let name = name.into();
        if self.contains(&name) {
            warn!(plugin = %name, "Plugin already registered, keeping the first one");
            return false;
        }
        debug!(plugin = %name, "Plugin registered");
        self.plugins.push((name, Box::new(plugin)));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Emit every component through every plugin.
    ///
    /// A failure is recorded and the batch carries on with the next pair.
    pub fn generate(&self, components: &[ComponentDefinition]) -> BatchReport {
        let mut report = BatchReport::default();
        for (name, plugin) in &self.plugins {
            for component in components {
                match plugin.emit(component, component.module()) {
                    Ok(outcome) => report.emitted.push(EmissionRecord {
                        plugin: name.clone(),
                        class: component.qualified_name(),
                        outcome,
                    }),
                    Err(err) => {
                        error!(
                            plugin = %name,
                            class = %component.qualified_name(),
                            error = %err,
                            "Emission failed"
                        );
                        report.failures.push(EmissionFailure {
                            plugin: name.clone(),
                            class: component.qualified_name(),
                            error: err,
                        });
                    }
                }
            }
        }
        report
    }
}
