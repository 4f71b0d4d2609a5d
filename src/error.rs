//! Error types for the generation pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// What went wrong when touching a filesystem resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoErrorKind {
    /// The path exists but could not be read.
    Readable,
    /// The path (or a required parent) does not exist.
    Missing,
    /// Metadata for the path could not be obtained.
    Metadata,
    /// The path could not be created or written.
    Writable,
}

impl fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IoErrorKind::Readable => "not readable",
            IoErrorKind::Missing => "missing",
            IoErrorKind::Metadata => "metadata unavailable",
            IoErrorKind::Writable => "not writable",
        };
        f.write_str(label)
    }
}

/// Main error type for generation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or contradictory options (driver options, constraint arity, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem resource not accessible.
    #[error("Path {} is {kind}: {source}", .path.display())]
    Io {
        kind: IoErrorKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component definition was used before its builder populated it.
    #[error("Component {class} ({kind}) has not been built")]
    Build { kind: String, class: String },

    /// A required runtime capability (driver, extension) is not available.
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// A service was asked to handle an action outside its declared set.
    #[error("Service {service} does not support action {action}")]
    UnsupportedAction { action: String, service: String },

    /// Database catalog query failed.
    #[error("Catalog query failed{}: {source}", .table.as_ref().map(|t| format!(" for table {t}")).unwrap_or_default())]
    Catalog {
        table: Option<String>,
        #[source]
        source: rusqlite::Error,
    },

    /// Payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Source template rendering failed.
    #[error("Render error for {class}: {source}")]
    Render {
        class: String,
        #[source]
        source: askama::Error,
    },

    /// One or more (plugin, component) emissions failed in a batch.
    #[error("{} emission(s) failed: {}", .failures.len(), .failures.join("; "))]
    Emission { failures: Vec<String> },
}

impl Error {
    /// Create an IO error carrying the offending path.
    pub fn io(kind: IoErrorKind, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            kind,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a catalog error scoped to one table.
    pub fn catalog(table: impl Into<String>, source: rusqlite::Error) -> Self {
        Error::Catalog {
            table: Some(table.into()),
            source,
        }
    }

    /// Create an unsupported action error.
    pub fn unsupported_action(action: impl fmt::Display, service: impl Into<String>) -> Self {
        Error::UnsupportedAction {
            action: action.to_string(),
            service: service.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {self}\n");

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {depth}: {err}"));
            source = err.source();
            depth += 1;
        }

        output
    }
}

impl From<rusqlite::Error> for Error {
    fn from(source: rusqlite::Error) -> Self {
        Error::Catalog {
            table: None,
            source,
        }
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, Error>;
