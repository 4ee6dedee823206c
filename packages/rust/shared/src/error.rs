//! Error types for ontodocs.
//!
//! Library crates use [`OntodocsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ontodocs operations.
#[derive(Debug, thiserror::Error)]
pub enum OntodocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching the documentation tool.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, checksum mismatch, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The runtime needed by the documentation tool is not on the PATH.
    #[error("`{program}` is not installed or not in PATH (Java 17 or newer is required)")]
    RuntimeMissing { program: String },

    /// A subprocess could not be started.
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// A subprocess misbehaved after it was started.
    #[error("process error: {0}")]
    Process(String),

    /// Discovery found nothing to document.
    #[error(
        "no ontology files (.owl, .ttl, .rdf) found in {root:?}; \
         expected layout: <root>/<module>/<version>/<name>.owl"
    )]
    NoOntologies { root: PathBuf },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OntodocsError>;

impl OntodocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a spawn failure for `program`.
    pub fn launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Launch {
            program: program.into(),
            source,
        }
    }
}
