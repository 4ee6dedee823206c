//! Shared types, error model, and configuration for ontodocs.
//!
//! This crate is the foundation depended on by all other ontodocs crates.
//! It provides:
//! - [`OntodocsError`], the unified error type
//! - Domain types ([`OntologyFile`], [`FileOutcome`], [`RunSummary`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, DEFAULT_WIDOCO_URL_TEMPLATE, DEFAULT_WIDOCO_VERSION, PathsConfig,
    RuntimeConfig, WidocoConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, locate_config,
};
pub use error::{OntodocsError, Result};
pub use types::{
    FailureReason, FileOutcome, FileStatus, OntologyFile, OntologyFormat, RunSummary,
};
