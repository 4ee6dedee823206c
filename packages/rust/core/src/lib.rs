//! Core orchestration for ontodocs.
//!
//! This crate ties together the runtime check, the WIDOCO download, ontology
//! discovery and per-file generation into the end-to-end `generate` run.

pub mod environment;
pub mod fetch;
pub mod pipeline;
pub mod processor;
pub mod runner;

#[cfg(test)]
mod testing;

pub use environment::{RuntimeInfo, check_runtime};
pub use fetch::{ArtifactSpec, FetchOutcome, ensure_artifact};
pub use pipeline::{GenerateConfig, ProgressReporter, SilentProgress, prepare, run_generate};
pub use processor::{ContentOptions, ProcessSettings, process_file, promote_default_index};
pub use runner::{Invocation, ProcessRunner, ToolExit, ToolRunner};
