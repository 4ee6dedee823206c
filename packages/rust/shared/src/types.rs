//! Domain types: discovered ontology files and per-file processing outcomes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// OntologyFormat
// ---------------------------------------------------------------------------

/// Serialization format of an ontology file, keyed by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OntologyFormat {
    /// OWL/XML (`.owl`).
    Owl,
    /// Turtle (`.ttl`).
    Turtle,
    /// RDF/XML (`.rdf`).
    RdfXml,
}

impl OntologyFormat {
    /// Match a file extension exactly (extensions are case-sensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "owl" => Some(Self::Owl),
            "ttl" => Some(Self::Turtle),
            "rdf" => Some(Self::RdfXml),
            _ => None,
        }
    }

    /// The file extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Owl => "owl",
            Self::Turtle => "ttl",
            Self::RdfXml => "rdf",
        }
    }
}

impl fmt::Display for OntologyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// OntologyFile
// ---------------------------------------------------------------------------

/// An ontology file found under the ontology root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyFile {
    /// Path as found on disk (root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the ontology root.
    pub relative: PathBuf,
    /// Base name without extension.
    pub name: String,
    /// Serialization format.
    pub format: OntologyFormat,
}

impl OntologyFile {
    /// Build a file reference from a root and a path below it.
    ///
    /// Returns `None` when `path` is not under `root` or has no recognised
    /// ontology extension.
    pub fn new(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?.to_path_buf();
        let format = OntologyFormat::from_extension(path.extension()?.to_str()?)?;
        let name = path.file_stem()?.to_string_lossy().into_owned();

        Some(Self {
            path: path.to_path_buf(),
            relative,
            name,
            format,
        })
    }

    /// The module/version namespace: the relative parent directory.
    pub fn namespace(&self) -> &Path {
        self.relative.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Output directory mirroring the namespace under `docs_root`.
    pub fn output_dir(&self, docs_root: &Path) -> PathBuf {
        docs_root.join(self.namespace())
    }
}

// ---------------------------------------------------------------------------
// FileOutcome
// ---------------------------------------------------------------------------

/// Why a single ontology file failed to produce documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The tool ran past the timeout and was killed.
    TimedOut(Duration),
    /// The tool exited unsuccessfully. `code` is `None` when killed by a signal.
    NonZeroExit { code: Option<i32>, stderr: String },
    /// The tool could not be started.
    Launch(String),
    /// Creating the output directory or renaming the index page failed.
    Io(String),
}

impl FailureReason {
    /// Captured standard error, for failures that have one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::NonZeroExit { stderr, .. } if !stderr.trim().is_empty() => Some(stderr.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            Self::NonZeroExit { code: Some(code), .. } => write!(f, "exited with status {code}"),
            Self::NonZeroExit { code: None, .. } => f.write_str("terminated by signal"),
            Self::Launch(msg) => write!(f, "could not be started: {msg}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Documentation was generated. `index_promoted` is true when
    /// `index-en.html` was renamed to `index.html`.
    Generated { index_promoted: bool },
    Failed(FailureReason),
}

/// Processing outcome for one ontology file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file: OntologyFile,
    pub output_dir: PathBuf,
    pub status: FileStatus,
    pub elapsed: Duration,
}

impl FileOutcome {
    /// Whether documentation was generated for this file.
    pub fn succeeded(&self) -> bool {
        matches!(self.status, FileStatus::Generated { .. })
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Running tally of a generate run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    outcomes: Vec<FileOutcome>,
    succeeded: usize,
    failed: usize,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one completed file to the tally.
    pub fn record(&mut self, outcome: FileOutcome) {
        if outcome.succeeded() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Failed outcomes, in processing order.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}
