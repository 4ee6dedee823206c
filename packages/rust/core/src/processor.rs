//! Per-file processing: derive the output directory, run WIDOCO, promote the
//! English index page.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use ontodocs_shared::{FailureReason, FileOutcome, FileStatus, OntologyFile, WidocoConfig};

use crate::runner::{Invocation, ToolExit, ToolRunner};

/// Index page WIDOCO writes for the default (English) language.
pub const LOCALIZED_INDEX: &str = "index-en.html";

/// Canonical index page name.
pub const CANONICAL_INDEX: &str = ontodocs_discovery::INDEX_PAGE;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// WIDOCO content-control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentOptions {
    /// `-rewriteAll`: regenerate everything in the output folder.
    pub rewrite_all: bool,
    /// `-includeImportedOntologies`: document imported ontologies too.
    pub include_imported_ontologies: bool,
    /// `-webVowl`: embed the WebVOWL visualization.
    pub web_vowl: bool,
    /// `-licensius`: add the license-compatibility check.
    pub licensius: bool,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            rewrite_all: true,
            include_imported_ontologies: true,
            web_vowl: true,
            licensius: true,
        }
    }
}

impl ContentOptions {
    /// Enabled flags, always in the same order.
    pub fn flags(&self) -> Vec<&'static str> {
        [
            (self.rewrite_all, "-rewriteAll"),
            (self.include_imported_ontologies, "-includeImportedOntologies"),
            (self.web_vowl, "-webVowl"),
            (self.licensius, "-licensius"),
        ]
        .into_iter()
        .filter_map(|(enabled, flag)| enabled.then_some(flag))
        .collect()
    }
}

impl From<&WidocoConfig> for ContentOptions {
    fn from(widoco: &WidocoConfig) -> Self {
        Self {
            rewrite_all: widoco.rewrite_all,
            include_imported_ontologies: widoco.include_imported_ontologies,
            web_vowl: widoco.web_vowl,
            licensius: widoco.licensius,
        }
    }
}

/// Everything needed to process one file.
#[derive(Debug, Clone)]
pub struct ProcessSettings {
    /// Java executable.
    pub java: String,
    /// Path to the WIDOCO jar.
    pub jar: PathBuf,
    /// Root under which output directories are created.
    pub docs_root: PathBuf,
    /// Per-file wall-clock limit.
    pub timeout: Duration,
    pub options: ContentOptions,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The WIDOCO command line for one file.
pub fn widoco_invocation(settings: &ProcessSettings, input: &Path, out_dir: &Path) -> Invocation {
    Invocation::new(&settings.java)
        .arg("-jar")
        .arg(settings.jar.as_os_str())
        .arg("-ontFile")
        .arg(input.as_os_str())
        .arg("-outFolder")
        .arg(out_dir.as_os_str())
        .args(settings.options.flags())
}

/// Rename `index-en.html` to `index.html` inside `out_dir`.
///
/// Returns `Ok(false)` when there is no localized index to promote.
pub fn promote_default_index(out_dir: &Path) -> io::Result<bool> {
    let localized = out_dir.join(LOCALIZED_INDEX);
    if !localized.exists() {
        return Ok(false);
    }
    std::fs::rename(&localized, out_dir.join(CANONICAL_INDEX))?;
    Ok(true)
}

/// Generate documentation for one ontology file.
///
/// Never fails: every problem is folded into the returned outcome so the
/// caller can continue with the next file.
#[instrument(skip_all, fields(file = %file.relative.display()))]
pub async fn process_file<R: ToolRunner>(
    runner: &R,
    settings: &ProcessSettings,
    file: &OntologyFile,
) -> FileOutcome {
    let start = Instant::now();
    let output_dir = file.output_dir(&settings.docs_root);
    let status = generate(runner, settings, file, &output_dir).await;

    match &status {
        FileStatus::Generated { index_promoted } => {
            info!(output = %output_dir.display(), index_promoted, "documentation generated");
        }
        FileStatus::Failed(reason) => {
            warn!(
                output = %output_dir.display(),
                %reason,
                stderr = reason.stderr().unwrap_or_default().trim_end(),
                "documentation failed"
            );
        }
    }

    FileOutcome {
        file: file.clone(),
        output_dir,
        status,
        elapsed: start.elapsed(),
    }
}

async fn generate<R: ToolRunner>(
    runner: &R,
    settings: &ProcessSettings,
    file: &OntologyFile,
    output_dir: &Path,
) -> FileStatus {
    if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
        return FileStatus::Failed(FailureReason::Io(format!(
            "cannot create {}: {e}",
            output_dir.display()
        )));
    }

    let invocation = widoco_invocation(settings, &file.path, output_dir);
    debug!(command = %invocation, "running WIDOCO");

    match runner.run(&invocation, settings.timeout).await {
        Ok(exit) if exit.success() => match promote_default_index(output_dir) {
            Ok(index_promoted) => FileStatus::Generated { index_promoted },
            Err(e) => FileStatus::Failed(FailureReason::Io(format!(
                "cannot rename {LOCALIZED_INDEX} to {CANONICAL_INDEX}: {e}"
            ))),
        },
        Ok(ToolExit::Exited { code, stderr, .. }) => {
            FileStatus::Failed(FailureReason::NonZeroExit { code, stderr })
        }
        Ok(ToolExit::TimedOut) => FileStatus::Failed(FailureReason::TimedOut(settings.timeout)),
        Err(e) => FileStatus::Failed(FailureReason::Launch(e.to_string())),
    }
}
