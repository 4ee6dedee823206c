//! End-to-end `generate` run: runtime check → fetch WIDOCO → discover →
//! process each file in order → summary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument};

use ontodocs_shared::{AppConfig, FileOutcome, OntodocsError, OntologyFile, Result, RunSummary};

use crate::environment::{self, RuntimeInfo};
use crate::fetch::{self, ArtifactSpec, FetchOutcome};
use crate::processor::{self, ContentOptions, ProcessSettings};
use crate::runner::ToolRunner;

/// Configuration for the `generate` pipeline.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Root scanned for ontology files.
    pub ontology_root: PathBuf,
    /// Limit for the runtime check.
    pub probe_timeout: Duration,
    /// Where the tool comes from.
    pub artifact: ArtifactSpec,
    /// How each file is processed.
    pub process: ProcessSettings,
}

impl GenerateConfig {
    /// Resolve a validated [`AppConfig`] into run settings.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let artifact = ArtifactSpec::from_config(&config.widoco)?;
        let process = ProcessSettings {
            java: config.runtime.java.clone(),
            jar: artifact.dest.clone(),
            docs_root: config.paths.docs_dir.clone(),
            timeout: Duration::from_secs(config.widoco.timeout_secs),
            options: ContentOptions::from(&config.widoco),
        };

        Ok(Self {
            ontology_root: config.paths.ontology_dir.clone(),
            probe_timeout: Duration::from_secs(config.runtime.probe_timeout_secs),
            artifact,
            process,
        })
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after the runtime check succeeds.
    fn runtime_detected(&self, info: &RuntimeInfo);
    /// Called while the tool is being downloaded.
    fn download_progress(&self, downloaded: u64, total: Option<u64>);
    /// Called once the tool is available locally.
    fn artifact_ready(&self, path: &Path, outcome: &FetchOutcome);
    /// Called with the non-empty discovery result.
    fn files_discovered(&self, root: &Path, files: &[OntologyFile]);
    /// Called before a file is processed (`current` is 1-based).
    fn file_started(&self, file: &OntologyFile, output_dir: &Path, current: usize, total: usize);
    /// Called after a file is processed.
    fn file_finished(&self, outcome: &FileOutcome);
    /// Called when every file has been processed.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn runtime_detected(&self, _info: &RuntimeInfo) {}
    fn download_progress(&self, _downloaded: u64, _total: Option<u64>) {}
    fn artifact_ready(&self, _path: &Path, _outcome: &FetchOutcome) {}
    fn files_discovered(&self, _root: &Path, _files: &[OntologyFile]) {}
    fn file_started(&self, _file: &OntologyFile, _output_dir: &Path, _current: usize, _total: usize) {}
    fn file_finished(&self, _outcome: &FileOutcome) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Stages 1 and 2: check the runtime, then make sure the jar is on disk.
///
/// Either failure is fatal for the run.
pub async fn prepare<R: ToolRunner>(
    java: &str,
    probe_timeout: Duration,
    artifact: &ArtifactSpec,
    runner: &R,
    progress: &dyn ProgressReporter,
) -> Result<(RuntimeInfo, FetchOutcome)> {
    progress.phase("Checking prerequisites");
    let runtime = environment::check_runtime(runner, java, probe_timeout).await?;
    progress.runtime_detected(&runtime);

    progress.phase("Setting up WIDOCO");
    let fetched = fetch::ensure_artifact(artifact, |done, total| {
        progress.download_progress(done, total)
    })
    .await?;
    progress.artifact_ready(&artifact.dest, &fetched);

    Ok((runtime, fetched))
}

/// Run the full `generate` pipeline.
///
/// 1. Runtime check
/// 2. Fetch WIDOCO (if absent)
/// 3. Discover ontology files
/// 4. Process files one at a time
///
/// Returns `Err` only for fatal conditions; per-file failures are recorded in
/// the returned [`RunSummary`].
#[instrument(skip_all, fields(root = %config.ontology_root.display()))]
pub async fn run_generate<R: ToolRunner>(
    config: &GenerateConfig,
    runner: &R,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    prepare(
        &config.process.java,
        config.probe_timeout,
        &config.artifact,
        runner,
        progress,
    )
    .await?;

    progress.phase("Finding ontology files");
    let files = ontodocs_discovery::discover(&config.ontology_root);
    if files.is_empty() {
        return Err(OntodocsError::NoOntologies {
            root: config.ontology_root.clone(),
        });
    }
    progress.files_discovered(&config.ontology_root, &files);

    progress.phase("Generating documentation");
    let mut summary = RunSummary::new();
    let total = files.len();

    for (i, file) in files.iter().enumerate() {
        let output_dir = file.output_dir(&config.process.docs_root);
        progress.file_started(file, &output_dir, i + 1, total);

        let outcome = processor::process_file(runner, &config.process, file).await;
        progress.file_finished(&outcome);
        summary.record(outcome);
    }

    progress.done(&summary);

    info!(
        total = summary.total(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        "generate pipeline complete"
    );

    Ok(summary)
}
