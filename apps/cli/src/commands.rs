//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use ontodocs_core::environment::RuntimeInfo;
use ontodocs_core::fetch::{ArtifactSpec, FetchOutcome};
use ontodocs_core::pipeline::{GenerateConfig, ProgressReporter};
use ontodocs_core::runner::ProcessRunner;
use ontodocs_shared::{
    AppConfig, FileOutcome, FileStatus, OntodocsError, OntologyFile, RunSummary,
    init_config, load_config, locate_config,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ontodocs: generate HTML documentation for a tree of ontologies.
#[derive(Parser)]
#[command(
    name = "ontodocs",
    version,
    about = "Generate WIDOCO documentation for every ontology under a directory tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ./ontodocs.toml or ~/.ontodocs/ontodocs.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check Java, fetch WIDOCO and document every ontology file.
    Generate {
        #[command(flatten)]
        paths: PathOverrides,

        #[command(flatten)]
        tool: ToolOverrides,

        /// Per-file time limit in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Check Java and make sure the WIDOCO jar is present.
    Fetch {
        #[command(flatten)]
        tool: ToolOverrides,
    },

    /// List the ontology files a run would process.
    List {
        #[command(flatten)]
        paths: PathOverrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Input and output directory overrides.
#[derive(Args, Debug, Default)]
pub(crate) struct PathOverrides {
    /// Root directory scanned for ontology files.
    #[arg(long, env = "ONTODOCS_ONTOLOGY_DIR")]
    pub ontology_dir: Option<PathBuf>,

    /// Root directory documentation is written under.
    #[arg(long, env = "ONTODOCS_DOCS_DIR")]
    pub docs_dir: Option<PathBuf>,
}

/// Runtime and WIDOCO overrides.
#[derive(Args, Debug, Default)]
pub(crate) struct ToolOverrides {
    /// Where the WIDOCO jar is stored.
    #[arg(long)]
    pub jar: Option<PathBuf>,

    /// WIDOCO release to download.
    #[arg(long)]
    pub widoco_version: Option<String>,

    /// Java executable.
    #[arg(long)]
    pub java: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with the defaults.
    Init {
        /// Target file (defaults to ~/.ontodocs/ontodocs.toml).
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show resolved configuration.
    Show,
}

impl PathOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.ontology_dir {
            config.paths.ontology_dir = dir.clone();
        }
        if let Some(dir) = &self.docs_dir {
            config.paths.docs_dir = dir.clone();
        }
    }
}

impl ToolOverrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(jar) = &self.jar {
            config.widoco.jar = jar.clone();
        }
        if let Some(version) = &self.widoco_version {
            config.widoco.version = version.clone();
        }
        if let Some(java) = &self.java {
            config.runtime.java = java.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "ontodocs=info",
        1 => "ontodocs=debug",
        _ => "ontodocs=trace",
    }
}

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose)));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate {
            paths,
            tool,
            timeout_secs,
        } => cmd_generate(config_path, &paths, &tool, timeout_secs).await,
        Command::Fetch { tool } => cmd_fetch(config_path, &tool).await,
        Command::List { paths } => cmd_list(config_path, &paths),
        Command::Config { action } => match action {
            ConfigAction::Init { path } => cmd_config_init(path.as_deref()),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

async fn cmd_generate(
    config_path: Option<&Path>,
    paths: &PathOverrides,
    tool: &ToolOverrides,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let mut app = load_config(config_path)?;
    paths.apply(&mut app);
    tool.apply(&mut app);
    if let Some(secs) = timeout_secs {
        app.widoco.timeout_secs = secs;
    }
    let config = GenerateConfig::from_app_config(&app)?;

    info!(
        ontology_dir = %config.ontology_root.display(),
        docs_dir = %config.process.docs_root.display(),
        widoco = %app.widoco.version,
        "generating documentation"
    );

    let progress = CliProgress::new();
    let result = ontodocs_core::pipeline::run_generate(&config, &ProcessRunner, &progress).await;
    progress.finish();
    let summary = result?;

    print_summary(&summary, &config.process.docs_root);

    if summary.failed() > 0 {
        return Err(eyre!(
            "{} of {} ontology file(s) failed",
            summary.failed(),
            summary.total()
        ));
    }
    Ok(())
}

async fn cmd_fetch(config_path: Option<&Path>, tool: &ToolOverrides) -> Result<()> {
    let mut app = load_config(config_path)?;
    tool.apply(&mut app);
    app.validate()?;
    let artifact = ArtifactSpec::from_config(&app.widoco)?;

    info!(url = %artifact.url, dest = %artifact.dest.display(), "fetching WIDOCO");

    let progress = CliProgress::new();
    let result = ontodocs_core::pipeline::prepare(
        &app.runtime.java,
        Duration::from_secs(app.runtime.probe_timeout_secs),
        &artifact,
        &ProcessRunner,
        &progress,
    )
    .await;
    progress.finish();
    result?;

    println!();
    println!("  Ready: {}", artifact.dest.display());
    println!();
    Ok(())
}

fn cmd_list(config_path: Option<&Path>, paths: &PathOverrides) -> Result<()> {
    let mut app = load_config(config_path)?;
    paths.apply(&mut app);

    let root = &app.paths.ontology_dir;
    let files = ontodocs_discovery::discover(root);
    if files.is_empty() {
        return Err(OntodocsError::NoOntologies { root: root.clone() }.into());
    }

    for file in &files {
        println!(
            "  {:<24} {}  ->  {}",
            file.namespace().display().to_string(),
            file.relative.display(),
            file.output_dir(&app.paths.docs_dir).display()
        );
    }
    println!();
    println!("  {} ontology file(s) under {}", files.len(), root.display());
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    match locate_config(config_path)? {
        Some(path) => println!("# {}", path.display()),
        None => println!("# built-in defaults"),
    }
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Console output
// ---------------------------------------------------------------------------

fn print_summary(summary: &RunSummary, docs_root: &Path) {
    println!();
    println!("  Documentation generation finished");
    println!("  Total:      {}", summary.total());
    println!("  Successful: {}", summary.succeeded());
    println!("  Failed:     {}", summary.failed());

    if summary.failed() > 0 {
        println!();
        for outcome in summary.failures() {
            if let FileStatus::Failed(reason) = &outcome.status {
                println!("  ✗ {}: {reason}", outcome.file.relative.display());
            }
        }
    }

    if summary.succeeded() > 0 {
        println!();
        println!("  Docs:       {}", docs_root.display());
        if let Some(index) = ontodocs_discovery::find_index_pages(docs_root).first() {
            println!("  Open:       {}", index.display());
        }
    }
    println!();
}

/// Stderr lines shown under a failed file; the full text goes to the log.
const STDERR_HEAD_LINES: usize = 20;

/// Leading non-empty stderr lines, indented for display under a file line.
///
/// Java prints the exception message before the stack frames, so the head is
/// kept and the remainder is collapsed into a count.
fn stderr_excerpt(stderr: &str, max_lines: usize) -> Vec<String> {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut excerpt: Vec<String> = lines
        .iter()
        .take(max_lines)
        .map(|l| format!("      {}", l.trim_end()))
        .collect();
    let hidden = lines.len().saturating_sub(max_lines);
    if hidden > 0 {
        excerpt.push(format!("      ... ({hidden} more lines)"));
    }
    excerpt
}

/// CLI progress reporter using indicatif spinners.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn runtime_detected(&self, info: &RuntimeInfo) {
        let version = info.version_line.as_deref().unwrap_or("version unknown");
        self.spinner
            .println(format!("  ✓ {} found: {version}", info.program));
    }

    fn download_progress(&self, downloaded: u64, total: Option<u64>) {
        let msg = match total {
            Some(total) => format!(
                "Downloading WIDOCO {} / {}",
                HumanBytes(downloaded),
                HumanBytes(total)
            ),
            None => format!("Downloading WIDOCO {}", HumanBytes(downloaded)),
        };
        self.spinner.set_message(msg);
    }

    fn artifact_ready(&self, path: &Path, outcome: &FetchOutcome) {
        let line = match outcome {
            FetchOutcome::AlreadyPresent => format!("  ✓ WIDOCO already present: {}", path.display()),
            FetchOutcome::Downloaded { bytes } => format!(
                "  ✓ WIDOCO downloaded ({}): {}",
                HumanBytes(*bytes),
                path.display()
            ),
        };
        self.spinner.println(line);
    }

    fn files_discovered(&self, root: &Path, files: &[OntologyFile]) {
        self.spinner.println(format!(
            "  ✓ Found {} ontology file(s) in {}",
            files.len(),
            root.display()
        ));
    }

    fn file_started(&self, file: &OntologyFile, output_dir: &Path, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Generating [{current}/{total}] {} ({}.{})",
            file.namespace().display(),
            file.name,
            file.format
        ));
        self.spinner.println(format!(
            "  [{current}/{total}] {} -> {}",
            file.relative.display(),
            output_dir.display()
        ));
    }

    fn file_finished(&self, outcome: &FileOutcome) {
        let secs = outcome.elapsed.as_secs_f64();
        match &outcome.status {
            FileStatus::Generated { .. } => {
                self.spinner.println(format!("      ✓ done in {secs:.1}s"));
            }
            FileStatus::Failed(reason) => {
                self.spinner.println(format!("      ✗ {reason}"));
                if let Some(stderr) = reason.stderr() {
                    for line in stderr_excerpt(stderr, STDERR_HEAD_LINES) {
                        self.spinner.println(line);
                    }
                }
            }
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_overrides_apply() {
        let cli = Cli::try_parse_from([
            "ontodocs",
            "generate",
            "--ontology-dir",
            "onto",
            "--docs-dir",
            "site",
            "--jar",
            "/opt/widoco.jar",
            "--widoco-version",
            "1.4.24",
            "--java",
            "/usr/bin/java",
            "--timeout-secs",
            "60",
        ])
        .unwrap();

        let Command::Generate {
            paths,
            tool,
            timeout_secs,
        } = cli.command
        else {
            panic!("expected generate");
        };

        let mut app = AppConfig::default();
        paths.apply(&mut app);
        tool.apply(&mut app);

        assert_eq!(app.paths.ontology_dir, PathBuf::from("onto"));
        assert_eq!(app.paths.docs_dir, PathBuf::from("site"));
        assert_eq!(app.widoco.jar, PathBuf::from("/opt/widoco.jar"));
        assert_eq!(app.widoco.version, "1.4.24");
        assert_eq!(app.runtime.java, "/usr/bin/java");
        assert_eq!(timeout_secs, Some(60));
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut app = AppConfig::default();
        let before = toml::to_string(&app).unwrap();
        PathOverrides::default().apply(&mut app);
        ToolOverrides::default().apply(&mut app);
        assert_eq!(toml::to_string(&app).unwrap(), before);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "ontodocs",
            "list",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(default_filter(cli.verbose), "ontodocs=trace");
        assert_eq!(default_filter(0), "ontodocs=info");
    }

    #[test]
    fn test_config_init_path() {
        let cli = Cli::try_parse_from(["ontodocs", "config", "init", "--path", "x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config { action: ConfigAction::Init { path: Some(ref p) } } if p == Path::new("x.toml")
        ));
    }

    #[test]
    fn test_stderr_excerpt_keeps_head() {
        let stderr = "line1\n\nline2\nline3\n";
        assert_eq!(
            stderr_excerpt(stderr, 2),
            vec!["      line1", "      line2", "      ... (1 more lines)"]
        );
        assert_eq!(stderr_excerpt(stderr, 5).len(), 3);
        assert!(stderr_excerpt("", 5).is_empty());
    }

    #[test]
    fn test_stderr_excerpt_shows_java_exception_message() {
        let mut stderr = String::from(
            "Exception in thread \"main\" java.lang.IllegalArgumentException: \
             ontology could not be loaded: bad IRI\n",
        );
        for i in 0..30 {
            stderr.push_str(&format!("\tat es.oeg.widoco.Frame{i}.run(Frame{i}.java:{i})\n"));
        }

        let excerpt = stderr_excerpt(&stderr, STDERR_HEAD_LINES);

        assert!(excerpt[0].contains("could not be loaded: bad IRI"));
        assert_eq!(excerpt.len(), STDERR_HEAD_LINES + 1);
        assert_eq!(excerpt.last().unwrap(), "      ... (11 more lines)");
    }
}
