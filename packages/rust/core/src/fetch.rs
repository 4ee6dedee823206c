//! Fetch the pinned WIDOCO jar into the working directory.
//!
//! The artifact is identified only by its local path: if the file exists it is
//! used as-is. A download streams into `<jar>.part` and is renamed into place
//! once complete, so an interrupted download is retried on the next run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

use ontodocs_shared::{OntodocsError, Result, WidocoConfig};

/// Maximum number of redirects to follow (release assets redirect to a CDN).
const MAX_REDIRECTS: usize = 10;

/// Connect timeout for the download. The transfer itself is unbounded.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent string for download requests.
const USER_AGENT: &str = concat!("ontodocs/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// ArtifactSpec
// ---------------------------------------------------------------------------

/// Where to get the tool and where to keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    /// Download URL.
    pub url: String,
    /// Local cache path.
    pub dest: PathBuf,
    /// Expected SHA-256 (hex) of a fresh download.
    pub sha256: Option<String>,
}

impl ArtifactSpec {
    pub fn from_config(widoco: &WidocoConfig) -> Result<Self> {
        Ok(Self {
            url: artifact_url(&widoco.url_template, &widoco.version)?,
            dest: widoco.jar.clone(),
            sha256: widoco.sha256.clone(),
        })
    }
}

/// Substitute `version` into `template` and check the result is an HTTP(S) URL.
pub fn artifact_url(template: &str, version: &str) -> Result<String> {
    let url = template.replace("{version}", version);
    let parsed =
        Url::parse(&url).map_err(|e| OntodocsError::validation(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(OntodocsError::validation(format!(
            "unsupported URL scheme '{scheme}' in {url}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

/// What [`ensure_artifact`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was already on disk; no network access happened.
    AlreadyPresent,
    /// The file was downloaded.
    Downloaded { bytes: u64 },
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Make sure the artifact exists at `spec.dest`, downloading it if absent.
///
/// `on_progress` receives `(bytes_downloaded, content_length)` while a
/// download is running. There is no retry; any failure is returned and no
/// file is left at `spec.dest`.
#[instrument(skip_all, fields(dest = %spec.dest.display()))]
pub async fn ensure_artifact<F>(spec: &ArtifactSpec, on_progress: F) -> Result<FetchOutcome>
where
    F: Fn(u64, Option<u64>),
{
    if spec.dest.exists() {
        info!("artifact already present");
        return Ok(FetchOutcome::AlreadyPresent);
    }

    info!(url = %spec.url, "downloading artifact");

    let part = part_path(&spec.dest);
    let bytes = match download_to(spec, &part, &on_progress).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                debug!(error = %rm, "no partial download to clean up");
            }
            return Err(e);
        }
    };

    tokio::fs::rename(&part, &spec.dest)
        .await
        .map_err(|e| OntodocsError::io(&spec.dest, e))?;

    info!(bytes, "artifact downloaded");
    Ok(FetchOutcome::Downloaded { bytes })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `<dest>.part`, next to the destination so the final rename stays on one
/// filesystem.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Build a reqwest client with appropriate settings.
fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .build()
        .map_err(|e| OntodocsError::Network(format!("failed to build HTTP client: {e}")))
}

/// Stream the response body into `part`, returning the byte count.
async fn download_to<F>(spec: &ArtifactSpec, part: &Path, on_progress: &F) -> Result<u64>
where
    F: Fn(u64, Option<u64>),
{
    if let Some(parent) = part.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| OntodocsError::io(parent, e))?;
    }

    let client = build_client()?;
    let url = &spec.url;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| OntodocsError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OntodocsError::Network(format!("{url}: HTTP {status}")));
    }

    let total = response.content_length();
    debug!(?total, "content length");

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| OntodocsError::io(part, e))?;

    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    on_progress(0, total);

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| OntodocsError::Network(format!("{url}: failed to read body: {e}")))?
    {
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| OntodocsError::io(part, e))?;
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total);
    }

    file.flush().await.map_err(|e| OntodocsError::io(part, e))?;

    if let Some(expected) = &spec.sha256 {
        let actual = format!("{:x}", hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected) {
            warn!(%expected, %actual, "checksum mismatch");
            return Err(OntodocsError::validation(format!(
                "SHA-256 mismatch for {url}: expected {expected}, got {actual}"
            )));
        }
    }

    Ok(downloaded)
}
