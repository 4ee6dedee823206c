//! Application configuration for ontodocs.
//!
//! Config is looked up at `--config <FILE>`, then `./ontodocs.toml`, then
//! `~/.ontodocs/ontodocs.toml`. CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OntodocsError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "ontodocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ontodocs";

/// Pinned WIDOCO release.
pub const DEFAULT_WIDOCO_VERSION: &str = "1.4.25";

/// Release download URL; `{version}` is substituted.
pub const DEFAULT_WIDOCO_URL_TEMPLATE: &str = "https://github.com/dgarijo/Widoco/releases/download/v{version}/widoco-{version}-jar-with-dependencies_JDK-17.jar";

// ---------------------------------------------------------------------------
// Config structs (matching ontodocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Documentation tool settings.
    #[serde(default)]
    pub widoco: WidocoConfig,

    /// Runtime used to launch the tool.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root scanned for ontology files.
    #[serde(default = "default_ontology_dir")]
    pub ontology_dir: PathBuf,

    /// Root under which documentation is written.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ontology_dir: default_ontology_dir(),
            docs_dir: default_docs_dir(),
        }
    }
}

fn default_ontology_dir() -> PathBuf {
    "ontology".into()
}
fn default_docs_dir() -> PathBuf {
    "docs".into()
}

/// `[widoco]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidocoConfig {
    /// Release version substituted into `url_template`.
    #[serde(default = "default_version")]
    pub version: String,

    /// Download URL template containing `{version}`.
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Local path of the cached jar.
    #[serde(default = "default_jar")]
    pub jar: PathBuf,

    /// Expected SHA-256 of a fresh download (lowercase hex). Cached jars are
    /// not re-checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Per-file wall-clock limit in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pass `-rewriteAll`.
    #[serde(default = "default_true")]
    pub rewrite_all: bool,

    /// Pass `-includeImportedOntologies`.
    #[serde(default = "default_true")]
    pub include_imported_ontologies: bool,

    /// Pass `-webVowl`.
    #[serde(default = "default_true")]
    pub web_vowl: bool,

    /// Pass `-licensius`.
    #[serde(default = "default_true")]
    pub licensius: bool,
}

impl Default for WidocoConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            url_template: default_url_template(),
            jar: default_jar(),
            sha256: None,
            timeout_secs: default_timeout_secs(),
            rewrite_all: true,
            include_imported_ontologies: true,
            web_vowl: true,
            licensius: true,
        }
    }
}

fn default_version() -> String {
    DEFAULT_WIDOCO_VERSION.into()
}
fn default_url_template() -> String {
    DEFAULT_WIDOCO_URL_TEMPLATE.into()
}
fn default_jar() -> PathBuf {
    "widoco.jar".into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_true() -> bool {
    true
}

/// `[runtime]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Java executable name or path.
    #[serde(default = "default_java")]
    pub java: String,

    /// Limit for the `-version` probe. Cold JVM starts on CI can be slow.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            java: default_java(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_java() -> String {
    "java".into()
}

fn default_probe_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    /// Reject values that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.widoco.version.trim().is_empty() {
            return Err(OntodocsError::config("widoco.version must not be empty"));
        }
        if !self.widoco.url_template.contains("{version}") {
            return Err(OntodocsError::config(
                "widoco.url_template must contain a {version} placeholder",
            ));
        }
        if self.widoco.jar.as_os_str().is_empty() {
            return Err(OntodocsError::config("widoco.jar must not be empty"));
        }
        if self.widoco.timeout_secs == 0 {
            return Err(OntodocsError::config("widoco.timeout_secs must be positive"));
        }
        if let Some(hash) = &self.widoco.sha256 {
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(OntodocsError::config(
                    "widoco.sha256 must be 64 hexadecimal characters",
                ));
            }
        }
        if self.runtime.java.trim().is_empty() {
            return Err(OntodocsError::config("runtime.java must not be empty"));
        }
        if self.runtime.probe_timeout_secs == 0 {
            return Err(OntodocsError::config(
                "runtime.probe_timeout_secs must be positive",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.ontodocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OntodocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.ontodocs/ontodocs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Find the config file to load, if any.
///
/// An explicit path must exist. Otherwise `./ontodocs.toml` wins over the
/// user config file; `None` means built-in defaults.
pub fn locate_config(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(OntodocsError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Ok(Some(local));
    }

    // A missing home directory is not an error here; defaults still apply.
    match config_file_path() {
        Ok(user) if user.is_file() => Ok(Some(user)),
        _ => Ok(None),
    }
}

/// Load the application config. Returns defaults if no file is found.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    match locate_config(explicit)? {
        Some(path) => load_config_from(&path),
        None => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OntodocsError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        OntodocsError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    tracing::debug!(?path, "loaded config file");

    config.validate()?;
    Ok(config)
}

/// Write a default config file to `path` (or the user config file).
/// Refuses to overwrite an existing file. Returns the written path.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    if path.exists() {
        return Err(OntodocsError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| OntodocsError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| OntodocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OntodocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("ontology_dir"));
        assert!(toml_str.contains("1.4.25"));
        assert!(!toml_str.contains("sha256"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[paths]
docs_dir = "site"

[widoco]
timeout_secs = 60
web_vowl = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.paths.docs_dir, PathBuf::from("site"));
        assert_eq!(config.paths.ontology_dir, PathBuf::from("ontology"));
        assert_eq!(config.widoco.timeout_secs, 60);
        assert!(!config.widoco.web_vowl);
        assert!(config.widoco.licensius);
        assert_eq!(config.runtime.java, "java");
        assert_eq!(config.runtime.probe_timeout_secs, 10);
    }

    #[test]
    fn probe_timeout_from_file() {
        let config: AppConfig = toml::from_str("[runtime]\nprobe_timeout_secs = 45\n").expect("parse");
        assert_eq!(config.runtime.probe_timeout_secs, 45);
        assert_eq!(config.runtime.java, "java");

        let mut config = AppConfig::default();
        config.runtime.probe_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.widoco.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.widoco.url_template = "https://example.com/widoco.jar".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("{version}"));

        let mut config = AppConfig::default();
        config.widoco.sha256 = Some("abc".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file_and_init_refuses_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let written = init_config(Some(&path)).expect("init config");
        assert_eq!(written, path);

        let loaded = load_config(Some(&path)).expect("load config");
        assert_eq!(loaded.widoco.version, DEFAULT_WIDOCO_VERSION);

        assert!(init_config(Some(&path)).is_err());
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(result.unwrap_err().to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[widoco\nversion = ").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
