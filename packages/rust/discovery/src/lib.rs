//! Ontology file discovery.
//!
//! Walks the ontology root recursively and collects every `.owl`, `.ttl` and
//! `.rdf` file, sorted by path so runs over an unchanged tree always process
//! and report files in the same order.

use std::path::{Path, PathBuf};

use ontodocs_shared::OntologyFile;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Name of the canonical generated index page.
pub const INDEX_PAGE: &str = "index.html";

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Recursively discover ontology files under `root`.
///
/// Returns an empty vector when `root` does not exist or holds no matching
/// files; the caller decides whether that is fatal. Entries that cannot be
/// read are skipped with a warning.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path) -> Vec<OntologyFile> {
    if !root.exists() {
        warn!("ontology directory not found");
        return Vec::new();
    }

    let mut files: Vec<OntologyFile> = walk_files(root)
        .filter_map(|path| {
            let file = OntologyFile::new(root, &path);
            if file.is_none() {
                debug!(path = %path.display(), "skipping non-ontology file");
            }
            file
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));

    info!(count = files.len(), "ontology files discovered");
    files
}

/// Find generated `index.html` pages under `docs_root`, sorted by path.
pub fn find_index_pages(docs_root: &Path) -> Vec<PathBuf> {
    if !docs_root.is_dir() {
        return Vec::new();
    }

    let mut pages: Vec<PathBuf> = walk_files(docs_root)
        .filter(|path| path.file_name().is_some_and(|name| name == INDEX_PAGE))
        .collect();
    pages.sort();
    pages
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// All regular files below `root` (following symlinks), skipping unreadable
/// entries.
fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}
