//! Content loading: the global site descriptor and the section folders.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── site.json                    # Global descriptor (required)
//! └── sections/                    # Sections root (required)
//!     ├── 01-fractals/             # Section "fractals"
//!     │   ├── meta.json            # Section metadata (required per section)
//!     │   ├── mandelbrot.png
//!     │   └── fractals.pdf         # Optional paper
//!     ├── 02-topology/             # Section "topology"
//!     │   ├── meta.json
//!     │   └── klein-bottle.svg
//!     └── drafts/                  # No meta.json: skipped with a warning
//! ```
//!
//! ## Section Metadata
//!
//! ```json
//! {
//!   "title": "Fractals",
//!   "subtitle": "Self-similarity",
//!   "description": "Shapes that repeat at every scale.",
//!   "paper": { "file": "fractals.pdf", "title": "On Fractals", "year": 2021 },
//!   "pieces": [{ "image": "mandelbrot.png", "title": "Mandelbrot Set" }]
//! }
//! ```
//!
//! Only `title` is required. Unknown fields are ignored.
//!
//! ## Ordering
//!
//! Section folders are sorted by name. Ordering prefixes are expected to be
//! zero-padded (`01-`, `02-`, … `10-`) so name order is display order.
//! Hidden folders (leading `.`) and plain files in the sections root are
//! ignored.

use crate::naming;
use crate::types::{Site, Year};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing site descriptor: {0}")]
    MissingSite(PathBuf),
    #[error("Invalid site descriptor {path}: {source}")]
    InvalidSite {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Site descriptor must be a JSON object: {0}")]
    SiteNotObject(PathBuf),
    #[error("Missing sections directory: {0}")]
    MissingSectionsDir(PathBuf),
    #[error("Invalid section metadata {path}: {source}")]
    InvalidMetadata {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Per-section metadata document (`meta.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct SectionMeta {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub paper: Option<PaperMeta>,
    /// `null` and absent both mean no pieces.
    #[serde(default)]
    pub pieces: Option<Vec<PieceMeta>>,
}

impl SectionMeta {
    pub fn pieces(&self) -> &[PieceMeta] {
        self.pieces.as_deref().unwrap_or_default()
    }
}

/// Paper reference. Only declared when `file` is a non-empty string.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperMeta {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<Year>,
}

impl PaperMeta {
    /// The declared source filename, if any.
    pub fn declared_file(&self) -> Option<&str> {
        self.file.as_deref().filter(|f| !f.is_empty())
    }
}

/// One piece entry. The image path is relative to the section folder.
#[derive(Debug, Clone, Deserialize)]
pub struct PieceMeta {
    pub image: String,
    pub title: String,
}

/// A section folder with its loaded metadata.
#[derive(Debug, Clone)]
pub struct SectionSource {
    /// Folder name as on disk, e.g. `01-fractals`. Used for the published
    /// asset path.
    pub folder: String,
    /// Folder name with its ordering prefix stripped.
    pub id: String,
    /// Absolute path of the folder.
    pub dir: PathBuf,
    pub meta: SectionMeta,
}

/// Output of [`scan_sections`].
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Loaded sections in folder-name order.
    pub sections: Vec<SectionSource>,
    /// Folders skipped because they had no metadata file.
    pub skipped: Vec<String>,
}

/// Load the global site descriptor.
///
/// The document must exist and be a JSON object; its contents are otherwise
/// passed through untouched.
pub fn load_site(path: &Path) -> Result<Site, ScanError> {
    if !path.exists() {
        return Err(ScanError::MissingSite(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ScanError::InvalidSite {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(site) => Ok(site),
        _ => Err(ScanError::SiteNotObject(path.to_path_buf())),
    }
}

/// Enumerate section folders, sorted by name.
///
/// Only directories count; hidden entries are skipped.
pub fn section_folders(sections_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !sections_dir.is_dir() {
        return Err(ScanError::MissingSectionsDir(sections_dir.to_path_buf()));
    }
    let mut folders = Vec::new();
    for entry in fs::read_dir(sections_dir)? {
        let path = entry?.path();
        if path.is_dir() && !is_hidden(&path) {
            folders.push(path);
        }
    }

    folders.sort();
    Ok(folders)
}

/// Load every section folder under `sections_dir`.
///
/// A folder without `meta_filename` is skipped with a warning. Malformed
/// metadata is an error: the author declared a section and it must load.
pub fn scan_sections(sections_dir: &Path, meta_filename: &str) -> Result<ScanResult, ScanError> {
    let mut result = ScanResult::default();

    for dir in section_folders(sections_dir)? {
        let folder = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let meta_path = dir.join(meta_filename);

        if !meta_path.is_file() {
            warn!("Skipping {folder}/: no {meta_filename}");
            result.skipped.push(folder);
            continue;
        }

        let meta = load_section_meta(&meta_path)?;
        let id = naming::section_id(&folder);
        debug!(
            "Loaded section {folder}/ as '{id}' ({} pieces)",
            meta.pieces().len()
        );
        result.sections.push(SectionSource {
            folder,
            id,
            dir,
            meta,
        });
    }

    Ok(result)
}

fn load_section_meta(path: &Path) -> Result<SectionMeta, ScanError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ScanError::InvalidMetadata {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether a path's final component starts with `.`.
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
