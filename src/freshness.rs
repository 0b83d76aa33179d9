//! Freshness check for skipping redundant builds.
//!
//! The build is cheap but runs on every dev-server start and every deploy,
//! and rewriting the manifest makes the bundler reload the site. This module
//! decides whether the previous output still reflects the content tree.
//!
//! # Design
//!
//! Freshness is **content-addressed**: each input is recorded by its SHA-256,
//! not its modification time. A `git checkout` or a CI cache restore resets
//! mtimes without changing content and must not force a rebuild; an edit
//! that keeps the old mtime must.
//!
//! ## Inputs
//!
//! - the global site descriptor
//! - every entry one level inside each section folder
//!
//! Files are hashed. Subdirectories of a section folder are recorded by name
//! only; their contents are not walked. Hidden entries (leading `.`) are
//! ignored, matching the section loader.
//!
//! ## Stamp
//!
//! After a successful build a stamp is written next to the manifest at
//! `<manifest dir>/.site-data.stamp.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "params_hash": "…",
//!   "manifest_hash": "…",
//!   "inputs": { "site.json": "…", "01-fractals/meta.json": "…" }
//! }
//! ```
//!
//! The build is skipped only when the manifest exists, the stamp loads, and
//! the build parameters, the manifest bytes, and the input set all match
//! what the stamp recorded. Anything unreadable counts as stale.
//!
//! ## Bypassing the check
//!
//! Pass `--force` to `build` to rebuild unconditionally.

use crate::config::BuildConfig;
use crate::scan::is_hidden;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the stamp file written next to the manifest.
pub const STAMP_FILENAME: &str = ".site-data.stamp.json";

/// Version of the stamp format. Bump this to invalidate all existing stamps
/// when the format or key computation changes.
const STAMP_VERSION: u32 = 1;

/// Marker recorded for subdirectories inside a section folder.
const DIRECTORY_MARKER: &str = "dir";

/// Record of the inputs and parameters that produced the current manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stamp {
    pub version: u32,
    pub params_hash: String,
    pub manifest_hash: String,
    /// Input path (relative, `/`-separated) → SHA-256 of its contents.
    pub inputs: BTreeMap<String, String>,
}

impl Stamp {
    /// Stamp the manifest just written for `config`.
    ///
    /// `inputs` should be collected before the build started, so content
    /// edited mid-build is seen as stale on the next run.
    pub fn capture(config: &BuildConfig, inputs: BTreeMap<String, String>) -> io::Result<Self> {
        Ok(Self {
            version: STAMP_VERSION,
            params_hash: hash_build_params(config),
            manifest_hash: hash_file(&config.manifest_path)?,
            inputs,
        })
    }

    /// Load the stamp next to `manifest_path`. Returns `None` if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(manifest_path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(stamp_path(manifest_path)).ok()?;
        let stamp: Self = serde_json::from_str(&content).ok()?;
        (stamp.version == STAMP_VERSION).then_some(stamp)
    }

    /// Save next to `manifest_path`.
    pub fn save(&self, manifest_path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(stamp_path(manifest_path), json)
    }
}

/// Resolve the stamp path for a manifest.
pub fn stamp_path(manifest_path: &Path) -> PathBuf {
    manifest_path.with_file_name(STAMP_FILENAME)
}

/// Result of a freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The manifest reflects the current inputs; the build can be skipped.
    Fresh,
    Stale(StaleReason),
}

/// Why a build has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    NoManifest,
    NoStamp,
    ParamsChanged,
    ManifestChanged,
    /// First input (in path order) that was added, removed, or edited.
    InputChanged(String),
    InputsUnreadable(String),
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoManifest => write!(f, "manifest does not exist"),
            Self::NoStamp => write!(f, "no usable freshness stamp"),
            Self::ParamsChanged => write!(f, "build configuration changed"),
            Self::ManifestChanged => write!(f, "manifest was modified outside the build"),
            Self::InputChanged(path) => write!(f, "{path} changed"),
            Self::InputsUnreadable(err) => write!(f, "could not read inputs: {err}"),
        }
    }
}

/// Decide whether the existing manifest is up to date.
pub fn check(config: &BuildConfig) -> Freshness {
    if !config.manifest_path.is_file() {
        return Freshness::Stale(StaleReason::NoManifest);
    }
    let Some(stamp) = Stamp::load(&config.manifest_path) else {
        return Freshness::Stale(StaleReason::NoStamp);
    };
    if stamp.params_hash != hash_build_params(config) {
        return Freshness::Stale(StaleReason::ParamsChanged);
    }
    match hash_file(&config.manifest_path) {
        Ok(hash) if hash == stamp.manifest_hash => {}
        _ => return Freshness::Stale(StaleReason::ManifestChanged),
    }
    let inputs = match collect_inputs(config) {
        Ok(inputs) => inputs,
        Err(e) => return Freshness::Stale(StaleReason::InputsUnreadable(e.to_string())),
    };
    match first_difference(&stamp.inputs, &inputs) {
        Some(path) => Freshness::Stale(StaleReason::InputChanged(path)),
        None => Freshness::Fresh,
    }
}

/// Hash every input of a build.
///
/// A missing site descriptor is left out of the map rather than reported;
/// the site loader owns that error. A missing sections root is an error.
pub fn collect_inputs(config: &BuildConfig) -> io::Result<BTreeMap<String, String>> {
    let mut inputs = BTreeMap::new();

    if config.site_file.is_file() {
        inputs.insert(input_key(&config.site_file), hash_file(&config.site_file)?);
    }

    let walker = WalkDir::new(&config.sections_dir)
        .min_depth(1)
        .max_depth(2)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e.path()));

    for entry in walker {
        let entry = entry?;
        // Plain files in the sections root are not sections.
        if entry.depth() == 1 {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&config.sections_dir) else {
            continue;
        };
        let key = relative_key(rel);
        if entry.file_type().is_dir() {
            inputs.insert(key, DIRECTORY_MARKER.to_string());
        } else {
            inputs.insert(key, hash_file(entry.path())?);
        }
    }

    Ok(inputs)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 hash of every setting that changes the build output.
///
/// Inputs: locations of the manifest and public tree, metadata filename,
/// URL prefix, strictness and SVG optimizer settings.
pub fn hash_build_params(config: &BuildConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"sitedata\0");
    hasher.update(config.manifest_path.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(config.public_dir.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(config.meta_filename.as_bytes());
    hasher.update(b"\0");
    hasher.update(config.url_prefix.as_bytes());
    hasher.update(b"\0");
    hasher.update([config.strict as u8]);
    let svg = &config.svg;
    hasher.update([
        svg.optimize as u8,
        svg.precision,
        svg.remove_comments as u8,
        svg.remove_metadata as u8,
        svg.remove_editor_data as u8,
        svg.collapse_whitespace as u8,
        svg.remove_empty_containers as u8,
    ]);
    format!("{:x}", hasher.finalize())
}

fn input_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative_key(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn first_difference(
    recorded: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Option<String> {
    let changed = current
        .iter()
        .find(|(path, hash)| recorded.get(*path) != Some(*hash))
        .map(|(path, _)| path);
    let removed = recorded.keys().find(|path| !current.contains_key(*path));
    match (changed, removed) {
        (Some(a), Some(b)) => Some(a.min(b).clone()),
        (a, b) => a.or(b).cloned(),
    }
}
