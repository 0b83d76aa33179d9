//! Build configuration.
//!
//! Handles loading, validating, and merging `sitedata.toml`. Every setting
//! has a stock default, so the file is optional and sparse: override only
//! the values you need.
//!
//! ## Config File Location
//!
//! `sitedata.toml` lives in the project root, next to the `content/`
//! directory it describes:
//!
//! ```text
//! project/
//! ├── sitedata.toml            # Build config (optional)
//! ├── content/
//! │   ├── site.json            # Global site descriptor
//! │   └── sections/
//! │       ├── 01-fractals/
//! │       │   ├── meta.json
//! │       │   └── mandelbrot.png
//! │       └── 02-topology/
//! │           └── ...
//! ├── src/generated/           # Manifest output
//! └── public/content/          # Published assets
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! strict = false               # Promote missing assets and id collisions to errors
//!
//! [paths]
//! content = "content"          # Content root, relative to the project root
//! site = "site.json"           # Site descriptor file name inside content
//! sections = "sections"        # Sections directory, relative to content
//! meta = "meta.json"           # Per-section metadata file name
//! manifest = "src/generated/site-data.json"
//! public = "public/content"    # Root of the published asset tree
//!
//! [publish]
//! url_prefix = "/content"      # URL prefix for published assets
//!
//! [svg]
//! optimize = true
//! precision = 3
//! remove_comments = true
//! remove_metadata = true
//! remove_editor_data = true
//! collapse_whitespace = true
//! remove_empty_containers = true
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "sitedata.toml";

/// Highest supported SVG number precision. Beyond this, rounding no longer
/// shortens anything an authoring tool would emit.
pub const MAX_SVG_PRECISION: u8 = 8;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `sitedata.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteDataConfig {
    /// Fail the build on missing papers, missing images and duplicate ids
    /// instead of warning.
    pub strict: bool,
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Published URL settings.
    pub publish: PublishConfig,
    /// SVG optimizer passes.
    pub svg: SvgConfig,
}

impl SiteDataConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("paths.content", &self.paths.content),
            ("paths.sections", &self.paths.sections),
            ("paths.manifest", &self.paths.manifest),
            ("paths.public", &self.paths.public),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        for (key, value) in [("paths.site", &self.paths.site), ("paths.meta", &self.paths.meta)] {
            if !is_plain_filename(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a plain file name, got {value:?}"
                )));
            }
        }
        if !self.publish.url_prefix.starts_with('/') {
            return Err(ConfigError::Validation(
                "publish.url_prefix must start with '/'".into(),
            ));
        }
        if self.svg.precision > MAX_SVG_PRECISION {
            return Err(ConfigError::Validation(format!(
                "svg.precision must be 0-{MAX_SVG_PRECISION}"
            )));
        }
        Ok(())
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Input and output locations, relative to the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Content root directory.
    pub content: String,
    /// Site descriptor file name inside the content root.
    pub site: String,
    /// Sections directory, relative to the content root.
    pub sections: String,
    /// Metadata file name expected inside every section folder.
    pub meta: String,
    /// Output manifest path.
    pub manifest: String,
    /// Root of the published asset tree.
    pub public: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            site: "site.json".to_string(),
            sections: "sections".to_string(),
            meta: "meta.json".to_string(),
            manifest: "src/generated/site-data.json".to_string(),
            public: "public/content".to_string(),
        }
    }
}

/// Published URL settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Prefix of every asset URL written to the manifest. The public asset
    /// root must be served under this path.
    pub url_prefix: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            url_prefix: "/content".to_string(),
        }
    }
}

/// SVG optimizer settings. Each flag toggles one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SvgConfig {
    /// Master switch. When off, SVGs are copied byte-for-byte like any
    /// other asset.
    pub optimize: bool,
    /// Decimal places kept for numbers in geometry attributes.
    pub precision: u8,
    /// Drop `<!-- comments -->`.
    pub remove_comments: bool,
    /// Drop `<metadata>` elements.
    pub remove_metadata: bool,
    /// Drop Inkscape/Sodipodi/Illustrator/Sketch elements, attributes and
    /// namespace declarations.
    pub remove_editor_data: bool,
    /// Drop whitespace-only text between elements.
    pub collapse_whitespace: bool,
    /// Drop `<g>` and `<defs>` with neither attributes nor children.
    pub remove_empty_containers: bool,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            precision: 3,
            remove_comments: true,
            remove_metadata: true,
            remove_editor_data: true,
            collapse_whitespace: true,
            remove_empty_containers: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteDataConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteDataConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteDataConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when the
/// file does not exist.
pub fn load_config(config_path: &Path) -> Result<SiteDataConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(config_path)?;
    resolve_config(base, overlay)
}

/// Fully resolved pipeline configuration.
///
/// Every location the pipeline touches is an explicit field, so a build is a
/// function of this value and the filesystem contents alone.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Global site descriptor (`content/site.json`).
    pub site_file: PathBuf,
    /// Directory holding one subdirectory per section.
    pub sections_dir: PathBuf,
    /// Metadata file name looked up in each section folder.
    pub meta_filename: String,
    /// Output manifest path.
    pub manifest_path: PathBuf,
    /// Root of the published asset tree.
    pub public_dir: PathBuf,
    /// URL prefix for published assets.
    pub url_prefix: String,
    pub strict: bool,
    pub svg: SvgConfig,
}

impl BuildConfig {
    /// Resolve the config's relative paths against the project root.
    pub fn resolve(root: &Path, config: &SiteDataConfig) -> Self {
        let content_dir = root.join(&config.paths.content);
        Self {
            site_file: content_dir.join(&config.paths.site),
            sections_dir: content_dir.join(&config.paths.sections),
            meta_filename: config.paths.meta.clone(),
            manifest_path: root.join(&config.paths.manifest),
            public_dir: root.join(&config.paths.public),
            url_prefix: config.publish.url_prefix.clone(),
            strict: config.strict,
            svg: config.svg.clone(),
        }
    }

    /// Public URL of a file published for a section folder.
    pub fn public_url(&self, folder: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url_prefix.trim_end_matches('/'),
            folder,
            filename
        )
    }
}

/// Returns a fully-commented stock `sitedata.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitedata configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Treat missing papers, missing images and duplicate section/piece ids as
# build errors instead of warnings.
strict = false

# ---------------------------------------------------------------------------
# Locations (relative to the project root)
# ---------------------------------------------------------------------------
[paths]
# Content root directory.
content = "content"

# Global site descriptor, inside the content root.
site = "site.json"

# Directory of section folders, relative to the content root.
# Folders may carry an ordering prefix: 01-fractals, 02-topology, ...
sections = "sections"

# Metadata file expected in every section folder.
meta = "meta.json"

# Generated manifest consumed by the site generator.
manifest = "src/generated/site-data.json"

# Root of the published asset tree. Each section's files land in
# <public>/<section folder>/.
public = "public/content"

# ---------------------------------------------------------------------------
# Published URLs
# ---------------------------------------------------------------------------
[publish]
# Prefix of every asset URL in the manifest.
url_prefix = "/content"

# ---------------------------------------------------------------------------
# SVG optimization
# ---------------------------------------------------------------------------
[svg]
# Set to false to copy SVGs byte-for-byte.
optimize = true

# Decimal places kept for numbers in geometry attributes (d, points,
# transform, viewBox, ...). 0-8.
precision = 3

remove_comments = true
remove_metadata = true
remove_editor_data = true
collapse_whitespace = true
remove_empty_containers = true
"##
}
