//! Shared test utilities for the sitedata test suite.
//!
//! [`ContentFixture`] builds a throwaway project root with the default
//! layout (`content/site.json`, `content/sections/<folder>/…`) so tests can
//! describe the content they need inline.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fx = math_art_fixture();
//! let outcome = pipeline::build(&fx.config(), false).unwrap();
//!
//! let section = find_section(&fx.manifest(), "fractals");
//! assert_eq!(piece_ids(section), vec!["fractals--mandelbrot"]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::{BuildConfig, SiteDataConfig};
use crate::types::{Manifest, Section};

/// Bytes with a PNG signature. Assets are copied, never decoded.
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// An SVG as an editor saves it: declaration, comment, metadata, editor
/// attributes, indentation and long decimals.
pub const EDITOR_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with Inkscape (http://www.inkscape.org/) -->
<svg
   xmlns="http://www.w3.org/2000/svg"
   xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
   xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"
   width="100"
   height="100"
   viewBox="0 0 100 100"
   inkscape:version="1.3">
  <sodipodi:namedview id="namedview1" pagecolor="#ffffff"/>
  <metadata>
    <rdf>work</rdf>
  </metadata>
  <g inkscape:label="Layer 1" inkscape:groupmode="layer">
    <!-- outline -->
    <path d="M 10.123456,20.987654 L 80.5,90.0001 Z" fill="#336699"/>
    <circle cx="50.00049" cy="50" r="25.123456"/>
  </g>
  <g></g>
</svg>
"##;

/// A project root laid out with the default paths.
pub struct ContentFixture {
    pub tmp: TempDir,
}

impl ContentFixture {
    /// Empty project root. Nothing exists yet, not even `content/`.
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    /// Default build config resolved against this root.
    pub fn config(&self) -> BuildConfig {
        BuildConfig::resolve(self.root(), &SiteDataConfig::default())
    }

    /// Strict variant of [`config`](Self::config).
    pub fn strict_config(&self) -> BuildConfig {
        BuildConfig {
            strict: true,
            ..self.config()
        }
    }

    /// Write `content/site.json`.
    pub fn write_site(&self, site: serde_json::Value) -> &Self {
        self.write_raw(
            "content/site.json",
            serde_json::to_string_pretty(&site).unwrap().as_bytes(),
        )
    }

    /// Write `content/sections/<folder>/meta.json`.
    pub fn write_meta(&self, folder: &str, meta: serde_json::Value) -> &Self {
        self.write_raw(
            &format!("content/sections/{folder}/meta.json"),
            serde_json::to_string_pretty(&meta).unwrap().as_bytes(),
        )
    }

    /// Write an asset into a section folder.
    pub fn write_file(&self, folder: &str, name: &str, bytes: &[u8]) -> &Self {
        self.write_raw(&format!("content/sections/{folder}/{name}"), bytes)
    }

    /// Write any file relative to the project root, creating parents.
    pub fn write_raw(&self, rel: &str, bytes: &[u8]) -> &Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
        self
    }

    /// Absolute path of a source asset.
    pub fn source_path(&self, folder: &str, name: &str) -> PathBuf {
        self.config().sections_dir.join(folder).join(name)
    }

    /// Absolute path of a published asset.
    pub fn published_path(&self, folder: &str, name: &str) -> PathBuf {
        self.config().public_dir.join(folder).join(name)
    }

    /// Raw bytes of the generated manifest.
    pub fn manifest_text(&self) -> String {
        fs::read_to_string(self.config().manifest_path).unwrap()
    }

    /// Parse the generated manifest.
    pub fn manifest(&self) -> Manifest {
        serde_json::from_str(&self.manifest_text()).unwrap()
    }
}

/// The `Math Art` scenario: one section `01-fractals` with one PNG piece.
pub fn math_art_fixture() -> ContentFixture {
    let fx = ContentFixture::new();
    fx.write_site(serde_json::json!({"name": "Math Art"}));
    fx.write_meta(
        "01-fractals",
        serde_json::json!({
            "title": "Fractals",
            "pieces": [{"image": "mandelbrot.png", "title": "Mandelbrot Set"}]
        }),
    );
    fx.write_file("01-fractals", "mandelbrot.png", PNG_BYTES);
    fx
}

// =========================================================================
// Manifest lookups: panic with a clear message on miss
// =========================================================================

/// Find a section by id. Panics if not found.
pub fn find_section<'a>(manifest: &'a Manifest, id: &str) -> &'a Section {
    manifest
        .sections
        .iter()
        .find(|s| s.id == id)
        .unwrap_or_else(|| {
            let ids = section_ids(manifest);
            panic!("section '{id}' not found. Available: {ids:?}")
        })
}

/// All section ids in manifest order.
pub fn section_ids(manifest: &Manifest) -> Vec<&str> {
    manifest.sections.iter().map(|s| s.id.as_str()).collect()
}

/// All piece ids of a section in order.
pub fn piece_ids(section: &Section) -> Vec<&str> {
    section.pieces.iter().map(|p| p.id.as_str()).collect()
}
