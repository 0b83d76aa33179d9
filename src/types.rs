//! Manifest types written to `site-data.json`.
//!
//! The serialized shape is the contract with the front-end site generator
//! and must not drift:
//!
//! ```text
//! { site, sections: [{ id, title, subtitle, description, paper, pieces: [{ id, title, image }] }] }
//! ```
//!
//! `subtitle` and `paper` serialize as `null` when absent rather than being
//! omitted, so consumers can rely on every key being present.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Global site descriptor, passed through from `site.json` untouched.
pub type Site = Map<String, Value>;

/// Root output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub site: Site,
    pub sections: Vec<Section>,
}

impl Manifest {
    /// Total number of pieces across all sections.
    pub fn piece_count(&self) -> usize {
        self.sections.iter().map(|s| s.pieces.len()).sum()
    }
}

/// A content section, one per loaded section folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Folder name with its ordering prefix stripped.
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    /// Empty string when the metadata has none.
    pub description: String,
    pub paper: Option<Paper>,
    pub pieces: Vec<Piece>,
}

/// Downloadable document attached to a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub year: Option<Year>,
    /// Public URL of the copied file.
    pub url: String,
}

/// A single displayed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    /// `<section id>--<image base name>`
    pub id: String,
    pub title: String,
    /// Public URL; may point at a file that was never copied.
    pub image: String,
}

/// Publication year, either `2021` or `"2021"` in the metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(serde_json::Number),
    Text(String),
}

impl Year {
    /// `0` and `""` carry no information and normalize to no year at all.
    pub fn normalized(self) -> Option<Self> {
        let empty = match &self {
            Year::Number(n) => n.as_f64() == Some(0.0),
            Year::Text(s) => s.is_empty(),
        };
        (!empty).then_some(self)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Number(n) => write!(f, "{n}"),
            Year::Text(s) => f.write_str(s),
        }
    }
}

/// The site's display name, or `""` when `site.json` has no string `name`.
pub fn site_name(site: &Site) -> &str {
    site.get("name").and_then(Value::as_str).unwrap_or_default()
}
