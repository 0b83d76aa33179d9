//! # sitedata
//!
//! Build-time content aggregation for a static site. A content directory of
//! JSON descriptors, images and papers becomes one manifest the front end
//! imports, plus a public asset tree the web server serves.
//!
//! # Architecture: One Linear Pipeline
//!
//! ```text
//! 1. Freshness  stamp + inputs   →  skip or proceed
//! 2. Load       content/          →  site descriptor + section metadata
//! 3. Publish    section folders   →  public/content/  (SVGs minified)
//! 4. Assemble   sections          →  src/generated/site-data.json
//! ```
//!
//! Every stage reads its locations from one resolved
//! [`BuildConfig`](config::BuildConfig); nothing depends on the working
//! directory or process-global state.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrates a build or a dry-run check, collects warnings |
//! | [`freshness`] | Content-hash stamp deciding whether a build can be skipped |
//! | [`scan`] | Loads the site descriptor and enumerates section folders |
//! | [`publish`] | Copies papers and images into the public tree, builds section entries |
//! | [`svg`] | Structural SVG minifier applied to published `.svg` files |
//! | [`config`] | `sitedata.toml` loading, defaults merging, validation, path resolution |
//! | [`types`] | Manifest types serialized for the front end |
//! | [`naming`] | `NN-name` folder convention and id derivation |
//! | [`output`] | CLI output formatting for build and check results |
//!
//! # Design Decisions
//!
//! ## Content Hashes Over Timestamps
//!
//! The build is skipped when nothing changed, and "changed" means content.
//! A fresh clone or a CI cache restore rewrites every mtime; comparing
//! SHA-256 digests keeps those runs free while still catching an edit that
//! lands within the filesystem's timestamp resolution.
//!
//! ## Tolerant by Default
//!
//! Content is edited by hand. A missing image or paper produces a warning and
//! a manifest with a gap instead of a failed deploy. `strict = true` turns
//! those gaps into errors for CI.
//!
//! ## Pass-Through Site Descriptor
//!
//! `site.json` is copied into the manifest as-is with its key order intact.
//! The front end owns its shape; this crate only requires it to be an object.

pub mod config;
pub mod freshness;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod scan;
pub mod svg;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
