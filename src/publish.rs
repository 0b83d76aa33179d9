//! Asset publishing: copies each section's paper and images into the public
//! asset tree and produces the section's manifest entry.
//!
//! ## Output Structure
//!
//! ```text
//! public/content/
//! ├── 01-fractals/
//! │   ├── mandelbrot.png         # Byte-for-byte copy
//! │   └── fractals.pdf           # Paper, byte-for-byte copy
//! └── 02-topology/
//!     └── klein-bottle.svg       # Minified by the SVG optimizer
//! ```
//!
//! Paths mirror the source tree: `<public>/<section folder>/<declared file>`.
//! Destination files are overwritten on every build; there is no
//! per-file change detection (the whole build is gated by the freshness
//! check instead).
//!
//! ## Missing Assets
//!
//! A declared paper that does not exist is dropped from the section. A
//! declared image that does not exist keeps its piece entry, whose URL then
//! points at nothing; the front end has to tolerate the broken link. Both
//! are reported as [`AssetStatus::Missing`] and logged as warnings, or fail
//! the build when `strict` is set.
//!
//! ## Declared Paths
//!
//! Declared files must stay inside their section folder. A path with a root,
//! a drive prefix or a `..` component is never read or written: it is
//! reported as [`AssetStatus::Rejected`] and its paper or piece is left out
//! of the manifest, or the build fails with [`PublishError::UnsafePath`]
//! when `strict` is set.

use crate::config::BuildConfig;
use crate::naming;
use crate::scan::{PaperMeta, PieceMeta, SectionSource};
use crate::svg::{self, SvgError};
use crate::types::{Paper, Piece, Section};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to optimize {path}: {source}")]
    Svg { path: PathBuf, source: SvgError },
    #[error("Paper not found: {0}")]
    MissingPaper(PathBuf),
    #[error("Image not found: {0}")]
    MissingImage(PathBuf),
    #[error("{folder}: \"{file}\" points outside the section folder")]
    UnsafePath { folder: String, file: String },
}

/// What a declared file is to its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Paper,
    Image,
}

/// What happened to one declared file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Copied byte-for-byte.
    Copied { bytes: u64 },
    /// Rewritten by the SVG optimizer.
    Optimized { before: u64, after: u64 },
    /// Source file does not exist.
    Missing,
    /// Declared path leaves the section folder; nothing was read or written.
    Rejected,
}

/// Outcome for one declared file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub kind: AssetKind,
    /// Filename as declared in the metadata.
    pub file: String,
    pub status: AssetStatus,
}

/// A section's manifest entry plus what happened to its files.
#[derive(Debug, Clone)]
pub struct PublishedSection {
    /// Folder the section was loaded from.
    pub folder: String,
    pub section: Section,
    pub assets: Vec<AssetReport>,
}

impl PublishedSection {
    pub fn missing(&self) -> impl Iterator<Item = &AssetReport> {
        self.assets
            .iter()
            .filter(|a| a.status == AssetStatus::Missing)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &AssetReport> {
        self.assets
            .iter()
            .filter(|a| a.status == AssetStatus::Rejected)
    }
}

/// Copies section assets into the public tree.
///
/// In dry-run mode every check runs (existence, SVG parsing) but nothing is
/// written.
pub struct Publisher<'a> {
    config: &'a BuildConfig,
    dry_run: bool,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(config: &'a BuildConfig) -> Self {
        Self {
            config,
            dry_run: true,
        }
    }

    /// Publish a section's paper and pieces and build its manifest entry.
    pub fn publish_section(&self, source: &SectionSource) -> Result<PublishedSection, PublishError> {
        let mut assets = Vec::new();

        let paper = match &source.meta.paper {
            Some(paper) => self.publish_paper(source, paper, &mut assets)?,
            None => None,
        };

        let mut pieces = Vec::new();
        for piece in source.meta.pieces() {
            if let Some(piece) = self.publish_piece(source, piece, &mut assets)? {
                pieces.push(piece);
            }
        }

        let section = Section {
            id: source.id.clone(),
            title: source.meta.title.clone(),
            subtitle: source.meta.subtitle.clone().filter(|s| !s.is_empty()),
            description: source.meta.description.clone().unwrap_or_default(),
            paper,
            pieces,
        };

        Ok(PublishedSection {
            folder: source.folder.clone(),
            section,
            assets,
        })
    }

    fn publish_paper(
        &self,
        source: &SectionSource,
        paper: &PaperMeta,
        assets: &mut Vec<AssetReport>,
    ) -> Result<Option<Paper>, PublishError> {
        let Some(file) = paper.declared_file() else {
            return Ok(None);
        };
        if !self.accept_path(source, file, AssetKind::Paper, assets)? {
            return Ok(None);
        }
        let src = source.dir.join(file);
        if !src.is_file() {
            if self.config.strict {
                return Err(PublishError::MissingPaper(src));
            }
            warn!("{}: paper \"{file}\" not found", source.folder);
            assets.push(AssetReport {
                kind: AssetKind::Paper,
                file: file.to_string(),
                status: AssetStatus::Missing,
            });
            return Ok(None);
        }

        let status = self.copy_verbatim(&src, &self.destination(source, file))?;
        assets.push(AssetReport {
            kind: AssetKind::Paper,
            file: file.to_string(),
            status,
        });

        Ok(Some(Paper {
            title: paper.title.clone(),
            year: paper.year.clone().and_then(|y| y.normalized()),
            url: self.config.public_url(&source.folder, file),
        }))
    }

    fn publish_piece(
        &self,
        source: &SectionSource,
        piece: &PieceMeta,
        assets: &mut Vec<AssetReport>,
    ) -> Result<Option<Piece>, PublishError> {
        if !self.accept_path(source, &piece.image, AssetKind::Image, assets)? {
            return Ok(None);
        }
        let src = source.dir.join(&piece.image);
        let status = if src.is_file() {
            let dest = self.destination(source, &piece.image);
            if naming::is_svg(&piece.image) && self.config.svg.optimize {
                self.copy_optimized(&src, &dest)?
            } else {
                self.copy_verbatim(&src, &dest)?
            }
        } else {
            if self.config.strict {
                return Err(PublishError::MissingImage(src));
            }
            warn!(
                "{}: image \"{}\" not found, emitting placeholder",
                source.folder, piece.image
            );
            AssetStatus::Missing
        };
        assets.push(AssetReport {
            kind: AssetKind::Image,
            file: piece.image.clone(),
            status,
        });

        Ok(Some(Piece {
            id: naming::piece_id(&source.id, &piece.image),
            title: piece.title.clone(),
            image: self.config.public_url(&source.folder, &piece.image),
        }))
    }

    /// Whether `file` may be published. Paths leaving the section folder
    /// are recorded as rejected, or fail the build in strict mode.
    fn accept_path(
        &self,
        source: &SectionSource,
        file: &str,
        kind: AssetKind,
        assets: &mut Vec<AssetReport>,
    ) -> Result<bool, PublishError> {
        if is_contained(file) {
            return Ok(true);
        }
        if self.config.strict {
            return Err(PublishError::UnsafePath {
                folder: source.folder.clone(),
                file: file.to_string(),
            });
        }
        warn!(
            "{}: \"{file}\" points outside the section folder, not published",
            source.folder
        );
        assets.push(AssetReport {
            kind,
            file: file.to_string(),
            status: AssetStatus::Rejected,
        });
        Ok(false)
    }

    fn destination(&self, source: &SectionSource, file: &str) -> PathBuf {
        self.config.public_dir.join(&source.folder).join(file)
    }

    fn copy_verbatim(&self, src: &Path, dest: &Path) -> Result<AssetStatus, PublishError> {
        let bytes = fs::metadata(src)?.len();
        if !self.dry_run {
            ensure_parent(dest)?;
            fs::copy(src, dest).map_err(|source| PublishError::Copy {
                from: src.to_path_buf(),
                to: dest.to_path_buf(),
                source,
            })?;
            debug!("Copied {} → {}", src.display(), dest.display());
        }
        Ok(AssetStatus::Copied { bytes })
    }

    fn copy_optimized(&self, src: &Path, dest: &Path) -> Result<AssetStatus, PublishError> {
        let raw = fs::read_to_string(src)?;
        let optimized = svg::optimize(&raw, &self.config.svg).map_err(|source| {
            PublishError::Svg {
                path: src.to_path_buf(),
                source,
            }
        })?;
        if !self.dry_run {
            ensure_parent(dest)?;
            fs::write(dest, &optimized)?;
            debug!(
                "Optimized {} → {} ({} → {} bytes)",
                src.display(),
                dest.display(),
                raw.len(),
                optimized.len()
            );
        }
        Ok(AssetStatus::Optimized {
            before: raw.len() as u64,
            after: optimized.len() as u64,
        })
    }
}

/// A relative path made only of normal components (`.` allowed), so joining
/// it onto a directory can never leave that directory.
fn is_contained(file: &str) -> bool {
    let path = Path::new(file);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent),
        None => Ok(()),
    }
}
