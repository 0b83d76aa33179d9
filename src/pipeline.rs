//! Build orchestration: freshness → site → sections → assets → manifest.
//!
//! Stages run in a fixed order on one thread. Every path comes from the
//! [`BuildConfig`], so two builds with the same config over the same content
//! tree produce the same manifest.
//!
//! ```text
//! freshness::check ──fresh──▶ Skipped
//!        │ stale
//!        ▼
//! scan::load_site ─▶ scan::scan_sections ─▶ id checks
//!        ▼
//! Publisher::publish_section (per section, in folder order)
//!        ▼
//! write manifest ─▶ write stamp ─▶ Built(report)
//! ```
//!
//! Recoverable problems are logged as they happen and collected as
//! [`Warning`]s in the report. With `strict` set, everything except a
//! section without metadata becomes a [`BuildError`].

use crate::config::{BuildConfig, ConfigError};
use crate::freshness::{self, Freshness, Stamp};
use crate::naming;
use crate::publish::{AssetKind, PublishError, PublishedSection, Publisher};
use crate::scan::{self, ScanError, SectionSource};
use crate::types::{self, Manifest, Site};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("Duplicate section id \"{id}\" ({first}/ and {second}/)")]
    DuplicateSectionId {
        id: String,
        first: String,
        second: String,
    },
    #[error("Duplicate piece id \"{id}\" in {folder}/")]
    DuplicatePieceId { id: String, folder: String },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A recoverable problem found during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Section folder without a metadata file; left out of the manifest.
    SkippedSection { folder: String },
    /// Declared paper not found; the section has `paper: null`.
    MissingPaper { folder: String, file: String },
    /// Declared image not found; the piece is kept with a dangling URL.
    MissingImage { folder: String, file: String },
    /// Declared file outside its section folder; its paper or piece is dropped.
    UnsafePath { folder: String, file: String },
    DuplicateSectionId {
        id: String,
        first: String,
        second: String,
    },
    DuplicatePieceId { id: String, folder: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedSection { folder } => write!(f, "Skipping {folder}/: no metadata"),
            Self::MissingPaper { folder, file } => {
                write!(f, "{folder}: paper \"{file}\" not found")
            }
            Self::MissingImage { folder, file } => {
                write!(f, "{folder}: image \"{file}\" not found, placeholder emitted")
            }
            Self::UnsafePath { folder, file } => {
                write!(f, "{folder}: \"{file}\" points outside the section folder, not published")
            }
            Self::DuplicateSectionId { id, first, second } => {
                write!(f, "Duplicate section id \"{id}\" ({first}/ and {second}/)")
            }
            Self::DuplicatePieceId { id, folder } => {
                write!(f, "Duplicate piece id \"{id}\" in {folder}/")
            }
        }
    }
}

/// Everything a build produced, for display and inspection.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest: Manifest,
    /// Published sections in manifest order, with per-file outcomes.
    pub sections: Vec<PublishedSection>,
    pub warnings: Vec<Warning>,
    pub manifest_path: PathBuf,
}

impl BuildReport {
    pub fn site_name(&self) -> &str {
        types::site_name(&self.manifest.site)
    }
}

#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// The manifest already reflects the content tree.
    Skipped { manifest_path: PathBuf },
    Built(BuildReport),
}

/// Run the pipeline.
///
/// Unless `force` is set, returns [`BuildOutcome::Skipped`] without touching
/// anything when the freshness check passes.
pub fn build(config: &BuildConfig, force: bool) -> Result<BuildOutcome, BuildError> {
    if force {
        debug!("Freshness check bypassed");
    } else {
        match freshness::check(config) {
            Freshness::Fresh => {
                debug!("{} is up to date", config.manifest_path.display());
                return Ok(BuildOutcome::Skipped {
                    manifest_path: config.manifest_path.clone(),
                });
            }
            Freshness::Stale(reason) => debug!("Rebuilding: {reason}"),
        }
    }

    // Hash inputs before publishing so edits made mid-build stay stale.
    let inputs = freshness::collect_inputs(config);

    let report = assemble(config, &Publisher::new(config))?;
    write_manifest(config, &report.manifest)?;

    let stamped = inputs.and_then(|inputs| {
        Stamp::capture(config, inputs)?.save(&config.manifest_path)
    });
    if let Err(e) = stamped {
        warn!("Could not write freshness stamp: {e}");
    }

    Ok(BuildOutcome::Built(report))
}

/// Load and validate everything without writing any output.
///
/// Reports the same warnings and errors a build would.
pub fn check(config: &BuildConfig) -> Result<BuildReport, BuildError> {
    assemble(config, &Publisher::dry_run(config))
}

fn assemble(config: &BuildConfig, publisher: &Publisher) -> Result<BuildReport, BuildError> {
    let site: Site = scan::load_site(&config.site_file)?;
    debug!("Site: \"{}\"", types::site_name(&site));

    let scanned = scan::scan_sections(&config.sections_dir, &config.meta_filename)?;
    let mut warnings: Vec<Warning> = scanned
        .skipped
        .into_iter()
        .map(|folder| Warning::SkippedSection { folder })
        .collect();

    check_unique_ids(&scanned.sections, config.strict, &mut warnings)?;

    let mut sections = Vec::with_capacity(scanned.sections.len());
    for source in &scanned.sections {
        let published = publisher.publish_section(source)?;
        warnings.extend(published.missing().map(|asset| match asset.kind {
            AssetKind::Paper => Warning::MissingPaper {
                folder: published.folder.clone(),
                file: asset.file.clone(),
            },
            AssetKind::Image => Warning::MissingImage {
                folder: published.folder.clone(),
                file: asset.file.clone(),
            },
        }));
        warnings.extend(published.rejected().map(|asset| Warning::UnsafePath {
            folder: published.folder.clone(),
            file: asset.file.clone(),
        }));
        sections.push(published);
    }

    let manifest = Manifest {
        site,
        sections: sections.iter().map(|p| p.section.clone()).collect(),
    };

    Ok(BuildReport {
        manifest,
        sections,
        warnings,
        manifest_path: config.manifest_path.clone(),
    })
}

/// Detect section ids shared by two folders and piece ids repeated within
/// a section. Warnings in tolerant mode, errors in strict mode.
fn check_unique_ids(
    sections: &[SectionSource],
    strict: bool,
    warnings: &mut Vec<Warning>,
) -> Result<(), BuildError> {
    let mut seen_sections: HashMap<&str, &str> = HashMap::new();
    for source in sections {
        if let Some(first) = seen_sections.insert(&source.id, &source.folder) {
            if strict {
                return Err(BuildError::DuplicateSectionId {
                    id: source.id.clone(),
                    first: first.to_string(),
                    second: source.folder.clone(),
                });
            }
            let warning = Warning::DuplicateSectionId {
                id: source.id.clone(),
                first: first.to_string(),
                second: source.folder.clone(),
            };
            warn!("{warning}");
            warnings.push(warning);
        }

        let mut seen_pieces: HashSet<String> = HashSet::new();
        for piece in source.meta.pieces() {
            let id = naming::piece_id(&source.id, &piece.image);
            if !seen_pieces.insert(id.clone()) {
                if strict {
                    return Err(BuildError::DuplicatePieceId {
                        id,
                        folder: source.folder.clone(),
                    });
                }
                let warning = Warning::DuplicatePieceId {
                    id,
                    folder: source.folder.clone(),
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }
    }
    Ok(())
}

fn write_manifest(config: &BuildConfig, manifest: &Manifest) -> Result<(), BuildError> {
    let path = &config.manifest_path;
    let write_err = |source| BuildError::Write {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(write_err)?;
    debug!("Wrote {}", path.display());
    Ok(())
}
