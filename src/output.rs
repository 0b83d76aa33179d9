//! CLI output formatting for builds and checks.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each section leads
//! with its positional index and title; the source folder and the outcome
//! of every declared file follow as indented context lines. The output reads
//! as a content inventory while still tracing back to specific files.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Site: Math Art
//! 001 Fractals (2 pieces, no paper)
//!     Source: 01-fractals/
//!     mandelbrot.png: copied (69 bytes)
//!     julia.png: missing
//! 002 Topology (1 pieces, +paper)
//!     Source: 02-topology/
//!     topology.pdf: paper, copied (5120 bytes)
//!     klein-bottle.svg: optimized (2048 → 612 bytes)
//!
//! Wrote src/generated/site-data.json
//! 2 sections, 3 pieces, 1 warning
//! ```
//!
//! ## Skipped build
//!
//! ```text
//! Content up to date: src/generated/site-data.json
//! ```
//!
//! ## Check
//!
//! Same inventory as a build, closed by a validity line instead of the
//! write summary.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Warnings are not repeated
//! here; they go to stderr through `tracing` as they happen.

use crate::pipeline::BuildReport;
use crate::publish::{AssetKind, AssetReport, AssetStatus, PublishedSection};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when it lives under it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Section header: index, title, piece count and paper marker.
///
/// ```text
/// 001 Fractals (1 pieces, no paper)
/// ```
fn section_header(index: usize, published: &PublishedSection) -> String {
    let section = &published.section;
    let paper = if section.paper.is_some() {
        "+paper"
    } else {
        "no paper"
    };
    format!(
        "{} {} ({} pieces, {})",
        format_index(index),
        section.title,
        section.pieces.len(),
        paper
    )
}

fn asset_line(asset: &AssetReport) -> String {
    let role = match asset.kind {
        AssetKind::Paper => "paper, ",
        AssetKind::Image => "",
    };
    let status = match asset.status {
        AssetStatus::Copied { bytes } => format!("copied ({bytes} bytes)"),
        AssetStatus::Optimized { before, after } => {
            format!("optimized ({before} → {after} bytes)")
        }
        AssetStatus::Missing => "missing".to_string(),
        AssetStatus::Rejected => "rejected (outside section folder)".to_string(),
    };
    format!("{}{}: {}{}", indent(1), asset.file, role, status)
}

/// Site line plus one entity block per section.
fn format_inventory(report: &BuildReport) -> Vec<String> {
    let mut lines = vec![format!("Site: {}", report.site_name())];
    for (i, published) in report.sections.iter().enumerate() {
        lines.push(section_header(i + 1, published));
        lines.push(format!("{}Source: {}/", indent(1), published.folder));
        lines.extend(published.assets.iter().map(asset_line));
    }
    lines
}

fn counts(report: &BuildReport) -> String {
    let mut parts = vec![
        format!("{} sections", report.manifest.sections.len()),
        format!("{} pieces", report.manifest.piece_count()),
    ];
    if !report.warnings.is_empty() {
        parts.push(plural(report.warnings.len(), "warning"));
    }
    parts.join(", ")
}

// ============================================================================
// Build
// ============================================================================

/// Format the result of a completed build.
pub fn format_build_output(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = format_inventory(report);
    lines.push(String::new());
    lines.push(format!(
        "Wrote {}",
        display_path(&report.manifest_path, root)
    ));
    lines.push(counts(report));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport, root: &Path) {
    for line in format_build_output(report, root) {
        println!("{}", line);
    }
}

/// Format the notice for a build skipped by the freshness check.
pub fn format_skipped_output(manifest_path: &Path, root: &Path) -> Vec<String> {
    vec![format!(
        "Content up to date: {}",
        display_path(manifest_path, root)
    )]
}

/// Print skip notice to stdout.
pub fn print_skipped_output(manifest_path: &Path, root: &Path) {
    for line in format_skipped_output(manifest_path, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the result of a dry-run check.
pub fn format_check_output(report: &BuildReport) -> Vec<String> {
    let mut lines = format_inventory(report);
    lines.push(String::new());
    lines.push(format!("Content is valid: {}", counts(report)));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(report: &BuildReport) {
    for line in format_check_output(report) {
        println!("{}", line);
    }
}
