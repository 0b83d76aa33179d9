//! Centralized name parsing for the `NN-name` ordering convention.
//!
//! Section folders carry an optional numeric prefix (`03-geometry`) that
//! fixes their order on disk but is not part of the section's identity.
//! This module strips that prefix and derives the stable ids written to
//! the manifest:
//!
//! - `07-topology/` → section id `topology`
//! - `patterns/` → section id `patterns`
//! - `topology` + `klein-bottle.svg` → piece id `topology--klein-bottle`

use std::path::Path;

/// Separator between the section id and the image base name in a piece id.
pub const PIECE_ID_SEPARATOR: &str = "--";

/// Result of parsing a folder name like `03-geometry`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Digits of the ordering prefix if present (`"03"` from `03-geometry`).
    /// Kept as text: zero padding is significant for ordering and the run
    /// of digits may be longer than any integer type.
    pub prefix: Option<String>,
    /// Name after `NN-`. Empty if the folder is prefix-only (`"01-"`).
    /// For unprefixed entries, this is the full input.
    pub name: String,
}

/// Parse an entry name following the `NN-name` convention.
///
/// Only a leading run of ASCII digits immediately followed by `-` counts as
/// a prefix:
/// - `"03-geometry"` → prefix=Some("03"), name="geometry"
/// - `"01-"` → prefix=Some("01"), name=""
/// - `"2024-05-notes"` → prefix=Some("2024"), name="05-notes"
/// - `"patterns"` → prefix=None, name="patterns"
/// - `"v2-drafts"` → prefix=None, name="v2-drafts"
/// - `"+5-x"` → prefix=None, name="+5-x"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-')
        && !prefix.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_digit())
    {
        return ParsedName {
            prefix: Some(prefix.to_string()),
            name: rest.to_string(),
        };
    }
    ParsedName {
        prefix: None,
        name: name.to_string(),
    }
}

/// Section id for a section folder: the folder name minus its ordering prefix.
pub fn section_id(folder: &str) -> String {
    parse_entry_name(folder).name
}

/// Piece id: `<section_id>--<image without its final extension>`.
///
/// The image is the filename as declared in the section metadata and may
/// include a subfolder (`plates/a.png` → `<section>--plates/a`).
pub fn piece_id(section_id: &str, image: &str) -> String {
    format!("{section_id}{PIECE_ID_SEPARATOR}{}", strip_extension(image))
}

/// Remove the final extension from the last segment of a declared filename.
///
/// Dotfiles (`.hidden`) and names ending in a bare dot (`file.`) have no
/// extension and are returned unchanged.
///
/// This is intentionally narrower than cutting at the last dot of the whole
/// string: that rule would turn `.hidden` into an empty name and `v1.0/plate`
/// into `v1`, and both would collide with other pieces.
pub fn strip_extension(filename: &str) -> &str {
    let segment_start = filename.rfind('/').map(|i| i + 1).unwrap_or(0);
    match filename[segment_start..].rfind('.') {
        Some(0) | None => filename,
        Some(dot) if segment_start + dot + 1 == filename.len() => filename,
        Some(dot) => &filename[..segment_start + dot],
    }
}

/// Whether a declared filename refers to an SVG document (case-insensitive).
pub fn is_svg(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_folder() {
        let p = parse_entry_name("03-geometry");
        assert_eq!(p.prefix.as_deref(), Some("03"));
        assert_eq!(p.name, "geometry");
    }

    #[test]
    fn unprefixed_folder_kept_verbatim() {
        let p = parse_entry_name("patterns");
        assert_eq!(p.prefix, None);
        assert_eq!(p.name, "patterns");
    }

    #[test]
    fn only_first_prefix_is_stripped() {
        let p = parse_entry_name("2024-05-notes");
        assert_eq!(p.prefix.as_deref(), Some("2024"));
        assert_eq!(p.name, "05-notes");
    }

    #[test]
    fn prefix_only_yields_empty_name() {
        let p = parse_entry_name("01-");
        assert_eq!(p.prefix.as_deref(), Some("01"));
        assert_eq!(p.name, "");
    }

    #[test]
    fn non_digit_prefix_is_not_stripped() {
        assert_eq!(parse_entry_name("v2-drafts").name, "v2-drafts");
        assert_eq!(parse_entry_name("+5-x").name, "+5-x");
        assert_eq!(parse_entry_name("-x").name, "-x");
    }

    #[test]
    fn pure_number_without_dash_is_not_a_prefix() {
        let p = parse_entry_name("2024");
        assert_eq!(p.prefix, None);
        assert_eq!(p.name, "2024");
    }

    #[test]
    fn very_long_digit_run_is_a_prefix() {
        assert_eq!(section_id("000000000000000000000001-x"), "x");
    }

    #[test]
    fn section_id_examples() {
        assert_eq!(section_id("07-topology"), "topology");
        assert_eq!(section_id("patterns"), "patterns");
        assert_eq!(section_id("01-fractals"), "fractals");
    }

    #[test]
    fn piece_id_examples() {
        assert_eq!(
            piece_id("topology", "klein-bottle.svg"),
            "topology--klein-bottle"
        );
        assert_eq!(piece_id("fractals", "mandelbrot.png"), "fractals--mandelbrot");
    }

    #[test]
    fn piece_id_strips_only_final_extension() {
        assert_eq!(piece_id("s", "tile.v2.png"), "s--tile.v2");
    }

    #[test]
    fn strip_extension_edge_cases() {
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("file."), "file.");
        assert_eq!(strip_extension("plates/a.png"), "plates/a");
        assert_eq!(strip_extension("v1.0/plate"), "v1.0/plate");
    }

    #[test]
    fn svg_detection_is_case_insensitive() {
        assert!(is_svg("a.svg"));
        assert!(is_svg("A.SVG"));
        assert!(is_svg("plates/b.Svg"));
        assert!(!is_svg("a.svgz"));
        assert!(!is_svg("a.png"));
        assert!(!is_svg("svg"));
    }
}
