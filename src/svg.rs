//! Structural SVG minification.
//!
//! Vector pieces are published through this optimizer instead of being
//! copied verbatim. The document is parsed with `roxmltree`, converted to a
//! small owned tree, simplified, and written back without indentation.
//!
//! ## Passes
//!
//! | Pass | Config flag | Effect |
//! |------|-------------|--------|
//! | prolog | always | drops the XML declaration, DOCTYPE, top-level comments and PIs |
//! | comments | `remove_comments` | drops `<!-- … -->` inside the document |
//! | metadata | `remove_metadata` | drops `<metadata>` subtrees |
//! | editor data | `remove_editor_data` | drops Inkscape/Sodipodi/Illustrator/Sketch/Serif elements and attributes |
//! | whitespace | `collapse_whitespace` | drops whitespace-only text outside text content and `xml:space="preserve"` |
//! | containers | `remove_empty_containers` | drops `<g>`/`<defs>` without attributes or children |
//! | numbers | `precision` | rounds numbers in geometry attributes |
//!
//! Namespace declarations that nothing in the output uses any more are
//! dropped as well. Entities from an internal DTD are expanded by the parser,
//! so the output never needs the DOCTYPE.

use crate::config::SvgConfig;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespaces written by authoring tools that renderers ignore.
const EDITOR_NAMESPACES: &[&str] = &[
    "http://www.inkscape.org/namespaces/inkscape",
    "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd",
    "http://ns.adobe.com/AdobeIllustrator/10.0/",
    "http://ns.adobe.com/AdobeSVGViewerExtensions/3.0/",
    "http://ns.adobe.com/Extensibility/1.0/",
    "http://ns.adobe.com/Flows/1.0/",
    "http://ns.adobe.com/GenericCustomNamespace/1.0/",
    "http://ns.adobe.com/Graphs/1.0/",
    "http://ns.adobe.com/ImageReplacement/1.0/",
    "http://ns.adobe.com/SaveForWeb/1.0/",
    "http://ns.adobe.com/Variables/1.0/",
    "http://ns.adobe.com/XPath/1.0/",
    "http://www.bohemiancoding.com/sketch/ns",
    "http://www.serif.com/",
];

/// Attributes whose numbers are safe to round.
const GEOMETRY_ATTRIBUTES: &[&str] = &[
    "d",
    "points",
    "x",
    "y",
    "width",
    "height",
    "cx",
    "cy",
    "r",
    "rx",
    "ry",
    "x1",
    "y1",
    "x2",
    "y2",
    "transform",
    "viewBox",
    "stroke-width",
];

/// Elements whose whitespace-only text is rendered.
const TEXT_CONTENT_ELEMENTS: &[&str] = &["text", "tspan", "textPath"];

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern must compile")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("number pattern must compile")
});

static LEADING_ZEROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?0\d").expect("leading zero pattern must compile"));

#[derive(Error, Debug)]
pub enum SvgError {
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),
}

/// Minify an SVG document.
///
/// The result is well-formed XML rooted at `<svg>` with the same rendering
/// semantics as the input.
pub fn optimize(source: &str, config: &SvgConfig) -> Result<String, SvgError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(source, options)?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(SvgError::NotSvg(root.tag_name().name().to_string()));
    }

    let mut tree = match convert_element(root, config, false) {
        Some(tree) => tree,
        // The root itself is never an editor or metadata element once it is <svg>.
        None => return Err(SvgError::NotSvg(root.tag_name().name().to_string())),
    };
    if config.remove_empty_containers {
        prune_empty_containers(&mut tree);
    }

    let mut used = HashSet::new();
    collect_used_namespaces(&tree, &mut used);

    let mut out = String::with_capacity(source.len());
    write_element(&tree, &used, &mut out);
    Ok(out)
}

// ============================================================================
// Owned tree
// ============================================================================

#[derive(Debug)]
struct Element {
    /// Qualified name as written (`svg`, `xlink:href`, …).
    name: String,
    local: String,
    namespace: Option<String>,
    /// Namespace declarations made on this element: `(prefix, uri)`.
    declarations: Vec<(Option<String>, String)>,
    attributes: Vec<Attribute>,
    children: Vec<Child>,
}

#[derive(Debug)]
struct Attribute {
    name: String,
    namespace: Option<String>,
    value: String,
}

#[derive(Debug)]
enum Child {
    Element(Element),
    Text(String),
    Comment(String),
}

fn is_editor_namespace(uri: Option<&str>) -> bool {
    uri.is_some_and(|u| EDITOR_NAMESPACES.contains(&u))
}

fn qualified_name(node: roxmltree::Node, namespace: Option<&str>, local: &str) -> String {
    let prefix = namespace.and_then(|uri| {
        if uri == XML_NS {
            Some("xml")
        } else {
            node.lookup_prefix(uri)
        }
    });
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Convert a parsed element, applying the removal passes.
///
/// Returns `None` when the element itself is removed.
fn convert_element(
    node: roxmltree::Node,
    config: &SvgConfig,
    preserve_parent: bool,
) -> Option<Element> {
    let tag = node.tag_name();
    let local = tag.name();
    if config.remove_editor_data && is_editor_namespace(tag.namespace()) {
        return None;
    }
    if config.remove_metadata
        && local == "metadata"
        && tag.namespace().is_none_or(|ns| ns == SVG_NS)
    {
        return None;
    }

    let preserve = match node.attribute((XML_NS, "space")) {
        Some("preserve") => true,
        Some("default") => false,
        _ => preserve_parent,
    };
    let keeps_whitespace =
        preserve || !config.collapse_whitespace || TEXT_CONTENT_ELEMENTS.contains(&local);

    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let declarations = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .filter(|ns| !(config.remove_editor_data && is_editor_namespace(Some(ns.uri()))))
        .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
        .collect();

    let attributes = node
        .attributes()
        .filter(|a| !(config.remove_editor_data && is_editor_namespace(a.namespace())))
        .map(|a| {
            let value = if a.namespace().is_none() && a.name() == "d" {
                round_path_data(a.value(), config.precision)
            } else if a.namespace().is_none() && GEOMETRY_ATTRIBUTES.contains(&a.name()) {
                round_numbers(a.value(), config.precision)
            } else {
                a.value().to_string()
            };
            Attribute {
                name: qualified_name(node, a.namespace(), a.name()),
                namespace: a.namespace().map(str::to_string),
                value,
            }
        })
        .collect();

    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => {
                if let Some(el) = convert_element(child, config, preserve) {
                    children.push(Child::Element(el));
                }
            }
            roxmltree::NodeType::Text => {
                let text = child.text().unwrap_or_default();
                if text.trim().is_empty() && !keeps_whitespace {
                    continue;
                }
                children.push(Child::Text(text.to_string()));
            }
            roxmltree::NodeType::Comment if !config.remove_comments => {
                children.push(Child::Comment(child.text().unwrap_or_default().to_string()));
            }
            _ => {}
        }
    }

    Some(Element {
        name: qualified_name(node, tag.namespace(), local),
        local: local.to_string(),
        namespace: tag.namespace().map(str::to_string),
        declarations,
        attributes,
        children,
    })
}

fn is_empty_container(el: &Element) -> bool {
    matches!(el.local.as_str(), "g" | "defs")
        && el.namespace.as_deref().is_none_or(|ns| ns == SVG_NS)
        && el.attributes.is_empty()
        && el.children.is_empty()
}

/// Remove empty containers bottom-up, so a group holding only an empty
/// group disappears too.
fn prune_empty_containers(el: &mut Element) {
    for child in &mut el.children {
        if let Child::Element(inner) = child {
            prune_empty_containers(inner);
        }
    }
    el.children.retain(|child| match child {
        Child::Element(inner) => !is_empty_container(inner),
        _ => true,
    });
}

fn collect_used_namespaces(el: &Element, used: &mut HashSet<String>) {
    if let Some(ns) = &el.namespace {
        used.insert(ns.clone());
    }
    for attr in &el.attributes {
        if let Some(ns) = &attr.namespace {
            used.insert(ns.clone());
        }
    }
    for child in &el.children {
        if let Child::Element(inner) = child {
            collect_used_namespaces(inner, used);
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

fn write_element(el: &Element, used: &HashSet<String>, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (prefix, uri) in &el.declarations {
        if !used.contains(uri) {
            continue;
        }
        match prefix {
            Some(p) => {
                out.push_str(" xmlns:");
                out.push_str(p);
            }
            None => out.push_str(" xmlns"),
        }
        out.push_str("=\"");
        out.push_str(&escape_attribute(uri));
        out.push('"');
    }
    for attr in &el.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&attr.value));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Child::Element(inner) => write_element(inner, used, out),
            Child::Text(text) => out.push_str(&escape_text(text)),
            Child::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// Number rounding
// ============================================================================

/// Round every number in an attribute value to `precision` decimals.
///
/// A rounded number only replaces the original when it is shorter. Numbers
/// that lose their decimal point are separated from a following `.5`-style
/// number so path data keeps its token boundaries.
fn round_numbers(value: &str, precision: u8) -> String {
    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    for m in NUMBER.find_iter(value) {
        out.push_str(&value[last..m.start()]);
        let token = shorter_rounding(m.as_str(), precision);
        push_token(&mut out, &token, &value[m.end()..]);
        last = m.end();
    }
    out.push_str(&value[last..]);
    out
}

/// Round the numbers of path data, reading it command by command.
///
/// Arc flags (arguments 4 and 5 of `A`/`a`) are single characters and may
/// be written without separators: `a5 5 0 011.5 2` has flags `0` and `1`
/// followed by `1.5`. They are emitted as their own tokens.
fn round_path_data(d: &str, precision: u8) -> String {
    let mut out = String::with_capacity(d.len());
    let mut command = None;
    let mut arg = 0usize;
    let mut rest = d;
    while let Some(c) = rest.chars().next() {
        if c.is_ascii_alphabetic() {
            command = Some(c);
            arg = 0;
            out.push(c);
            rest = &rest[1..];
            continue;
        }
        let at_arc_flag = matches!(command, Some('a' | 'A')) && matches!(arg % 7, 3 | 4);
        if at_arc_flag && matches!(c, '0' | '1') {
            push_token(&mut out, &rest[..1], &rest[1..]);
            arg += 1;
            rest = &rest[1..];
            continue;
        }
        if let Some(m) = LEADING_NUMBER.find(rest) {
            let token = shorter_rounding(m.as_str(), precision);
            push_token(&mut out, &token, &rest[m.end()..]);
            arg += 1;
            rest = &rest[m.end()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// The rounded form of `original` when it is shorter. Tokens written with
/// leading zeros are kept as they are.
fn shorter_rounding(original: &str, precision: u8) -> String {
    if LEADING_ZEROS.is_match(original) {
        return original.to_string();
    }
    match round_number(original, precision) {
        Some(rounded) if rounded.len() < original.len() => rounded,
        _ => original.to_string(),
    }
}

/// Append a number token, inserting a space wherever it would otherwise
/// merge with its neighbour.
fn push_token(out: &mut String, token: &str, following: &str) {
    if token.starts_with(|c: char| c.is_ascii_digit())
        && out.ends_with(|c: char| c.is_ascii_digit() || c == '.')
    {
        out.push(' ');
    }
    out.push_str(token);
    if !token.contains(['.', 'e', 'E']) && following.starts_with('.') {
        out.push(' ');
    }
}

fn round_number(token: &str, precision: u8) -> Option<String> {
    let value: f64 = token.parse().ok()?;
    let factor = 10f64.powi(i32::from(precision));
    let rounded = (value * factor).round() / factor;
    if !rounded.is_finite() {
        return None;
    }
    let formatted = format!("{:.*}", usize::from(precision), rounded);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    Some(trimmed.to_string())
}
