//! Locating and normalizing inline SVG blocks in model-generated markup.
//!
//! Substitution works on the raw markup string, not a re-serialized DOM:
//! blocks are located byte-exactly so that a document containing no vector
//! graphics passes through the export step completely unchanged, and so a
//! graphic whose conversion fails keeps its original bytes. `scraper` is
//! used per-block to read attributes; it never rewrites the document.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Replaced-element default size, used when neither explicit dimensions nor
/// a viewBox are present.
const DEFAULT_WIDTH: f64 = 300.0;
const DEFAULT_HEIGHT: f64 = 150.0;

static SVG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("svg").unwrap());

/// One located `<svg>…</svg>` block in the source markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SvgBlock {
    /// Byte offset of the `<` of the opening tag.
    pub start: usize,
    /// Byte offset one past the `>` of the matching closing tag.
    pub end: usize,
    /// The block's source text, `markup[start..end]`.
    pub source: String,
}

/// A block rewritten into standalone, renderable SVG markup.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedSvg {
    /// Self-contained SVG text with resolved dimensions and a namespace
    /// declaration.
    pub svg: String,
    /// Logical width in CSS pixels.
    pub width: f64,
    /// Logical height in CSS pixels.
    pub height: f64,
}

/// Locate every top-level SVG block in the markup.
///
/// The scan is quote-aware inside tags and depth-aware across nested
/// `<svg>` elements. An unterminated block aborts the scan, leaving the
/// remainder of the document untouched.
pub(crate) fn find_svg_blocks(markup: &str) -> Vec<SvgBlock> {
    let bytes = markup.as_bytes();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if is_open_tag_at(bytes, i) {
            match scan_block(bytes, i) {
                Some(end) => {
                    blocks.push(SvgBlock {
                        start: i,
                        end,
                        source: markup[i..end].to_string(),
                    });
                    i = end;
                    continue;
                }
                None => break,
            }
        }
        i += 1;
    }

    blocks
}

/// Rewrite one located block into standalone SVG with resolved dimensions.
///
/// Dimension resolution order: explicit `width`/`height` attributes, then
/// viewBox components 3–4, then the 300×150 replaced-element default. The
/// resolved dimensions are written back onto the root tag and a namespace
/// declaration is guaranteed, so the blob serializes as valid standalone
/// markup for the rasterizer.
///
/// Returns `None` when the block has no parsable `<svg>` root at all.
pub(crate) fn normalize_block(source: &str) -> Option<NormalizedSvg> {
    let fragment = Html::parse_fragment(source);
    let element = fragment.select(&SVG_SELECTOR).next()?;
    let value = element.value();

    let (width, height) = resolve_dimensions(
        value.attr("width"),
        value.attr("height"),
        value.attr("viewBox").or_else(|| value.attr("viewbox")),
    );

    let mut open = String::from("<svg");
    for (name, attr_value) in value.attrs() {
        if matches!(name, "width" | "height" | "xmlns") {
            continue;
        }
        open.push(' ');
        open.push_str(name);
        open.push_str("=\"");
        open.push_str(&escape_attr(attr_value));
        open.push('"');
    }
    open.push_str(&format!(
        " xmlns=\"{SVG_NS}\" width=\"{}\" height=\"{}\">",
        fmt_len(width),
        fmt_len(height)
    ));

    let bytes = source.as_bytes();
    let (open_end, self_closing) = scan_tag_end(bytes, 0)?;
    let inner = if self_closing {
        ""
    } else {
        let close_start = (0..bytes.len()).rev().find(|&j| is_close_tag_at(bytes, j))?;
        &source[open_end..close_start]
    };

    Some(NormalizedSvg {
        svg: format!("{open}{inner}</svg>"),
        width,
        height,
    })
}

/// Resolve logical dimensions from attributes.
fn resolve_dimensions(
    width: Option<&str>,
    height: Option<&str>,
    view_box: Option<&str>,
) -> (f64, f64) {
    if let (Some(w), Some(h)) = (
        width.and_then(parse_length),
        height.and_then(parse_length),
    ) {
        return (w, h);
    }

    if let Some((w, h)) = view_box.and_then(parse_view_box) {
        return (w, h);
    }

    (DEFAULT_WIDTH, DEFAULT_HEIGHT)
}

/// Parse a length attribute. Unit suffix `px` is tolerated; percentages are
/// relative to a container this pipeline does not have, so they fall through
/// to the next resolution source.
fn parse_length(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.contains('%') {
        return None;
    }
    let s = s.strip_suffix("px").unwrap_or(s).trim();
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Parse `viewBox="min-x min-y width height"` and return (width, height).
fn parse_view_box(raw: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.len() != 4 {
        return None;
    }
    let (w, h) = (parts[2], parts[3]);
    (w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()).then_some((w, h))
}

/// Format a length for attribute output, dropping a redundant `.0`.
pub(crate) fn fmt_len(v: f64) -> String {
    if (v - v.round()).abs() < f64::EPSILON {
        format!("{}", v.round() as i64)
    } else {
        format!("{v}")
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

// ── Tag scanning ─────────────────────────────────────────────────────────

/// Is an `<svg` opening tag rooted at `i`?
fn is_open_tag_at(bytes: &[u8], i: usize) -> bool {
    if i + 4 > bytes.len() || bytes[i] != b'<' {
        return false;
    }
    if !bytes[i + 1..i + 4].eq_ignore_ascii_case(b"svg") {
        return false;
    }
    matches!(bytes.get(i + 4), None | Some(&b'>') | Some(&b'/'))
        || bytes.get(i + 4).is_some_and(|c| c.is_ascii_whitespace())
}

/// Is a `</svg` closing tag rooted at `i`?
fn is_close_tag_at(bytes: &[u8], i: usize) -> bool {
    if i + 5 > bytes.len() || bytes[i] != b'<' || bytes[i + 1] != b'/' {
        return false;
    }
    if !bytes[i + 2..i + 5].eq_ignore_ascii_case(b"svg") {
        return false;
    }
    matches!(bytes.get(i + 5), None | Some(&b'>'))
        || bytes.get(i + 5).is_some_and(|c| c.is_ascii_whitespace())
}

/// From the `<` at `start`, find the end of the tag (one past `>`).
///
/// Quote-aware so a `>` inside an attribute value does not end the tag.
/// The second element is true for a self-closing tag (`<svg … />`).
fn scan_tag_end(bytes: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut quote: Option<u8> = None;
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if b == b'>' {
                    let self_closing = j > start && bytes[j - 1] == b'/';
                    return Some((j + 1, self_closing));
                }
            }
        }
        j += 1;
    }
    None
}

/// From an opening tag at `start`, find the end of the whole block,
/// tracking nested `<svg>` depth.
fn scan_block(bytes: &[u8], start: usize) -> Option<usize> {
    let (open_end, self_closing) = scan_tag_end(bytes, start)?;
    if self_closing {
        return Some(open_end);
    }

    let mut depth = 1usize;
    let mut j = open_end;
    while j < bytes.len() {
        if bytes[j] == b'<' {
            if is_close_tag_at(bytes, j) {
                let mut k = j + 5;
                while k < bytes.len() && bytes[k] != b'>' {
                    k += 1;
                }
                if k == bytes.len() {
                    return None;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(k + 1);
                }
                j = k + 1;
                continue;
            }
            if is_open_tag_at(bytes, j) {
                let (e, nested_self_closing) = scan_tag_end(bytes, j)?;
                if !nested_self_closing {
                    depth += 1;
                }
                j = e;
                continue;
            }
        }
        j += 1;
    }
    None
}
