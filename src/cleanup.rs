//! Markup normalization: deterministic cleanup of raw model output.
//!
//! The contract with the remote model is "may return fenced or unfenced
//! markup" — well-prompted models still occasionally wrap the document in
//! ` ```html ... ``` ` fences or leave stray fence markers mid-stream. This
//! module normalizes to unfenced, trimmed markup so downstream stages never
//! see model quirks. Each rule is a pure `&str -> String` function with no
//! shared state.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:html)?\s*\n(.*)\n```\s*$").unwrap());

/// Normalize raw model output to unfenced, trimmed markup.
///
/// Rules (applied in order):
/// 1. Strip an outer ` ```html ` fence wrapping the whole document
/// 2. Remove stray fence markers left mid-document
/// 3. Trim surrounding whitespace
pub fn clean_markup(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = remove_stray_fences(&s);
    s.trim().to_string()
}

fn strip_outer_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

fn remove_stray_fences(input: &str) -> String {
    input.replace("```html", "").replace("```", "")
}
