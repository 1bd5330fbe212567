//! Candidate extraction from unstructured search output.
//!
//! Every function here is total: malformed, empty or binary-looking input
//! yields an empty `Vec`, never an error.

use std::sync::OnceLock;

use mercado_core::Candidate;
use regex::Regex;

/// Upper bound on candidates carried forward from a single search response.
pub const MAX_CANDIDATES: usize = 50;

/// `"<index>) <identifier> - <name>"`, tolerant of surrounding whitespace.
fn summary_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\d+\)\s*(\d+)\s*-\s*(.+)$").expect("summary line regex must compile")
    })
}

fn ean_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""codigo_ean"\s*:\s*([0-9]+)"#).expect("ean fragment regex must compile")
    })
}

fn name_fragment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""produto"\s*:\s*"([^"]+)""#).expect("name fragment regex must compile")
    })
}

/// Parses `"1) 7891149103300 - ARROZ BRANCO 1KG"` style lines, in line order.
///
/// Lines that do not match are skipped. The result is not capped; callers
/// take at most [`MAX_CANDIDATES`].
#[must_use]
pub fn extract_candidates(text: &str) -> Vec<Candidate> {
    text.lines()
        .filter_map(|line| {
            let caps = summary_line_re().captures(line)?;
            Candidate::new(
                caps.get(1).map(|m| m.as_str().to_owned()),
                caps.get(2).map(|m| m.as_str().to_owned()),
            )
        })
        .collect()
}

/// Pairs `"codigo_ean": <digits>` and `"produto": "<name>"` fragments found
/// anywhere in `text`, in order of appearance.
///
/// When both kinds are present they are zipped to the shorter list; when only
/// one kind is present every occurrence becomes a half-filled candidate.
#[must_use]
pub fn scan_json_fragments(text: &str) -> Vec<Candidate> {
    let eans: Vec<&str> = ean_fragment_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let names: Vec<&str> = name_fragment_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    let limit = if eans.is_empty() || names.is_empty() {
        eans.len().max(names.len())
    } else {
        eans.len().min(names.len())
    };

    (0..limit.min(MAX_CANDIDATES))
        .filter_map(|i| {
            Candidate::new(
                eans.get(i).map(|s| (*s).to_owned()),
                names.get(i).map(|s| (*s).to_owned()),
            )
        })
        .collect()
}

/// Best-effort scan of a free-form string: embedded JSON fragments first,
/// summary-style lines second.
#[must_use]
pub fn scan_text(text: &str) -> Vec<Candidate> {
    let fragments = scan_json_fragments(text);
    if !fragments.is_empty() {
        return fragments;
    }
    let mut lines = extract_candidates(text);
    lines.truncate(MAX_CANDIDATES);
    lines
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
