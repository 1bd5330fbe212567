//! Relevance scoring of candidate names against a free-text query.
//!
//! Scores are additive: one weight per query token found in the candidate
//! name, plus a bonus per quantity-unit expression (`"500ml"`, `"1 kg"`)
//! that the name repeats verbatim. Matching is accent- and case-insensitive.

use std::sync::OnceLock;

use mercado_core::{Candidate, ScoredCandidate};
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_TOKEN_MATCH_WEIGHT: f64 = 1.0;
pub const DEFAULT_UNIT_MATCH_BONUS: f64 = 1.5;
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 1.0;
pub const DEFAULT_MAX_RELEVANT: usize = 5;

/// Tuned scoring knobs. `Default` gives the production values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    /// Added for every query token contained in the candidate name.
    pub token_match: f64,
    /// Added for every `<digits><unit>` query expression contained in the name.
    pub unit_bonus: f64,
    /// Minimum score for [`relevance_filter`] to consider a candidate relevant.
    pub relevance_threshold: f64,
    /// Maximum number of candidates [`relevance_filter`] keeps.
    pub max_relevant: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            token_match: DEFAULT_TOKEN_MATCH_WEIGHT,
            unit_bonus: DEFAULT_UNIT_MATCH_BONUS,
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            max_relevant: DEFAULT_MAX_RELEVANT,
        }
    }
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9_]+").expect("token regex must compile"))
}

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+\s*(?:g|kg|ml|l|litro|un)").expect("unit regex must compile")
    })
}

/// Lowercases and strips diacritics (`"Feijão"` → `"feijao"`).
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Scores `name` against `query`. A missing name scores `0.0`.
#[must_use]
pub fn score(query: &str, name: Option<&str>, weights: &ScoringWeights) -> f64 {
    let Some(name) = name else {
        return 0.0;
    };
    let query = normalize_text(query);
    let name = normalize_text(name);

    let mut total = 0.0;
    for token in token_re().find_iter(&query) {
        if name.contains(token.as_str()) {
            total += weights.token_match;
        }
    }
    for unit in unit_re().find_iter(&query) {
        if name.contains(unit.as_str()) {
            total += weights.unit_bonus;
        }
    }
    total
}

/// Picks the highest-scoring candidate; ties and an all-zero field resolve
/// to the earliest candidate. `None` only for an empty slice.
#[must_use]
pub fn select_best(
    query: &str,
    candidates: &[Candidate],
    weights: &ScoringWeights,
) -> Option<ScoredCandidate> {
    let mut best: Option<ScoredCandidate> = None;
    for candidate in candidates {
        let s = score(query, candidate.name.as_deref(), weights);
        if best.as_ref().is_some_and(|b| b.score >= s) {
            continue;
        }
        best = Some(ScoredCandidate {
            candidate: candidate.clone(),
            score: s,
        });
    }
    best
}

/// Scores every candidate and sorts descending. The sort is stable, so equal
/// scores keep their extraction order.
#[must_use]
pub fn rank(query: &str, candidates: &[Candidate], weights: &ScoringWeights) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|c| ScoredCandidate {
            candidate: c.clone(),
            score: score(query, c.name.as_deref(), weights),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Keeps the best candidates scoring at least `relevance_threshold`, up to
/// `max_relevant`. If none qualifies, returns the first `max_relevant` in
/// their original order instead, so a non-empty input never comes back empty.
#[must_use]
pub fn relevance_filter(
    query: &str,
    candidates: &[Candidate],
    weights: &ScoringWeights,
) -> Vec<Candidate> {
    let relevant: Vec<Candidate> = rank(query, candidates, weights)
        .into_iter()
        .filter(|s| s.score >= weights.relevance_threshold)
        .take(weights.max_relevant)
        .map(|s| s.candidate)
        .collect();

    if relevant.is_empty() {
        candidates.iter().take(weights.max_relevant).cloned().collect()
    } else {
        relevant
    }
}
