//! Client for the free-text catalog search service.
//!
//! The service answers in one of three shapes: structured JSON, plain text
//! that still carries `"codigo_ean": ...` fragments or summary lines, or
//! something unusable. [`SearchOutcome`] keeps those apart, and
//! [`summarize`] turns any of them into the `EANS_ENCONTRADOS:` block the
//! resolvers parse.

use std::time::Duration;

use mercado_core::{AppConfig, Candidate};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Url};
use serde_json::{json, Map, Value};

use crate::error::{preview, ResolverError};
use crate::extract::{scan_text, MAX_CANDIDATES};
use crate::score::{relevance_filter, ScoringWeights};

/// Header line that marks a summary containing at least one candidate.
pub const RESULTS_MARKER: &str = "EANS_ENCONTRADOS";

pub const NO_MATCH_MESSAGE: &str = "Nenhum produto encontrado com esse termo.";

const IDENTIFIER_KEYS: &[&str] = &["ean", "ean_code", "codigo_ean", "barcode", "gtin"];

const NAME_KEYS: &[&str] = &[
    "produto",
    "product",
    "name",
    "nome",
    "title",
    "descricao",
    "description",
];

/// Candidates recovered from one search response, tagged by how they were
/// recovered.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Body parsed as JSON; candidates come from a walk of the document.
    Structured(Vec<Candidate>),
    /// Body was not JSON, but a text scan recovered candidates.
    TextScanned(Vec<Candidate>),
    /// Nothing usable. Holds a preview of the body.
    Opaque(String),
}

impl SearchOutcome {
    /// Classifies a raw response body.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        if let Ok(document) = serde_json::from_str::<Value>(body) {
            let mut found = Vec::new();
            walk(&document, &mut found);
            found.truncate(MAX_CANDIDATES);
            return SearchOutcome::Structured(found);
        }
        let scanned = scan_text(body);
        if scanned.is_empty() {
            SearchOutcome::Opaque(preview(body))
        } else {
            SearchOutcome::TextScanned(scanned)
        }
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            SearchOutcome::Structured(c) | SearchOutcome::TextScanned(c) => c,
            SearchOutcome::Opaque(_) => &[],
        }
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Blank values fall through to the next alias.
fn code_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn probe_object(map: &Map<String, Value>) -> Option<Candidate> {
    let identifier = IDENTIFIER_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(code_value);
    let name = NAME_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(text_value);
    Candidate::new(identifier, name)
}

/// Depth-first walk collecting candidates from every object, then from
/// every string leaf via [`scan_text`]. Stops once [`MAX_CANDIDATES`] is hit.
fn walk(value: &Value, out: &mut Vec<Candidate>) {
    if out.len() >= MAX_CANDIDATES {
        return;
    }
    match value {
        Value::Object(map) => {
            out.extend(probe_object(map));
            for child in map.values() {
                walk(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        Value::String(text) => out.extend(scan_text(text)),
        _ => {}
    }
}

/// Renders candidates as the numbered summary block, or `None` when empty.
#[must_use]
pub fn render_candidates(candidates: &[Candidate]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let mut lines = vec![format!("{RESULTS_MARKER}:")];
    for (i, c) in candidates.iter().enumerate() {
        let n = i + 1;
        let line = match (c.identifier.as_deref(), c.name.as_deref()) {
            (Some(id), Some(name)) => format!("{n}) {id} - {name}"),
            (Some(id), None) => format!("{n}) {id}"),
            (None, Some(name)) => format!("{n}) {name}"),
            (None, None) => continue,
        };
        lines.push(line);
    }
    Some(lines.join("\n"))
}

/// Produces the text summary of one search outcome.
///
/// Candidates go through [`relevance_filter`] first. An empty candidate list
/// renders [`NO_MATCH_MESSAGE`]; an opaque body is passed through as its
/// preview.
#[must_use]
pub fn summarize(query: &str, outcome: &SearchOutcome, weights: &ScoringWeights) -> String {
    match outcome {
        SearchOutcome::Structured(found) | SearchOutcome::TextScanned(found) => {
            let relevant = relevance_filter(query, found, weights);
            render_candidates(&relevant).unwrap_or_else(|| NO_MATCH_MESSAGE.to_owned())
        }
        SearchOutcome::Opaque(body) => body.clone(),
    }
}

/// Prefixes `Bearer ` unless the token already carries a scheme.
fn bearer_value(token: &str) -> String {
    let token = token.trim();
    if token.to_lowercase().starts_with("bearer ") {
        token.to_owned()
    } else {
        format!("Bearer {token}")
    }
}

/// HTTP client for `POST {"query": ...}` catalog searches.
pub struct CatalogSearchClient {
    client: Client,
    url: String,
    authorization: String,
    apikey: Option<String>,
}

impl CatalogSearchClient {
    /// Builds a search client.
    ///
    /// Backticks and surrounding whitespace are stripped from `url`, a bare
    /// `auth_token` gets a `Bearer ` prefix, and a blank `apikey` is ignored.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::InvalidUrl`] when `url` does not parse.
    /// - [`ResolverError::MissingSetting`] when `auth_token` is blank.
    /// - [`ResolverError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        url: &str,
        auth_token: &str,
        apikey: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ResolverError> {
        let url = url.replace('`', "").trim().to_owned();
        Url::parse(&url).map_err(|e| ResolverError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        if auth_token.trim().is_empty() {
            return Err(ResolverError::MissingSetting("MERCADO_SEARCH_AUTH"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url,
            authorization: bearer_value(auth_token),
            apikey: apikey
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_owned),
        })
    }

    /// # Errors
    ///
    /// See [`CatalogSearchClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ResolverError> {
        Self::new(
            &config.search_url,
            &config.search_auth_token,
            config.search_apikey.as_deref(),
            config.search_timeout_secs,
            &config.user_agent,
        )
    }

    /// Runs one search and classifies the response.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::Timeout`] when the request exceeds the client timeout.
    /// - [`ResolverError::UpstreamStatus`] for any non-2xx response.
    /// - [`ResolverError::Http`] for other transport failures.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, ResolverError> {
        let query = query.trim();
        tracing::debug!(query, "querying catalog search");

        let mut request = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .json(&json!({ "query": query }));
        if let Some(key) = &self.apikey {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ResolverError::from_request(e, &self.url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolverError::from_request(e, &self.url))?;

        if !status.is_success() {
            tracing::warn!(query, status = status.as_u16(), "catalog search returned an error status");
            return Err(ResolverError::upstream(status, &body));
        }

        let outcome = SearchOutcome::from_body(&body);
        tracing::debug!(
            query,
            candidates = outcome.candidates().len(),
            "catalog search complete"
        );
        Ok(outcome)
    }

    /// Searches and renders the summary text in one step.
    ///
    /// # Errors
    ///
    /// See [`CatalogSearchClient::search`].
    pub async fn lookup(&self, query: &str, weights: &ScoringWeights) -> Result<String, ResolverError> {
        let outcome = self.search(query).await?;
        Ok(summarize(query, &outcome, weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(outcome: &SearchOutcome) -> Vec<&str> {
        outcome
            .candidates()
            .iter()
            .filter_map(|c| c.identifier.as_deref())
            .collect()
    }

    #[test]
    fn structured_walk_reads_nested_objects_in_document_order() {
        let body = r#"{"data":{"items":[
            {"gtin": 111, "title": "ARROZ BRANCO 1KG"},
            {"ean": "222", "nome": "FEIJAO"},
            {"barcode": true, "name": "SEM CODIGO"}
        ]}}"#;
        let outcome = SearchOutcome::from_body(body);
        assert!(matches!(outcome, SearchOutcome::Structured(_)));
        assert_eq!(ids(&outcome), ["111", "222"]);
        let last = &outcome.candidates()[2];
        assert_eq!(last.identifier, None);
        assert_eq!(last.name.as_deref(), Some("SEM CODIGO"));
    }

    #[test]
    fn blank_alias_falls_through_to_next_populated_one() {
        let body = r#"[{"ean": "", "codigo_ean": "789", "produto": " ", "nome": "ARROZ BRANCO"}]"#;
        let outcome = SearchOutcome::from_body(body);
        assert_eq!(
            outcome.candidates(),
            [Candidate::new(Some("789".into()), Some("ARROZ BRANCO".into())).unwrap()]
        );
    }

    #[test]
    fn structured_walk_rescans_string_leaves() {
        let body = r#"{"answer": "1) 789 - CAFE 500G\n2) 790 - CAFE 250G"}"#;
        let outcome = SearchOutcome::from_body(body);
        assert_eq!(ids(&outcome), ["789", "790"]);
    }

    #[test]
    fn structured_walk_is_capped() {
        let items: Vec<Value> = (0..80)
            .map(|i| json!({"ean": i.to_string(), "nome": format!("P{i}")}))
            .collect();
        let outcome = SearchOutcome::from_body(&Value::Array(items).to_string());
        assert_eq!(outcome.candidates().len(), MAX_CANDIDATES);
    }

    #[test]
    fn text_body_falls_back_to_scan() {
        let outcome = SearchOutcome::from_body(r#"resultado: "codigo_ean": 555, "produto": "LEITE""#);
        assert!(matches!(outcome, SearchOutcome::TextScanned(_)));
        assert_eq!(ids(&outcome), ["555"]);
    }

    #[test]
    fn unusable_body_is_opaque_preview() {
        let body = "x".repeat(500);
        let SearchOutcome::Opaque(p) = SearchOutcome::from_body(&body) else {
            panic!("expected opaque outcome");
        };
        assert_eq!(p.len(), crate::error::BODY_PREVIEW_CHARS);
    }

    #[test]
    fn render_handles_partial_candidates() {
        let c = vec![
            Candidate::new(Some("1".into()), Some("A".into())).unwrap(),
            Candidate::new(Some("2".into()), None).unwrap(),
            Candidate::new(None, Some("C".into())).unwrap(),
        ];
        assert_eq!(
            render_candidates(&c).unwrap(),
            "EANS_ENCONTRADOS:\n1) 1 - A\n2) 2\n3) C"
        );
        assert!(render_candidates(&[]).is_none());
    }

    #[test]
    fn summarize_filters_for_relevance() {
        let outcome = SearchOutcome::Structured(vec![
            Candidate::new(Some("9".into()), Some("SABAO".into())).unwrap(),
            Candidate::new(Some("1".into()), Some("ARROZ BRANCO".into())).unwrap(),
        ]);
        let text = summarize("arroz", &outcome, &ScoringWeights::default());
        assert_eq!(text, "EANS_ENCONTRADOS:\n1) 1 - ARROZ BRANCO");
    }

    #[test]
    fn summarize_empty_and_opaque() {
        let w = ScoringWeights::default();
        assert_eq!(
            summarize("x", &SearchOutcome::Structured(Vec::new()), &w),
            NO_MATCH_MESSAGE
        );
        assert_eq!(
            summarize("x", &SearchOutcome::Opaque("erro interno".into()), &w),
            "erro interno"
        );
    }

    #[test]
    fn bearer_prefix_is_added_once() {
        assert_eq!(bearer_value("abc"), "Bearer abc");
        assert_eq!(bearer_value("Bearer abc"), "Bearer abc");
        assert_eq!(bearer_value(" bearer abc "), "bearer abc");
    }

    #[test]
    fn new_strips_backticks_and_requires_token() {
        let client =
            CatalogSearchClient::new(" `https://busca.local/fn` ", "t", Some(" "), 5, "test").unwrap();
        assert_eq!(client.url, "https://busca.local/fn");
        assert!(client.apikey.is_none());

        assert!(matches!(
            CatalogSearchClient::new("https://busca.local/fn", "  ", None, 5, "test"),
            Err(ResolverError::MissingSetting(_))
        ));
    }
}
