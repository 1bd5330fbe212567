//! Alternate identifier discovery through a generative model with a
//! file-search tool over an indexed catalog.

use std::sync::OnceLock;
use std::time::Duration;

use mercado_core::{AppConfig, Candidate};
use regex::Regex;
use reqwest::{Client, Url};
use serde_json::{json, Value};

use crate::error::ResolverError;

/// Returned in place of an empty completion.
pub const EMPTY_COMPLETION_MESSAGE: &str = "Nenhum produto encontrado.";

const MAX_OUTPUT_TOKENS: u32 = 100;

fn bare_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{3,13})\b").expect("bare code regex must compile"))
}

fn build_prompt(query: &str) -> String {
    format!(
        "Busque no catálogo o produto mais parecido com \"{query}\". \
         Responda com uma única linha no formato: EAN | NOME_PRODUTO | CATEGORIA. \
         Se não encontrar, responda apenas: Nenhum produto encontrado."
    )
}

/// Extracts the identifier line from a completion.
///
/// The first line of the form `<digits> | <name> | ...` wins. Failing that,
/// the first standalone 3 to 13 digit number is taken, without a name.
#[must_use]
pub fn parse_completion(text: &str) -> Option<Candidate> {
    for line in text.trim().lines() {
        if !line.contains('|') {
            continue;
        }
        let mut parts = line.split('|').map(str::trim);
        let (Some(code), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        let code = code.replace(' ', "");
        if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
            return Candidate::new(Some(code), Some(name.to_owned()));
        }
    }
    bare_code_re()
        .captures(text)
        .and_then(|caps| Candidate::new(caps.get(1).map(|m| m.as_str().to_owned()), None))
}

/// HTTP client for the generative file-search endpoint.
pub struct VectorSearchClient {
    client: Client,
    url: Url,
    api_key: String,
    store_name: String,
}

impl VectorSearchClient {
    /// # Errors
    ///
    /// - [`ResolverError::InvalidUrl`] when `url` does not parse.
    /// - [`ResolverError::MissingSetting`] when the key or store is blank.
    /// - [`ResolverError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        url: &str,
        api_key: &str,
        store_name: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ResolverError> {
        let url = Url::parse(url.trim()).map_err(|e| ResolverError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if api_key.trim().is_empty() {
            return Err(ResolverError::MissingSetting("MERCADO_VECTOR_API_KEY"));
        }
        if store_name.trim().is_empty() {
            return Err(ResolverError::MissingSetting("MERCADO_VECTOR_STORE"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url,
            api_key: api_key.trim().to_owned(),
            store_name: store_name.trim().to_owned(),
        })
    }

    /// # Errors
    ///
    /// [`ResolverError::MissingSetting`] when the vector key or store is not
    /// configured; otherwise see [`VectorSearchClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ResolverError> {
        let api_key = config
            .vector_api_key
            .as_deref()
            .ok_or(ResolverError::MissingSetting("MERCADO_VECTOR_API_KEY"))?;
        let store = config
            .vector_store_name
            .as_deref()
            .ok_or(ResolverError::MissingSetting("MERCADO_VECTOR_STORE"))?;
        Self::new(
            &config.vector_url,
            api_key,
            store,
            config.vector_timeout_secs,
            &config.user_agent,
        )
    }

    fn request_body(&self, query: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": build_prompt(query) }] }],
            "tools": [{
                "fileSearch": { "fileSearchStoreNames": [self.store_name] }
            }],
            "generationConfig": {
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "temperature": 0
            }
        })
    }

    /// Asks the model for the best catalog line matching `query` and returns
    /// the raw completion text, or [`EMPTY_COMPLETION_MESSAGE`] when the
    /// model produced nothing.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::Timeout`] when the request exceeds the client timeout.
    /// - [`ResolverError::UpstreamStatus`] for any non-2xx response.
    /// - [`ResolverError::Deserialize`] when the body is not JSON.
    /// - [`ResolverError::Http`] for other transport failures.
    pub async fn search(&self, query: &str) -> Result<String, ResolverError> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);
        // the key rides in the query string, so log the path only
        let endpoint = self.url.path().to_owned();
        tracing::debug!(query, %endpoint, "querying vector search");

        let response = self
            .client
            .post(url)
            .json(&self.request_body(query))
            .send()
            .await
            .map_err(|e| ResolverError::from_request(e, &endpoint))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolverError::from_request(e, &endpoint))?;

        if !status.is_success() {
            tracing::warn!(query, status = status.as_u16(), "vector search returned an error status");
            return Err(ResolverError::upstream(status, &body));
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|source| ResolverError::Deserialize {
                context: "vector search response".to_owned(),
                source,
            })?;
        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();
        if text.is_empty() {
            return Ok(EMPTY_COMPLETION_MESSAGE.to_owned());
        }
        Ok(text.to_owned())
    }
}
