//! Client for the per-identifier price/stock service.

pub mod normalize;

use std::time::Duration;

use mercado_core::{AppConfig, PriceRecord};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::{preview, ResolverError};

pub use normalize::{filter_catalog_fields, normalize_payload, normalize_record};

/// Body of a successful price lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    /// Available records, in upstream order. Empty when nothing is in stock.
    Records(Vec<PriceRecord>),
    /// The service answered 2xx with a body that is not JSON.
    Opaque(String),
}

impl PriceLookup {
    /// First available record, if any.
    #[must_use]
    pub fn into_first(self) -> Option<PriceRecord> {
        match self {
            PriceLookup::Records(records) => records.into_iter().next(),
            PriceLookup::Opaque(_) => None,
        }
    }
}

/// Keeps only the ASCII digits of `input`.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidIdentifier`] when no digit remains.
pub fn sanitize_identifier(input: &str) -> Result<String, ResolverError> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ResolverError::InvalidIdentifier {
            input: input.to_owned(),
        });
    }
    Ok(digits)
}

/// HTTP client for `GET <base>/<identifier>` price lookups.
pub struct PriceClient {
    client: Client,
    base_url: String,
}

impl PriceClient {
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidUrl`] for an unparseable base URL and
    /// [`ResolverError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ResolverError> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|e| ResolverError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// # Errors
    ///
    /// See [`PriceClient::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ResolverError> {
        Self::new(
            &config.price_base_url,
            config.price_timeout_secs,
            &config.user_agent,
        )
    }

    fn record_url(&self, digits: &str) -> String {
        format!("{}/{digits}", self.base_url)
    }

    /// Looks up price and stock for one identifier.
    ///
    /// The identifier is reduced to its digits before the request. A JSON
    /// object body counts as a single record; a non-JSON body comes back as
    /// [`PriceLookup::Opaque`] rather than an error.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::InvalidIdentifier`] when `identifier` has no digits
    ///   (no request is made).
    /// - [`ResolverError::Timeout`] when the request exceeds the client timeout.
    /// - [`ResolverError::UpstreamStatus`] for any non-2xx response.
    /// - [`ResolverError::Http`] for other transport failures.
    pub async fn lookup(&self, identifier: &str) -> Result<PriceLookup, ResolverError> {
        let digits = sanitize_identifier(identifier)?;
        let url = self.record_url(&digits);
        tracing::debug!(identifier = %digits, "querying price service");

        let body = self.get_text(&url).await?;
        let Ok(payload) = serde_json::from_str::<Value>(&body) else {
            tracing::warn!(
                identifier = %digits,
                body = %preview(&body),
                "price service returned a non-JSON body"
            );
            return Ok(PriceLookup::Opaque(body));
        };

        let records = normalize_payload(&payload);
        tracing::debug!(identifier = %digits, available = records.len(), "price lookup complete");
        Ok(PriceLookup::Records(records))
    }

    /// Fetches an arbitrary stock endpoint and strips fiscal and cost columns
    /// from the JSON it returns.
    ///
    /// # Errors
    ///
    /// - [`ResolverError::InvalidUrl`] when `url` does not parse.
    /// - [`ResolverError::Deserialize`] when the body is not JSON.
    /// - Otherwise as [`PriceClient::lookup`].
    pub async fn query_stock(&self, url: &str) -> Result<Value, ResolverError> {
        let url = url.trim();
        Url::parse(url).map_err(|e| ResolverError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        tracing::debug!(%url, "querying stock endpoint");

        let body = self.get_text(url).await?;
        let payload: Value =
            serde_json::from_str(&body).map_err(|source| ResolverError::Deserialize {
                context: format!("stock response from {url}"),
                source,
            })?;
        Ok(filter_catalog_fields(payload))
    }

    async fn get_text(&self, url: &str) -> Result<String, ResolverError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ResolverError::from_request(e, url))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ResolverError::from_request(e, url))?;

        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "price service returned an error status");
            return Err(ResolverError::upstream(status, &body));
        }
        Ok(body)
    }
}
