//! Single-query resolution: query text in, priced record or typed failure out.
//!
//! Resolution never returns `Err`. Every upstream error, parse miss and
//! panic ends up as an [`ItemResolution`] carrying a [`FailureKind`], so a
//! batch can always account for every query it was given.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use mercado_core::{AppConfig, FailureKind, ItemResolution};

use crate::error::{preview, ResolverError};
use crate::extract::{extract_candidates, MAX_CANDIDATES};
use crate::price::{PriceClient, PriceLookup};
use crate::score::{select_best, ScoringWeights};
use crate::search::{CatalogSearchClient, RESULTS_MARKER};
use crate::vector::{parse_completion, VectorSearchClient};

/// Anything that can turn one query into an [`ItemResolution`].
///
/// Implementations must not fail: all errors are folded into the returned
/// resolution.
pub trait ItemResolver {
    fn resolve<'a>(&'a self, query: &'a str) -> impl Future<Output = ItemResolution> + 'a;
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "resolver panicked".to_owned()
    }
}

/// Runs `attempt`, converting a panic into [`FailureKind::InternalError`].
async fn guarded<F>(query: &str, attempt: F) -> ItemResolution
where
    F: Future<Output = ItemResolution>,
{
    match AssertUnwindSafe(attempt).catch_unwind().await {
        Ok(resolution) => resolution,
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            tracing::error!(query, %detail, "resolution panicked");
            ItemResolution::failed(query, None, FailureKind::InternalError { detail })
        }
    }
}

fn failure(query: &str, identifier: Option<String>, err: &ResolverError) -> ItemResolution {
    let kind = FailureKind::from(err);
    tracing::warn!(query, identifier = ?identifier, error = %err, %kind, "query failed");
    ItemResolution::failed(query, identifier, kind)
}

fn miss(query: &str, identifier: Option<String>, kind: FailureKind) -> ItemResolution {
    tracing::info!(query, identifier = ?identifier, %kind, "query unresolved");
    ItemResolution::failed(query, identifier, kind)
}

/// Price step shared by every resolver: first available record wins.
async fn price_identifier(prices: &PriceClient, query: &str, identifier: String) -> ItemResolution {
    match prices.lookup(&identifier).await {
        Ok(PriceLookup::Records(records)) => match records.into_iter().next() {
            Some(record) => {
                tracing::info!(query, %identifier, price = ?record.price, "query resolved");
                ItemResolution::found(query, Some(identifier), record)
            }
            None => miss(query, Some(identifier), FailureKind::PriceNotFound),
        },
        Ok(PriceLookup::Opaque(body)) => {
            tracing::warn!(query, %identifier, body = %preview(&body), "price body unusable");
            ItemResolution::failed(query, Some(identifier), FailureKind::PriceNotFound)
        }
        Err(err) => failure(query, Some(identifier), &err),
    }
}

/// Resolves through catalog search, candidate scoring and price lookup.
pub struct CatalogResolver {
    search: CatalogSearchClient,
    prices: PriceClient,
    weights: ScoringWeights,
}

impl CatalogResolver {
    #[must_use]
    pub fn new(search: CatalogSearchClient, prices: PriceClient) -> Self {
        Self {
            search,
            prices,
            weights: ScoringWeights::default(),
        }
    }

    #[must_use]
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// # Errors
    ///
    /// Returns the first client construction error.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ResolverError> {
        Ok(Self::new(
            CatalogSearchClient::from_app_config(config)?,
            PriceClient::from_app_config(config)?,
        ))
    }

    /// Resolves one query.
    ///
    /// Outcomes, by the step that decided them:
    /// - search error: the mapped [`FailureKind`];
    /// - summary without [`RESULTS_MARKER`]: [`FailureKind::NotFound`];
    /// - no parseable candidate line: [`FailureKind::ExtractionFailed`];
    /// - no available record, or an unusable price body:
    ///   [`FailureKind::PriceNotFound`];
    /// - otherwise the first available record.
    pub async fn resolve_query(&self, query: &str) -> ItemResolution {
        guarded(query, self.attempt(query)).await
    }

    async fn attempt(&self, query: &str) -> ItemResolution {
        let summary = match self.search.lookup(query, &self.weights).await {
            Ok(summary) => summary,
            Err(err) => return failure(query, None, &err),
        };
        if !summary.contains(RESULTS_MARKER) {
            return miss(query, None, FailureKind::NotFound);
        }

        let mut candidates = extract_candidates(&summary);
        candidates.truncate(MAX_CANDIDATES);
        let Some(best) = select_best(query, &candidates, &self.weights) else {
            return miss(query, None, FailureKind::ExtractionFailed);
        };
        let Some(identifier) = best.candidate.identifier else {
            return miss(query, None, FailureKind::ExtractionFailed);
        };
        tracing::debug!(
            query,
            %identifier,
            name = ?best.candidate.name,
            score = best.score,
            "selected candidate"
        );

        price_identifier(&self.prices, query, identifier).await
    }
}

impl ItemResolver for CatalogResolver {
    fn resolve<'a>(&'a self, query: &'a str) -> impl Future<Output = ItemResolution> + 'a {
        self.resolve_query(query)
    }
}

/// Resolves through the generative file-search model instead of catalog
/// search, then prices the identifier it names.
pub struct VectorResolver {
    vector: VectorSearchClient,
    prices: PriceClient,
}

impl VectorResolver {
    #[must_use]
    pub fn new(vector: VectorSearchClient, prices: PriceClient) -> Self {
        Self { vector, prices }
    }

    /// # Errors
    ///
    /// Returns the first client construction error, including
    /// [`ResolverError::MissingSetting`] when no vector store is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ResolverError> {
        Ok(Self::new(
            VectorSearchClient::from_app_config(config)?,
            PriceClient::from_app_config(config)?,
        ))
    }

    /// Resolves one query. A completion naming no identifier is
    /// [`FailureKind::NotFound`]; the price step matches
    /// [`CatalogResolver::resolve_query`].
    pub async fn resolve_query(&self, query: &str) -> ItemResolution {
        guarded(query, self.attempt(query)).await
    }

    async fn attempt(&self, query: &str) -> ItemResolution {
        let completion = match self.vector.search(query).await {
            Ok(text) => text,
            Err(err) => return failure(query, None, &err),
        };
        let Some(identifier) = parse_completion(&completion).and_then(|c| c.identifier) else {
            return miss(query, None, FailureKind::NotFound);
        };
        price_identifier(&self.prices, query, identifier).await
    }
}

impl ItemResolver for VectorResolver {
    fn resolve<'a>(&'a self, query: &'a str) -> impl Future<Output = ItemResolution> + 'a {
        self.resolve_query(query)
    }
}
