//! Concurrent resolution of a list of queries and the shopper-facing summary.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use mercado_core::ItemResolution;
use serde::Serialize;

use crate::error::ResolverError;
use crate::resolve::ItemResolver;

/// Heads [`BatchResult::render_summary`] when no query got a price.
pub const NOTHING_FOUND_MESSAGE: &str = "Nenhum produto encontrado.";

/// One resolution tagged with the position of its query in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    pub resolution: ItemResolution,
}

/// All resolutions of a batch, one per input query, in completion order
/// unless [`BatchResult::into_input_order`] was applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    #[must_use]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolutions(&self) -> impl Iterator<Item = &ItemResolution> {
        self.entries.iter().map(|e| &e.resolution)
    }

    /// Reorders entries to match the input query order.
    #[must_use]
    pub fn into_input_order(mut self) -> Self {
        self.entries.sort_by_key(|e| e.index);
        self
    }

    /// `(display name, price)` for every query that resolved to a priced record.
    #[must_use]
    pub fn found(&self) -> Vec<(&str, f64)> {
        self.resolutions().filter_map(ItemResolution::priced).collect()
    }

    /// Query text of every entry that did not resolve to a priced record.
    #[must_use]
    pub fn not_found(&self) -> Vec<&str> {
        self.resolutions()
            .filter(|r| r.priced().is_none())
            .map(|r| r.query.as_str())
            .collect()
    }

    /// Renders the summary block:
    ///
    /// ```text
    /// PRODUTOS_ENCONTRADOS:
    /// • ARROZ BRANCO 1KG - R$5.50
    ///
    /// NÃO_ENCONTRADOS: produto inexistente xyz123
    /// ```
    ///
    /// With no priced entry at all the found block is replaced by
    /// [`NOTHING_FOUND_MESSAGE`]; the not-found list still follows it.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let found = self.found();
        let mut lines = if found.is_empty() {
            vec![NOTHING_FOUND_MESSAGE.to_owned()]
        } else {
            let mut block = vec!["PRODUTOS_ENCONTRADOS:".to_owned()];
            block.extend(
                found
                    .iter()
                    .map(|(name, price)| format!("• {name} - R${price:.2}")),
            );
            block
        };
        let missing = self.not_found();
        if !missing.is_empty() {
            lines.push(format!("\nNÃO_ENCONTRADOS: {}", missing.join(", ")));
        }
        lines.join("\n")
    }
}

/// Splits a comma-separated list, trimming items and dropping blanks.
#[must_use]
pub fn parse_query_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Resolves every query with at most `max_concurrent` in flight.
///
/// The result holds exactly one entry per query, duplicates included, in
/// completion order. A `max_concurrent` of zero is treated as one.
///
/// # Errors
///
/// Returns [`ResolverError::NoQueriesProvided`] for an empty list. Individual
/// query failures never fail the batch.
pub async fn resolve_batch<R>(
    resolver: &R,
    queries: &[String],
    max_concurrent: usize,
) -> Result<BatchResult, ResolverError>
where
    R: ItemResolver,
{
    if queries.is_empty() {
        return Err(ResolverError::NoQueriesProvided);
    }
    let width = max_concurrent.max(1);
    let started = Instant::now();
    tracing::info!(queries = queries.len(), max_concurrent = width, "starting batch");

    let entries: Vec<BatchEntry> = stream::iter(queries.iter().enumerate())
        .map(|(index, query)| async move {
            BatchEntry {
                index,
                resolution: resolver.resolve(query).await,
            }
        })
        .buffer_unordered(width)
        .collect()
        .await;

    let result = BatchResult { entries };
    tracing::info!(
        found = result.found().len(),
        not_found = result.not_found().len(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "batch complete"
    );
    Ok(result)
}
