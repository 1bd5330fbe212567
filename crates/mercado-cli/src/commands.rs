//! Command handlers for the CLI.
//!
//! Handlers write results to stdout; logs go to stderr through `tracing`.

use mercado_core::AppConfig;
use mercado_resolver::{
    parse_query_list, resolve_batch, BatchResult, CatalogResolver, CatalogSearchClient,
    PriceClient, PriceLookup, ScoringWeights, VectorResolver,
};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BatchOptions {
    pub(crate) vector: bool,
    pub(crate) json: bool,
    pub(crate) ordered: bool,
}

pub(crate) async fn run_lookup(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let client = CatalogSearchClient::from_app_config(config)?;
    let summary = client.lookup(query, &ScoringWeights::default()).await?;
    println!("{summary}");
    Ok(())
}

pub(crate) async fn run_price(config: &AppConfig, identifier: &str) -> anyhow::Result<()> {
    let client = PriceClient::from_app_config(config)?;
    match client.lookup(identifier).await? {
        PriceLookup::Records(records) if records.is_empty() => {
            println!("Nenhum registro disponível para {identifier}.");
        }
        PriceLookup::Records(records) => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        PriceLookup::Opaque(body) => println!("{body}"),
    }
    Ok(())
}

pub(crate) async fn run_stock(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let client = PriceClient::from_app_config(config)?;
    let payload = client.query_stock(url).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Resolves every query in `raw` and prints the summary, or the full
/// resolutions when `opts.json` is set.
///
/// # Errors
///
/// Returns an error when the list is empty, a client cannot be built, or
/// JSON rendering fails. Per-query failures appear in the output instead.
pub(crate) async fn run_batch(
    config: &AppConfig,
    raw: &str,
    opts: BatchOptions,
) -> anyhow::Result<()> {
    let queries = parse_query_list(raw);
    tracing::debug!(queries = queries.len(), vector = opts.vector, "running batch");

    let result = if opts.vector {
        let resolver = VectorResolver::from_app_config(config)?;
        resolve_batch(&resolver, &queries, config.vector_max_concurrent).await?
    } else {
        let resolver = CatalogResolver::from_app_config(config)?;
        resolve_batch(&resolver, &queries, config.catalog_max_concurrent).await?
    };

    println!("{}", render(result, opts)?);
    Ok(())
}

fn render(result: BatchResult, opts: BatchOptions) -> anyhow::Result<String> {
    let result = if opts.ordered {
        result.into_input_order()
    } else {
        result
    };
    if opts.json {
        let resolutions: Vec<_> = result.resolutions().collect();
        return Ok(serde_json::to_string_pretty(&resolutions)?);
    }
    Ok(result.render_summary())
}
