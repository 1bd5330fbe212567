//! Product resolution and price aggregation.
//!
//! A free-text query goes through catalog search ([`search`]), candidate
//! extraction ([`extract`]) and scoring ([`score`]), then a price lookup
//! ([`price`]). [`resolve`] runs that pipeline for one query and
//! [`batch`] fans it out over many.

pub mod batch;
pub mod error;
pub mod extract;
pub mod price;
pub mod resolve;
pub mod score;
pub mod search;
pub mod vector;

pub use batch::{parse_query_list, resolve_batch, BatchEntry, BatchResult};
pub use error::ResolverError;
pub use extract::{extract_candidates, scan_json_fragments, scan_text, MAX_CANDIDATES};
pub use price::{PriceClient, PriceLookup};
pub use resolve::{CatalogResolver, ItemResolver, VectorResolver};
pub use score::{relevance_filter, score, select_best, ScoringWeights};
pub use search::{summarize, CatalogSearchClient, SearchOutcome};
pub use vector::{parse_completion, VectorSearchClient};
