mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "mercado-cli")]
#[command(about = "Catalog search and price aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the catalog and print the candidate summary
    Lookup {
        /// Free-text product description
        query: String,
    },
    /// Print available price records for one identifier
    Price {
        /// Product identifier; non-digits are ignored
        identifier: String,
    },
    /// Fetch a stock endpoint and print it without fiscal columns
    Stock {
        /// Full URL of the stock endpoint
        url: String,
    },
    /// Resolve a comma-separated list of queries and print the summary
    Batch {
        /// e.g. "arroz, feijão carioca, leite 1l"
        queries: String,
        /// Discover identifiers through the vector store instead of catalog search
        #[arg(long)]
        vector: bool,
        /// Print the full resolutions as JSON
        #[arg(long)]
        json: bool,
        /// Report results in input order rather than completion order
        #[arg(long)]
        ordered: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = mercado_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Lookup { query } => commands::run_lookup(&config, &query).await,
        Commands::Price { identifier } => commands::run_price(&config, &identifier).await,
        Commands::Stock { url } => commands::run_stock(&config, &url).await,
        Commands::Batch {
            queries,
            vector,
            json,
            ordered,
        } => {
            let opts = commands::BatchOptions {
                vector,
                json,
                ordered,
            };
            commands::run_batch(&config, &queries, opts).await
        }
    }
}
