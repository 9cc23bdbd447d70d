mod catalog;
mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "oneview-cli")]
#[command(about = "OneView local deals command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the catalog and print ranked product groups as JSON
    Search {
        /// Product name or category fragment
        query: String,
        /// Shopper latitude; unusable values fall back to central New Delhi
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<String>,
        /// Shopper longitude; unusable values fall back to central New Delhi
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<String>,
    },
    /// Write the generated demo catalog into Postgres
    Seed {
        /// RNG seed; defaults to ONEVIEW_SEED
        #[arg(long)]
        seed: Option<u64>,
        /// Truncate catalog, sales, and search tables first
        #[arg(long)]
        reset: bool,
        /// Print what would be written without touching the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = oneview_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Search { query, lat, lng }) => {
            search::run_search(&config, query, lat, lng).await?;
        }
        Some(Commands::Seed {
            seed,
            reset,
            dry_run,
        }) => catalog::run_seed(&config, seed, reset, dry_run).await?,
        Some(Commands::Migrate) => catalog::run_migrate(&config).await?,
        None => println!("oneview-cli ready; run with --help for commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
