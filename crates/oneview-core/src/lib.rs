pub mod aggregate;
pub mod app_config;
pub mod catalog;
pub mod config;
pub mod geo;
pub mod memory;
pub mod models;
pub mod scoring;
pub mod search;
pub mod seed;

use thiserror::Error;

pub use aggregate::{group_offerings, resolve_offerings, ProductGroup, ScoredOffering};
pub use app_config::{AppConfig, Environment};
pub use catalog::{CatalogError, CatalogIndex, Inventory, SearchLog};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{haversine_km, round_km, Coordinate, FALLBACK_COORDINATE};
pub use memory::InMemoryCatalog;
pub use models::{
    NewOffering, NewSale, Offering, OfferingPatch, Sale, SaleReceipt, SearchEvent, Store,
};
pub use scoring::deal_score;
pub use search::{SearchError, SearchRequest, SearchResults, SearchService};
pub use seed::{
    generate_demo_catalog, load_catalog_seed, load_catalog_seed_or_embedded, CatalogSeed,
    DemoCatalog,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog seed file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog seed file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog seed validation failed: {0}")]
    Validation(String),
}
