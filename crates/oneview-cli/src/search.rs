//! `search` command: runs one search against the configured backend and
//! prints the storefront JSON.

use std::sync::Arc;

use oneview_core::{
    generate_demo_catalog, load_catalog_seed_or_embedded, AppConfig, InMemoryCatalog,
    SearchRequest, SearchResults, SearchService,
};
use oneview_db::PgCatalog;

/// Builds a search service over Postgres when `DATABASE_URL` is set, or over
/// the in-memory demo catalog otherwise.
///
/// # Errors
///
/// Returns an error if the database cannot be reached or the catalog seed
/// file is invalid.
pub(crate) async fn build_search_service(config: &AppConfig) -> anyhow::Result<SearchService> {
    if config.uses_database() {
        let pool = oneview_db::connect_pool_from_config(config).await?;
        let catalog = Arc::new(PgCatalog::new(pool));
        return Ok(SearchService::new(catalog.clone(), catalog));
    }

    let seed = load_catalog_seed_or_embedded(&config.catalog_path)?;
    let catalog = Arc::new(InMemoryCatalog::from_demo(generate_demo_catalog(
        &seed,
        config.seed,
    )));
    Ok(SearchService::new(catalog.clone(), catalog))
}

/// Run a search and print the result as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if the query is empty or the backend fails.
pub(crate) async fn run_search(
    config: &AppConfig,
    query: String,
    lat: Option<String>,
    lng: Option<String>,
) -> anyhow::Result<()> {
    let service = build_search_service(config).await?;
    let results = execute(&service, query, lat, lng).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn execute(
    service: &SearchService,
    query: String,
    lat: Option<String>,
    lng: Option<String>,
) -> anyhow::Result<SearchResults> {
    let request = SearchRequest {
        query: Some(query),
        lat,
        lng,
    };
    Ok(service.search(&request).await?)
}
