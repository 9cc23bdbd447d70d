//! `seed` and `migrate` command handlers. Both require `DATABASE_URL`.

use oneview_core::{generate_demo_catalog, load_catalog_seed_or_embedded, AppConfig};

/// Generate the demo catalog and write it to Postgres.
///
/// When `dry_run` is `true` the function prints what would be written and
/// returns without connecting to the database.
///
/// # Errors
///
/// Returns an error if the seed definition is invalid, no database is
/// configured, or any write fails (the whole batch is rolled back).
pub(crate) async fn run_seed(
    config: &AppConfig,
    seed_override: Option<u64>,
    reset: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let definition = load_catalog_seed_or_embedded(&config.catalog_path)?;
    let rng_seed = seed_override.unwrap_or(config.seed);
    let catalog = generate_demo_catalog(&definition, rng_seed);

    if dry_run {
        println!(
            "dry run: would write {} stores and {} offerings (seed {rng_seed}{})",
            catalog.stores.len(),
            catalog.offerings.len(),
            if reset { ", reset" } else { "" }
        );
        for store in &catalog.stores {
            println!("  {:<10} {}", store.id, store.name);
        }
        return Ok(());
    }

    let pool = oneview_db::connect_pool_from_config(config).await?;
    let applied = oneview_db::run_migrations(&pool).await?;
    tracing::debug!(applied, reset, "migrations applied before seeding");
    let summary = oneview_db::seed_catalog(&pool, &catalog, reset).await?;

    println!(
        "seeded {} stores and {} offerings (seed {rng_seed})",
        summary.stores, summary.offerings
    );
    Ok(())
}

/// Apply pending migrations and print how many ran.
///
/// # Errors
///
/// Returns an error if no database is configured or a migration fails.
pub(crate) async fn run_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = oneview_db::connect_pool_from_config(config).await?;
    let applied = oneview_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}
