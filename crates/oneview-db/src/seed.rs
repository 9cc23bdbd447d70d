use oneview_core::DemoCatalog;
use sqlx::PgPool;

use crate::catalog::{insert_offering, upsert_store};
use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub stores: usize,
    pub offerings: usize,
}

/// Write a generated demo catalog into the database.
///
/// With `reset`, every catalog table is truncated first. Everything runs in
/// a single transaction; if any statement fails the whole batch is rolled
/// back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(
    pool: &PgPool,
    catalog: &DemoCatalog,
    reset: bool,
) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;

    if reset {
        sqlx::query("TRUNCATE sales, search_events, offerings, stores")
            .execute(&mut *tx)
            .await?;
    }

    for store in &catalog.stores {
        upsert_store(&mut *tx, store).await?;
    }
    for offering in &catalog.offerings {
        insert_offering(&mut *tx, offering).await?;
    }

    tx.commit().await?;

    tracing::info!(
        stores = catalog.stores.len(),
        offerings = catalog.offerings.len(),
        reset,
        "demo catalog seeded"
    );

    Ok(SeedSummary {
        stores: catalog.stores.len(),
        offerings: catalog.offerings.len(),
    })
}
