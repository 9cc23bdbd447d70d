//! Database operations for `stores`, `offerings`, `sales`, and
//! `search_events`, plus [`PgCatalog`], which exposes them through the core
//! repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use oneview_core::models::new_offering_id;
use oneview_core::{
    CatalogError, CatalogIndex, Inventory, NewOffering, NewSale, Offering, OfferingPatch, Sale,
    SaleReceipt, SearchEvent, SearchLog, Store,
};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Decimal,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub owner_id: String,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            rating: row.rating,
            phone: row.phone,
            hours: row.hours,
            owner_id: row.owner_id,
        }
    }
}

/// A row from the `offerings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferingRow {
    pub id: String,
    pub store_id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    pub price: i64,
    pub quantity: i64,
    pub offers: Option<String>,
}

impl From<OfferingRow> for Offering {
    fn from(row: OfferingRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            image: row.image,
            price: row.price,
            quantity: row.quantity,
            offers: row.offers,
            store_id: row.store_id,
        }
    }
}

/// A row from the `sales` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleRow {
    pub id: String,
    pub store_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub bill_id: String,
    pub sold_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            product_id: row.product_id,
            quantity: row.quantity,
            bill_id: row.bill_id,
            timestamp: row.sold_at,
        }
    }
}

/// A row from the `search_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchEventRow {
    pub id: String,
    pub query: String,
    pub lat: f64,
    pub lng: f64,
    pub searched_at: DateTime<Utc>,
}

impl From<SearchEventRow> for SearchEvent {
    fn from(row: SearchEventRow) -> Self {
        Self {
            id: row.id,
            query: row.query,
            lat: row.lat,
            lng: row.lng,
            timestamp: row.searched_at,
        }
    }
}

/// Result of [`record_sale`].
#[derive(Debug, Clone)]
pub enum SaleOutcome {
    Recorded(SaleReceipt),
    /// No offering with that id exists in that store.
    UnknownProduct,
    InsufficientStock { available: i64 },
}

const STORE_COLUMNS: &str =
    "id, name, address, latitude, longitude, rating, phone, hours, owner_id";
const OFFERING_COLUMNS: &str =
    "id, store_id, name, category, image, price, quantity, offers";

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Returns all stores in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores ORDER BY position"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single store by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store(pool: &PgPool, store_id: &str) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
    ))
    .bind(store_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a store or overwrites every column of the existing row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_store<'e, E>(executor: E, store: &Store) -> Result<(), DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO stores (id, name, address, latitude, longitude, rating, phone, hours, owner_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, \
             address = EXCLUDED.address, \
             latitude = EXCLUDED.latitude, \
             longitude = EXCLUDED.longitude, \
             rating = EXCLUDED.rating, \
             phone = EXCLUDED.phone, \
             hours = EXCLUDED.hours, \
             owner_id = EXCLUDED.owner_id, \
             updated_at = NOW()",
    )
    .bind(&store.id)
    .bind(&store.name)
    .bind(&store.address)
    .bind(store.latitude)
    .bind(store.longitude)
    .bind(store.rating)
    .bind(&store.phone)
    .bind(&store.hours)
    .bind(&store.owner_id)
    .execute(executor)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Offerings
// ---------------------------------------------------------------------------

/// Returns offerings whose name or category contains `query` ignoring case,
/// in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_offerings(pool: &PgPool, query: &str) -> Result<Vec<OfferingRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferingRow>(&format!(
        "SELECT {OFFERING_COLUMNS} FROM offerings \
         WHERE strpos(lower(name), lower($1)) > 0 \
            OR strpos(lower(category), lower($1)) > 0 \
         ORDER BY position"
    ))
    .bind(query)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every offering of one store in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_store_offerings(
    pool: &PgPool,
    store_id: &str,
) -> Result<Vec<OfferingRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferingRow>(&format!(
        "SELECT {OFFERING_COLUMNS} FROM offerings WHERE store_id = $1 ORDER BY position"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single offering by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_offering(pool: &PgPool, offering_id: &str) -> Result<Option<OfferingRow>, DbError> {
    let row = sqlx::query_as::<_, OfferingRow>(&format!(
        "SELECT {OFFERING_COLUMNS} FROM offerings WHERE id = $1"
    ))
    .bind(offering_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts an offering, or overwrites the existing row with the same id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including when the store
/// does not exist.
pub async fn insert_offering<'e, E>(executor: E, offering: &Offering) -> Result<(), DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO offerings (id, store_id, name, category, image, price, quantity, offers) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (id) DO UPDATE SET \
             store_id = EXCLUDED.store_id, \
             name = EXCLUDED.name, \
             category = EXCLUDED.category, \
             image = EXCLUDED.image, \
             price = EXCLUDED.price, \
             quantity = EXCLUDED.quantity, \
             offers = EXCLUDED.offers, \
             updated_at = NOW()",
    )
    .bind(&offering.id)
    .bind(&offering.store_id)
    .bind(&offering.name)
    .bind(&offering.category)
    .bind(&offering.image)
    .bind(offering.price)
    .bind(offering.quantity)
    .bind(&offering.offers)
    .execute(executor)
    .await?;

    Ok(())
}

/// Applies `patch` to an offering under a row lock and returns the updated
/// row, or `None` if no offering has `offering_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn update_offering(
    pool: &PgPool,
    offering_id: &str,
    patch: OfferingPatch,
) -> Result<Option<OfferingRow>, DbError> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, OfferingRow>(&format!(
        "SELECT {OFFERING_COLUMNS} FROM offerings WHERE id = $1 FOR UPDATE"
    ))
    .bind(offering_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(current) = current else {
        return Ok(None);
    };

    let mut offering = Offering::from(current);
    patch.apply(&mut offering);

    let row = sqlx::query_as::<_, OfferingRow>(&format!(
        "UPDATE offerings \
         SET name = $2, category = $3, image = $4, price = $5, quantity = $6, offers = $7, \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {OFFERING_COLUMNS}"
    ))
    .bind(&offering.id)
    .bind(&offering.name)
    .bind(&offering.category)
    .bind(&offering.image)
    .bind(offering.price)
    .bind(offering.quantity)
    .bind(&offering.offers)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(row))
}

/// Deletes an offering. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_offering(pool: &PgPool, offering_id: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM offerings WHERE id = $1")
        .bind(offering_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Decrements stock and inserts the sale in one transaction.
///
/// The decrement is a single conditional `UPDATE`, so concurrent sales of
/// the same offering can never drive its quantity below zero.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn record_sale(pool: &PgPool, sale: NewSale) -> Result<SaleOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query_as::<_, OfferingRow>(&format!(
        "UPDATE offerings \
         SET quantity = quantity - $3, updated_at = NOW() \
         WHERE id = $1 AND store_id = $2 AND quantity >= $3 \
         RETURNING {OFFERING_COLUMNS}"
    ))
    .bind(&sale.product_id)
    .bind(&sale.store_id)
    .bind(sale.quantity)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(updated) = updated else {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM offerings WHERE id = $1 AND store_id = $2",
        )
        .bind(&sale.product_id)
        .bind(&sale.store_id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.rollback().await?;

        return Ok(match available {
            Some(available) => SaleOutcome::InsufficientStock { available },
            None => SaleOutcome::UnknownProduct,
        });
    };

    let sale = sale.into_sale();
    sqlx::query(
        "INSERT INTO sales (id, store_id, product_id, quantity, bill_id, sold_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&sale.id)
    .bind(&sale.store_id)
    .bind(&sale.product_id)
    .bind(sale.quantity)
    .bind(&sale.bill_id)
    .bind(sale.timestamp)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(SaleOutcome::Recorded(SaleReceipt {
        sale,
        updated_product: updated.into(),
    }))
}

/// Returns a store's sales, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sales(pool: &PgPool, store_id: &str) -> Result<Vec<SaleRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleRow>(
        "SELECT id, store_id, product_id, quantity, bill_id, sold_at \
         FROM sales \
         WHERE store_id = $1 \
         ORDER BY sold_at DESC, id",
    )
    .bind(store_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Search events
// ---------------------------------------------------------------------------

/// Appends one search event.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_search_event(pool: &PgPool, event: &SearchEvent) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO search_events (id, query, lat, lng, searched_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&event.id)
    .bind(&event.query)
    .bind(event.lat)
    .bind(event.lng)
    .bind(event.timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the most recent search events, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_search_events(pool: &PgPool, limit: i64) -> Result<Vec<SearchEventRow>, DbError> {
    let rows = sqlx::query_as::<_, SearchEventRow>(
        "SELECT id, query, lat, lng, searched_at \
         FROM search_events \
         ORDER BY searched_at DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Repository adapter
// ---------------------------------------------------------------------------

/// Postgres-backed implementation of the core catalog traits.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts or replaces a store by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the write fails.
    pub async fn upsert_store(&self, store: &Store) -> Result<(), DbError> {
        upsert_store(&self.pool, store).await
    }
}

impl From<DbError> for CatalogError {
    fn from(error: DbError) -> Self {
        CatalogError::backend(error)
    }
}

#[async_trait]
impl CatalogIndex for PgCatalog {
    async fn find_by_query(&self, query: &str) -> Result<Vec<Offering>, CatalogError> {
        let rows = search_offerings(&self.pool, query).await?;
        Ok(rows.into_iter().map(Offering::from).collect())
    }

    async fn find_store(&self, store_id: &str) -> Result<Option<Store>, CatalogError> {
        Ok(get_store(&self.pool, store_id).await?.map(Store::from))
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogError> {
        let rows = list_stores(&self.pool).await?;
        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn list_store_offerings(&self, store_id: &str) -> Result<Vec<Offering>, CatalogError> {
        let rows = list_store_offerings(&self.pool, store_id).await?;
        Ok(rows.into_iter().map(Offering::from).collect())
    }

    async fn find_offering(&self, offering_id: &str) -> Result<Option<Offering>, CatalogError> {
        Ok(get_offering(&self.pool, offering_id).await?.map(Offering::from))
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Inventory for PgCatalog {
    async fn create_offering(&self, input: NewOffering) -> Result<Offering, CatalogError> {
        input.validate()?;
        if get_store(&self.pool, &input.store_id).await?.is_none() {
            return Err(CatalogError::Validation(format!(
                "unknown store: {}",
                input.store_id
            )));
        }

        let offering = input.into_offering(new_offering_id());
        insert_offering(&self.pool, &offering).await?;
        Ok(offering)
    }

    async fn update_offering(
        &self,
        offering_id: &str,
        patch: OfferingPatch,
    ) -> Result<Option<Offering>, CatalogError> {
        patch.validate()?;
        let row = update_offering(&self.pool, offering_id, patch).await?;
        Ok(row.map(Offering::from))
    }

    async fn delete_offering(&self, offering_id: &str) -> Result<bool, CatalogError> {
        Ok(delete_offering(&self.pool, offering_id).await?)
    }

    async fn record_sale(&self, sale: NewSale) -> Result<SaleReceipt, CatalogError> {
        sale.validate()?;
        let product_id = sale.product_id.clone();
        let requested = sale.quantity;

        match record_sale(&self.pool, sale).await? {
            SaleOutcome::Recorded(receipt) => Ok(receipt),
            SaleOutcome::UnknownProduct => Err(CatalogError::product_not_found(&product_id)),
            SaleOutcome::InsufficientStock { available } => Err(CatalogError::InsufficientStock {
                product_id,
                available,
                requested,
            }),
        }
    }
}

#[async_trait]
impl SearchLog for PgCatalog {
    async fn record(&self, event: SearchEvent) -> Result<(), CatalogError> {
        insert_search_event(&self.pool, &event).await?;
        Ok(())
    }
}
