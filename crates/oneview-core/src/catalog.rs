//! Repository seams between the search core and whatever holds the data.
//!
//! [`CatalogIndex`] is the read side the search path depends on,
//! [`Inventory`] carries retailer writes, and [`SearchLog`] receives one
//! [`SearchEvent`] per accepted search. Backends: [`crate::InMemoryCatalog`]
//! and the Postgres catalog in `oneview-db`.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    NewOffering, NewSale, Offering, OfferingPatch, SaleReceipt, SearchEvent, Store,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    #[error("catalog backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CatalogError {
    pub fn backend(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(error))
    }

    #[must_use]
    pub fn store_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "store",
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn product_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }
}

/// Read-only view over stores and their offerings.
#[async_trait]
pub trait CatalogIndex: Send + Sync {
    /// Offerings whose name or category contains `query`, ignoring case, in
    /// insertion order. Callers reject empty queries before getting here.
    async fn find_by_query(&self, query: &str) -> Result<Vec<Offering>, CatalogError>;

    async fn find_store(&self, store_id: &str) -> Result<Option<Store>, CatalogError>;

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogError>;

    async fn list_store_offerings(&self, store_id: &str) -> Result<Vec<Offering>, CatalogError>;

    async fn find_offering(&self, offering_id: &str) -> Result<Option<Offering>, CatalogError>;

    /// Liveness probe for the backing store.
    async fn health_check(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// Retailer-side mutations.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// # Errors
    ///
    /// [`CatalogError::Validation`] for bad input or an unknown store.
    async fn create_offering(&self, input: NewOffering) -> Result<Offering, CatalogError>;

    /// Returns `None` when no offering has `offering_id`.
    async fn update_offering(
        &self,
        offering_id: &str,
        patch: OfferingPatch,
    ) -> Result<Option<Offering>, CatalogError>;

    /// Returns `false` when no offering has `offering_id`.
    async fn delete_offering(&self, offering_id: &str) -> Result<bool, CatalogError>;

    /// Decrements stock and appends the sale as one atomic step.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] when the product does not exist in the
    /// given store, [`CatalogError::InsufficientStock`] when it cannot cover
    /// the requested quantity.
    async fn record_sale(&self, sale: NewSale) -> Result<SaleReceipt, CatalogError>;
}

/// Append-only sink for search events.
#[async_trait]
pub trait SearchLog: Send + Sync {
    async fn record(&self, event: SearchEvent) -> Result<(), CatalogError>;
}
