//! Process-local catalog backend.
//!
//! Used when no `DATABASE_URL` is configured and throughout the test suites.
//! All state sits behind one `RwLock`; writers hold it for the whole
//! operation, so a sale's stock check and decrement cannot interleave with
//! another writer.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogIndex, Inventory, SearchLog};
use crate::models::{
    new_offering_id, NewOffering, NewSale, Offering, OfferingPatch, Sale, SaleReceipt,
    SearchEvent, Store,
};
use crate::seed::DemoCatalog;

#[derive(Debug, Default)]
struct State {
    stores: Vec<Store>,
    offerings: Vec<Offering>,
    searches: Vec<SearchEvent>,
    sales: Vec<Sale>,
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(stores: Vec<Store>, offerings: Vec<Offering>) -> Self {
        Self {
            state: RwLock::new(State {
                stores,
                offerings,
                ..State::default()
            }),
        }
    }

    #[must_use]
    pub fn from_demo(catalog: DemoCatalog) -> Self {
        Self::from_parts(catalog.stores, catalog.offerings)
    }

    /// Inserts or replaces a store by id.
    pub async fn upsert_store(&self, store: Store) {
        let mut state = self.state.write().await;
        match state.stores.iter_mut().find(|s| s.id == store.id) {
            Some(existing) => *existing = store,
            None => state.stores.push(store),
        }
    }

    /// Snapshot of recorded search events, oldest first.
    pub async fn search_events(&self) -> Vec<SearchEvent> {
        self.state.read().await.searches.clone()
    }

    /// Snapshot of recorded sales, oldest first.
    pub async fn sales(&self) -> Vec<Sale> {
        self.state.read().await.sales.clone()
    }
}

#[async_trait]
impl CatalogIndex for InMemoryCatalog {
    async fn find_by_query(&self, query: &str) -> Result<Vec<Offering>, CatalogError> {
        let lowered = query.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .offerings
            .iter()
            .filter(|o| o.matches(&lowered))
            .cloned()
            .collect())
    }

    async fn find_store(&self, store_id: &str) -> Result<Option<Store>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.stores.iter().find(|s| s.id == store_id).cloned())
    }

    async fn list_stores(&self) -> Result<Vec<Store>, CatalogError> {
        Ok(self.state.read().await.stores.clone())
    }

    async fn list_store_offerings(&self, store_id: &str) -> Result<Vec<Offering>, CatalogError> {
        let state = self.state.read().await;
        Ok(state
            .offerings
            .iter()
            .filter(|o| o.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn find_offering(&self, offering_id: &str) -> Result<Option<Offering>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.offerings.iter().find(|o| o.id == offering_id).cloned())
    }
}

#[async_trait]
impl Inventory for InMemoryCatalog {
    async fn create_offering(&self, input: NewOffering) -> Result<Offering, CatalogError> {
        input.validate()?;
        let mut state = self.state.write().await;
        if !state.stores.iter().any(|s| s.id == input.store_id) {
            return Err(CatalogError::Validation(format!(
                "unknown store: {}",
                input.store_id
            )));
        }
        let offering = input.into_offering(new_offering_id());
        state.offerings.push(offering.clone());
        Ok(offering)
    }

    async fn update_offering(
        &self,
        offering_id: &str,
        patch: OfferingPatch,
    ) -> Result<Option<Offering>, CatalogError> {
        patch.validate()?;
        let mut state = self.state.write().await;
        let Some(offering) = state.offerings.iter_mut().find(|o| o.id == offering_id) else {
            return Ok(None);
        };
        patch.apply(offering);
        Ok(Some(offering.clone()))
    }

    async fn delete_offering(&self, offering_id: &str) -> Result<bool, CatalogError> {
        let mut state = self.state.write().await;
        let before = state.offerings.len();
        state.offerings.retain(|o| o.id != offering_id);
        Ok(state.offerings.len() < before)
    }

    async fn record_sale(&self, sale: NewSale) -> Result<SaleReceipt, CatalogError> {
        sale.validate()?;
        let mut state = self.state.write().await;

        let Some(offering) = state
            .offerings
            .iter_mut()
            .find(|o| o.id == sale.product_id && o.store_id == sale.store_id)
        else {
            return Err(CatalogError::product_not_found(&sale.product_id));
        };

        if offering.quantity < sale.quantity {
            return Err(CatalogError::InsufficientStock {
                product_id: sale.product_id,
                available: offering.quantity,
                requested: sale.quantity,
            });
        }

        offering.quantity -= sale.quantity;
        let updated_product = offering.clone();
        let sale = sale.into_sale();
        state.sales.push(sale.clone());

        Ok(SaleReceipt {
            sale,
            updated_product,
        })
    }
}

#[async_trait]
impl SearchLog for InMemoryCatalog {
    async fn record(&self, event: SearchEvent) -> Result<(), CatalogError> {
        self.state.write().await.searches.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::*;
    use crate::geo::Coordinate;

    fn store(id: &str) -> Store {
        Store {
            id: id.to_string(),
            name: format!("Store {id}"),
            address: "Connaught Place, New Delhi".to_string(),
            latitude: 28.6304,
            longitude: 77.2177,
            rating: Decimal::new(42, 1),
            phone: Some("+91-11-0000-0000".to_string()),
            hours: None,
            owner_id: "owner-1".to_string(),
        }
    }

    fn offering(id: &str, name: &str, category: &str, quantity: i64) -> Offering {
        Offering {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            image: None,
            price: 1_000,
            quantity,
            offers: None,
            store_id: "store-1".to_string(),
        }
    }

    fn seeded() -> InMemoryCatalog {
        InMemoryCatalog::from_parts(
            vec![store("store-1")],
            vec![
                offering("p1", "iPhone 15 Pro", "Smartphones", 10),
                offering("p2", "Dell XPS 13", "Laptops", 3),
                offering("p3", "AirPods Pro", "Audio", 0),
            ],
        )
    }

    #[tokio::test]
    async fn query_matches_name_or_category_in_insertion_order() {
        let catalog = seeded();

        let by_name = catalog.find_by_query("IPHONE").await.expect("query");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "p1");

        let by_category = catalog.find_by_query("laptop").await.expect("query");
        assert_eq!(by_category[0].id, "p2");

        let pro: Vec<String> = catalog
            .find_by_query("pro")
            .await
            .expect("query")
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(pro, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn out_of_stock_offerings_still_match() {
        let catalog = seeded();
        let hits = catalog.find_by_query("airpods").await.expect("query");
        assert_eq!(hits[0].quantity, 0);
    }

    #[tokio::test]
    async fn create_rejects_unknown_store() {
        let catalog = seeded();
        let err = catalog
            .create_offering(NewOffering {
                name: "Kindle".to_string(),
                category: "E-readers".to_string(),
                image: None,
                price: 13_999,
                quantity: 2,
                offers: None,
                store_id: "store-404".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn create_update_delete_round() {
        let catalog = seeded();
        let created = catalog
            .create_offering(NewOffering {
                name: "Kindle".to_string(),
                category: "E-readers".to_string(),
                image: None,
                price: 13_999,
                quantity: 2,
                offers: Some("Free cover".to_string()),
                store_id: "store-1".to_string(),
            })
            .await
            .expect("create");
        assert!(created.id.starts_with("prod-"));

        let updated = catalog
            .update_offering(
                &created.id,
                OfferingPatch {
                    price: Some(12_999),
                    ..OfferingPatch::default()
                },
            )
            .await
            .expect("update")
            .expect("exists");
        assert_eq!(updated.price, 12_999);
        assert_eq!(updated.offers.as_deref(), Some("Free cover"));

        assert!(catalog.delete_offering(&created.id).await.expect("delete"));
        assert!(!catalog.delete_offering(&created.id).await.expect("delete"));
        assert!(catalog
            .find_offering(&created.id)
            .await
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn update_missing_offering_returns_none() {
        let catalog = seeded();
        let result = catalog
            .update_offering("nope", OfferingPatch::default())
            .await
            .expect("update");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_store() {
        let catalog = seeded();
        let mut renamed = store("store-1");
        renamed.name = "Renamed".to_string();
        catalog.upsert_store(renamed).await;
        catalog.upsert_store(store("store-2")).await;

        let stores = catalog.list_stores().await.expect("list");
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].name, "Renamed");
    }

    #[tokio::test]
    async fn sale_decrements_stock_and_is_recorded() {
        let catalog = seeded();
        let receipt = catalog
            .record_sale(NewSale {
                store_id: "store-1".to_string(),
                product_id: "p2".to_string(),
                quantity: 2,
            })
            .await
            .expect("sale");

        assert_eq!(receipt.updated_product.quantity, 1);
        assert_eq!(receipt.sale.quantity, 2);
        assert_eq!(catalog.sales().await.len(), 1);
        let stored = catalog.find_offering("p2").await.expect("find").expect("exists");
        assert_eq!(stored.quantity, 1);
    }

    #[tokio::test]
    async fn sale_beyond_stock_is_rejected_without_side_effects() {
        let catalog = seeded();
        let err = catalog
            .record_sale(NewSale {
                store_id: "store-1".to_string(),
                product_id: "p2".to_string(),
                quantity: 4,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        assert!(catalog.sales().await.is_empty());
    }

    #[tokio::test]
    async fn sale_for_product_in_other_store_is_not_found() {
        let catalog = seeded();
        let err = catalog
            .record_sale(NewSale {
                store_id: "store-2".to_string(),
                product_id: "p1".to_string(),
                quantity: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { entity: "product", .. }));
    }

    #[tokio::test]
    async fn concurrent_sales_never_oversell() {
        let catalog = Arc::new(seeded());
        let mut handles = Vec::new();
        for _ in 0..10 {
            let catalog = Arc::clone(&catalog);
            handles.push(tokio::spawn(async move {
                catalog
                    .record_sale(NewSale {
                        store_id: "store-1".to_string(),
                        product_id: "p2".to_string(),
                        quantity: 1,
                    })
                    .await
                    .is_ok()
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.expect("join") {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        let stored = catalog.find_offering("p2").await.expect("find").expect("exists");
        assert_eq!(stored.quantity, 0);
    }

    #[tokio::test]
    async fn search_events_are_appended() {
        let catalog = InMemoryCatalog::new();
        catalog
            .record(SearchEvent::new("Laptop", Coordinate::new(1.0, 2.0)))
            .await
            .expect("record");
        let events = catalog.search_events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].query, "laptop");
    }
}
