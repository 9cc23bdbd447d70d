//! Live integration tests for oneview-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/oneview-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::sync::Arc;

use oneview_core::{
    generate_demo_catalog, CatalogError, CatalogIndex, CatalogSeed, Inventory, NewOffering,
    NewSale, OfferingPatch, SearchRequest, SearchService, Store,
};
use oneview_db::{
    list_sales, list_search_events, list_stores, seed_catalog, PgCatalog,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn store(id: &str, lat: f64, lng: f64) -> Store {
    Store {
        id: id.to_string(),
        name: format!("Store {id}"),
        address: "New Delhi".to_string(),
        latitude: lat,
        longitude: lng,
        rating: Decimal::new(44, 1),
        phone: None,
        hours: Some("10:00 AM - 09:00 PM".to_string()),
        owner_id: format!("owner-{id}"),
    }
}

fn new_offering(store_id: &str, name: &str, price: i64, quantity: i64) -> NewOffering {
    NewOffering {
        name: name.to_string(),
        category: "Smartphones".to_string(),
        image: None,
        price,
        quantity,
        offers: None,
        store_id: store_id.to_string(),
    }
}

async fn two_store_catalog(pool: PgPool) -> PgCatalog {
    let catalog = PgCatalog::new(pool);
    catalog
        .upsert_store(&store("store-a", 28.6304, 77.2177))
        .await
        .expect("store a");
    catalog
        .upsert_store(&store("store-b", 28.5244, 77.2185))
        .await
        .expect("store b");
    catalog
}

// ---------------------------------------------------------------------------
// Catalog index
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn query_matches_name_and_category_in_insertion_order(pool: PgPool) {
    let catalog = two_store_catalog(pool).await;
    let first = catalog
        .create_offering(new_offering("store-a", "iPhone 15 Pro", 129_900, 4))
        .await
        .expect("create");
    let mut laptop = new_offering("store-b", "MacBook Air M2", 99_900, 2);
    laptop.category = "Laptops".to_string();
    catalog.create_offering(laptop).await.expect("create");
    let second = catalog
        .create_offering(new_offering("store-b", "iPhone 15 Pro", 123_405, 1))
        .await
        .expect("create");

    let hits = catalog.find_by_query("IPHONE").await.expect("query");
    let ids: Vec<&str> = hits.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);

    let laptops = catalog.find_by_query("laptop").await.expect("query");
    assert_eq!(laptops.len(), 1);
    assert_eq!(laptops[0].name, "MacBook Air M2");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_store_overwrites_existing_row(pool: PgPool) {
    let catalog = two_store_catalog(pool.clone()).await;
    let mut renamed = store("store-a", 28.6304, 77.2177);
    renamed.name = "TechHub Electronics".to_string();
    catalog.upsert_store(&renamed).await.expect("upsert");

    let rows = list_stores(&pool).await.expect("list");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "TechHub Electronics");

    let found = catalog.find_store("store-a").await.expect("find").expect("exists");
    assert_eq!(found.rating, Decimal::new(44, 1));
    assert!(catalog.find_store("store-x").await.expect("find").is_none());
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_unknown_store(pool: PgPool) {
    let catalog = two_store_catalog(pool).await;
    let err = catalog
        .create_offering(new_offering("store-x", "Pixel 8", 59_999, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_and_delete_offering(pool: PgPool) {
    let catalog = two_store_catalog(pool).await;
    let created = catalog
        .create_offering(new_offering("store-a", "Pixel 8", 59_999, 3))
        .await
        .expect("create");

    let updated = catalog
        .update_offering(
            &created.id,
            OfferingPatch {
                price: Some(57_999),
                offers: Some("10% off".to_string()),
                ..OfferingPatch::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(updated.price, 57_999);
    assert_eq!(updated.quantity, 3);
    assert_eq!(updated.offers.as_deref(), Some("10% off"));

    assert!(catalog
        .update_offering("prod-missing", OfferingPatch::default())
        .await
        .expect("update")
        .is_none());

    assert!(catalog.delete_offering(&created.id).await.expect("delete"));
    assert!(!catalog.delete_offering(&created.id).await.expect("delete"));
    assert!(catalog
        .list_store_offerings("store-a")
        .await
        .expect("list")
        .is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sale_decrements_stock_and_is_listed(pool: PgPool) {
    let catalog = two_store_catalog(pool.clone()).await;
    let created = catalog
        .create_offering(new_offering("store-a", "OnePlus 12", 64_999, 5))
        .await
        .expect("create");

    let receipt = catalog
        .record_sale(NewSale {
            store_id: "store-a".to_string(),
            product_id: created.id.clone(),
            quantity: 2,
        })
        .await
        .expect("sale");

    assert_eq!(receipt.updated_product.quantity, 3);
    assert!(receipt.sale.bill_id.starts_with("BILL-"));

    let sales = list_sales(&pool, "store-a").await.expect("list");
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].product_id, created.id);
    assert_eq!(sales[0].quantity, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sale_beyond_stock_or_in_wrong_store_fails(pool: PgPool) {
    let catalog = two_store_catalog(pool.clone()).await;
    let created = catalog
        .create_offering(new_offering("store-a", "OnePlus 12", 64_999, 1))
        .await
        .expect("create");

    let too_many = catalog
        .record_sale(NewSale {
            store_id: "store-a".to_string(),
            product_id: created.id.clone(),
            quantity: 2,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        too_many,
        CatalogError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));

    let wrong_store = catalog
        .record_sale(NewSale {
            store_id: "store-b".to_string(),
            product_id: created.id.clone(),
            quantity: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(wrong_store, CatalogError::NotFound { .. }));

    assert!(list_sales(&pool, "store-a").await.expect("list").is_empty());
    let unchanged = catalog
        .find_offering(&created.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(unchanged.quantity, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_sales_never_oversell(pool: PgPool) {
    let catalog = Arc::new(two_store_catalog(pool).await);
    let created = catalog
        .create_offering(new_offering("store-a", "JBL Flip 6", 9_999, 3))
        .await
        .expect("create");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let catalog = Arc::clone(&catalog);
        let product_id = created.id.clone();
        handles.push(tokio::spawn(async move {
            catalog
                .record_sale(NewSale {
                    store_id: "store-a".to_string(),
                    product_id,
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
    let stored = catalog
        .find_offering(&created.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(stored.quantity, 0);
}

// ---------------------------------------------------------------------------
// Search through the Postgres backend
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn search_service_ranks_and_logs_against_postgres(pool: PgPool) {
    let catalog = Arc::new(two_store_catalog(pool.clone()).await);
    catalog
        .create_offering(new_offering("store-a", "iPhone 15 Pro", 129_900, 4))
        .await
        .expect("create");
    catalog
        .create_offering(new_offering("store-b", "iPhone 15 Pro", 105_000, 2))
        .await
        .expect("create");

    let service = SearchService::new(catalog.clone(), catalog.clone());
    let out = service
        .search(&SearchRequest::new("iphone 15"))
        .await
        .expect("search");

    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0].stores.len(), 2);
    assert_eq!(out.results[0].stores[0].store_id, "store-b");
    assert!(out.results[0].stores[0].is_best_deal);

    let events = list_search_events(&pool, 10).await.expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].query, "iphone 15");
    assert_eq!(events[0].lat, 28.6139);
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_catalog_is_idempotent_and_reset_clears_extras(pool: PgPool) {
    let seed = CatalogSeed::embedded().expect("embedded catalog");
    let demo = generate_demo_catalog(&seed, 42);

    let first = seed_catalog(&pool, &demo, false).await.expect("seed");
    let again = seed_catalog(&pool, &demo, false).await.expect("reseed");
    assert_eq!(first, again);
    assert_eq!(first.stores, demo.stores.len());

    let stores = list_stores(&pool).await.expect("list");
    assert_eq!(stores.len(), demo.stores.len());
    assert_eq!(stores[0].name, "TechHub Electronics");

    let catalog = PgCatalog::new(pool.clone());
    let extra = catalog
        .create_offering(new_offering("store-1", "Nokia 3310", 2_999, 1))
        .await
        .expect("create");

    seed_catalog(&pool, &demo, true).await.expect("reset seed");
    assert!(catalog
        .find_offering(&extra.id)
        .await
        .expect("find")
        .is_none());
    let listed = catalog.list_store_offerings("store-1").await.expect("list");
    let per_store = demo.offerings.len() / demo.stores.len();
    assert_eq!(listed.len(), per_store);
}
