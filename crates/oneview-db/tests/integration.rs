//! Offline unit tests for oneview-db pool configuration and row types.
//! These tests do not require a live database connection.

use oneview_core::{AppConfig, Environment, Offering, Sale, Store};
use oneview_db::{OfferingRow, PoolConfig, SaleRow, StoreRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn app_config(database_url: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: database_url.map(str::to_string),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3001),
        log_level: "info".to_string(),
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        seed: 42,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        rate_limit_per_minute: 120,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config(Some("postgres://example")));
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_without_database_url_is_rejected() {
    let err = oneview_db::connect_pool_from_config(&app_config(None))
        .await
        .unwrap_err();
    assert!(matches!(err, oneview_db::DbError::MissingDatabaseUrl));
}

#[test]
fn store_row_converts_to_store() {
    let row = StoreRow {
        id: "store-1".to_string(),
        name: "TechHub Electronics".to_string(),
        address: "Connaught Place, Delhi".to_string(),
        latitude: 28.6304,
        longitude: 77.2177,
        rating: Decimal::new(46, 1),
        phone: Some("+91 98765 43200".to_string()),
        hours: None,
        owner_id: "retailer-1".to_string(),
    };

    let store = Store::from(row);
    assert_eq!(store.id, "store-1");
    assert_eq!(store.rating, Decimal::new(46, 1));
    assert_eq!(store.coordinate().lat, 28.6304);
}

#[test]
fn offering_row_converts_to_offering() {
    let row = OfferingRow {
        id: "prod-1".to_string(),
        store_id: "store-1".to_string(),
        name: "AirPods Pro 2".to_string(),
        category: "Audio".to_string(),
        image: None,
        price: 24_900,
        quantity: 0,
        offers: Some("Free Gift".to_string()),
    };

    let offering = Offering::from(row);
    assert_eq!(offering.store_id, "store-1");
    assert_eq!(offering.quantity, 0);
    assert_eq!(offering.offers.as_deref(), Some("Free Gift"));
}

#[test]
fn sale_row_maps_sold_at_to_timestamp() {
    let sold_at = chrono::Utc::now();
    let row = SaleRow {
        id: "sale-1".to_string(),
        store_id: "store-1".to_string(),
        product_id: "prod-1".to_string(),
        quantity: 2,
        bill_id: "BILL-0000ABCD".to_string(),
        sold_at,
    };

    let sale = Sale::from(row);
    assert_eq!(sale.timestamp, sold_at);
    assert_eq!(sale.bill_id, "BILL-0000ABCD");
}
