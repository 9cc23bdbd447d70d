use std::collections::HashSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Offering, Store};
use crate::ConfigError;

const EMBEDDED_CATALOG: &str = include_str!("../../../config/catalog.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedLocation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedItem {
    pub name: String,
    /// Base price in whole rupees before per-store variance.
    pub price: i64,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub items: Vec<SeedItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRange {
    pub min: i64,
    pub max: i64,
}

/// Shape of `config/catalog.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub store_count: usize,
    /// Name given to the first store instead of the generated one.
    pub flagship_name: String,
    pub city: String,
    pub store_hours: String,
    pub jitter_degrees: f64,
    pub price_variance: f64,
    pub stock: StockRange,
    pub offer_probability: f64,
    #[serde(default)]
    pub offers: Vec<String>,
    pub locations: Vec<SeedLocation>,
    pub store_types: Vec<String>,
    pub categories: Vec<SeedCategory>,
}

impl CatalogSeed {
    /// The catalog definition compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the embedded YAML fails to parse or validate.
    pub fn embedded() -> Result<Self, ConfigError> {
        parse_catalog_seed(EMBEDDED_CATALOG)
    }
}

/// Load and validate a catalog seed definition from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog_seed(path: &Path) -> Result<CatalogSeed, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog_seed(&content)
}

/// Loads `path` when it exists, otherwise falls back to the embedded
/// definition.
///
/// # Errors
///
/// Returns `ConfigError` if whichever definition is used is invalid.
pub fn load_catalog_seed_or_embedded(path: &Path) -> Result<CatalogSeed, ConfigError> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "loading catalog seed file");
        load_catalog_seed(path)
    } else {
        tracing::info!(
            path = %path.display(),
            "catalog seed file not found; using embedded catalog"
        );
        CatalogSeed::embedded()
    }
}

fn parse_catalog_seed(content: &str) -> Result<CatalogSeed, ConfigError> {
    let seed: CatalogSeed = serde_yaml::from_str(content).map_err(ConfigError::CatalogFileParse)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &CatalogSeed) -> Result<(), ConfigError> {
    if seed.store_count == 0 {
        return Err(ConfigError::Validation(
            "store_count must be at least 1".to_string(),
        ));
    }
    if seed.locations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one location is required".to_string(),
        ));
    }
    if seed.store_types.is_empty() {
        return Err(ConfigError::Validation(
            "at least one store type is required".to_string(),
        ));
    }
    if seed.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category is required".to_string(),
        ));
    }

    for location in &seed.locations {
        if !location.lat.is_finite() || !location.lng.is_finite() {
            return Err(ConfigError::Validation(format!(
                "location '{}' has a non-finite coordinate",
                location.name
            )));
        }
    }

    if !(0.0..1.0).contains(&seed.price_variance) {
        return Err(ConfigError::Validation(format!(
            "price_variance must be in [0, 1), got {}",
            seed.price_variance
        )));
    }
    if !(0.0..=1.0).contains(&seed.offer_probability) {
        return Err(ConfigError::Validation(format!(
            "offer_probability must be in [0, 1], got {}",
            seed.offer_probability
        )));
    }
    if !seed.jitter_degrees.is_finite() || seed.jitter_degrees < 0.0 {
        return Err(ConfigError::Validation(format!(
            "jitter_degrees must be a non-negative number, got {}",
            seed.jitter_degrees
        )));
    }
    if seed.stock.min < 0 || seed.stock.min > seed.stock.max {
        return Err(ConfigError::Validation(format!(
            "stock range {}..={} is empty or negative",
            seed.stock.min, seed.stock.max
        )));
    }

    let mut seen_items = HashSet::new();
    for category in &seed.categories {
        if category.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if category.items.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has no items",
                category.name
            )));
        }
        for item in &category.items {
            if item.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "item in category '{}' has an empty name",
                    category.name
                )));
            }
            if item.price <= 0 {
                return Err(ConfigError::Validation(format!(
                    "item '{}' has non-positive price {}",
                    item.name, item.price
                )));
            }
            if !seen_items.insert(item.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate item name: '{}'",
                    item.name
                )));
            }
        }
    }

    Ok(())
}

/// Stores and offerings produced from a [`CatalogSeed`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemoCatalog {
    pub stores: Vec<Store>,
    pub offerings: Vec<Offering>,
}

/// Builds the demo catalog. The same `seed` and `rng_seed` always produce
/// the same stores and offerings.
#[must_use]
pub fn generate_demo_catalog(seed: &CatalogSeed, rng_seed: u64) -> DemoCatalog {
    let mut rng = StdRng::seed_from_u64(rng_seed);
    let mut catalog = DemoCatalog::default();

    for i in 0..seed.store_count {
        let store = generate_store(seed, i, &mut rng);
        let mut position = 0;
        for category in &seed.categories {
            for item in &category.items {
                position += 1;
                catalog
                    .offerings
                    .push(generate_offering(seed, &store, category, item, position, &mut rng));
            }
        }
        catalog.stores.push(store);
    }

    catalog
}

#[allow(clippy::cast_possible_truncation)]
fn generate_store(seed: &CatalogSeed, index: usize, rng: &mut StdRng) -> Store {
    let location = &seed.locations[index % seed.locations.len()];
    let store_type = &seed.store_types[index % seed.store_types.len()];
    let number = index + 1;

    let name = if index == 0 {
        seed.flagship_name.clone()
    } else {
        format!("{} {store_type}", location.name)
    };

    let jitter = seed.jitter_degrees;
    let latitude = location.lat + rng.random_range(-jitter..=jitter);
    let longitude = location.lng + rng.random_range(-jitter..=jitter);
    let rating_tenths = (rng.random_range(3.5..=5.0_f64) * 10.0).round() as i64;

    Store {
        id: format!("store-{number}"),
        name,
        address: format!("{}, {}", location.name, seed.city),
        latitude,
        longitude,
        rating: Decimal::new(rating_tenths, 1),
        phone: Some(format!("+91 98765 432{:02}", index % 100)),
        hours: Some(seed.store_hours.clone()),
        owner_id: format!("retailer-{number}"),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn generate_offering(
    seed: &CatalogSeed,
    store: &Store,
    category: &SeedCategory,
    item: &SeedItem,
    position: usize,
    rng: &mut StdRng,
) -> Offering {
    let variance = seed.price_variance;
    let factor = rng.random_range(1.0 - variance..=1.0 + variance);
    let price = ((item.price as f64) * factor).round().max(1.0) as i64;
    let quantity = rng.random_range(seed.stock.min..=seed.stock.max);

    let offers = if !seed.offers.is_empty() && rng.random_bool(seed.offer_probability) {
        Some(seed.offers[rng.random_range(0..seed.offers.len())].clone())
    } else {
        None
    };

    Offering {
        id: format!("prod-{}-{position:03}", store.id),
        name: item.name.clone(),
        category: category.name.clone(),
        image: item.image.clone(),
        price,
        quantity,
        offers,
        store_id: store.id.clone(),
    }
}
