//! Turns matched offerings into ranked product groups.
//!
//! Offerings are grouped by exact product name (case- and
//! whitespace-sensitive), each entry is scored against the shopper's
//! position, and the lowest-scoring entry of every group is flagged as the
//! best deal.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogError, CatalogIndex};
use crate::geo::{round_km, Coordinate};
use crate::models::{Offering, Store};
use crate::scoring::deal_score;

/// One store's offering of a product, scored for a particular shopper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredOffering {
    pub store_id: String,
    pub store_name: String,
    pub address: String,
    pub rating: Decimal,
    pub price: i64,
    pub quantity: i64,
    pub offers: Option<String>,
    /// Kilometres from the shopper, rounded to two decimals.
    pub distance: f64,
    /// Computed from the unrounded distance.
    pub best_deal_score: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_best_deal: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

impl ScoredOffering {
    fn new(offering: &Offering, store: &Store, distance_km: f64) -> Self {
        Self {
            store_id: store.id.clone(),
            store_name: store.name.clone(),
            address: store.address.clone(),
            rating: store.rating,
            price: offering.price,
            quantity: offering.quantity,
            offers: offering.offers.clone(),
            distance: round_km(distance_km),
            best_deal_score: deal_score(offering.price, distance_km),
            latitude: store.latitude,
            longitude: store.longitude,
            is_best_deal: false,
        }
    }
}

/// All offerings sharing one product name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub name: String,
    pub category: String,
    /// Image of the first offering seen for this name.
    pub image: Option<String>,
    pub stores: Vec<ScoredOffering>,
}

impl ProductGroup {
    fn rank(&mut self) {
        self.stores.sort_by(compare_entries);
        for (position, entry) in self.stores.iter_mut().enumerate() {
            entry.is_best_deal = position == 0;
        }
    }

    /// The flagged entry, if the group has any.
    #[must_use]
    pub fn best_deal(&self) -> Option<&ScoredOffering> {
        self.stores.iter().find(|entry| entry.is_best_deal)
    }
}

/// Score ascending, then price ascending, then store id.
fn compare_entries(a: &ScoredOffering, b: &ScoredOffering) -> Ordering {
    a.best_deal_score
        .total_cmp(&b.best_deal_score)
        .then_with(|| a.price.cmp(&b.price))
        .then_with(|| a.store_id.cmp(&b.store_id))
}

/// Pairs each offering with its store, dropping offerings whose store cannot
/// be found.
///
/// Each distinct store id is looked up once per call.
///
/// # Errors
///
/// Propagates backend failures from the index.
pub async fn resolve_offerings(
    index: &dyn CatalogIndex,
    offerings: Vec<Offering>,
) -> Result<Vec<(Offering, Arc<Store>)>, CatalogError> {
    let mut stores: HashMap<String, Option<Arc<Store>>> = HashMap::new();
    let mut resolved = Vec::with_capacity(offerings.len());

    for offering in offerings {
        if !stores.contains_key(&offering.store_id) {
            let store = index.find_store(&offering.store_id).await?.map(Arc::new);
            stores.insert(offering.store_id.clone(), store);
        }

        match stores.get(&offering.store_id).cloned().flatten() {
            Some(store) => resolved.push((offering, store)),
            None => tracing::debug!(
                offering_id = %offering.id,
                store_id = %offering.store_id,
                "dropping offering with unknown store"
            ),
        }
    }

    Ok(resolved)
}

/// Groups resolved offerings by product name and ranks every group.
///
/// Groups come out in the order their names are first seen. Within a group
/// exactly one entry, the first after sorting, has `is_best_deal` set.
pub fn group_offerings<S>(
    origin: Coordinate,
    resolved: impl IntoIterator<Item = (Offering, S)>,
) -> Vec<ProductGroup>
where
    S: Borrow<Store>,
{
    let mut groups: Vec<ProductGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (offering, store) in resolved {
        let store = store.borrow();
        let distance_km = origin.distance_km(store.coordinate());
        let entry = ScoredOffering::new(&offering, store, distance_km);

        let position = *positions.entry(offering.name.clone()).or_insert_with(|| {
            groups.push(ProductGroup {
                name: offering.name.clone(),
                category: offering.category.clone(),
                image: offering.image.clone(),
                stores: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].stores.push(entry);
    }

    for group in &mut groups {
        group.rank();
    }

    groups
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
