//! Stores, product offerings, sales, and search events.
//!
//! JSON field names are camelCase to match the storefront client.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CatalogError;
use crate::geo::Coordinate;

/// A physical retail location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 0–5 by convention; not enforced.
    pub rating: Decimal,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub owner_id: String,
}

impl Store {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// One store's priced, stocked listing of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    /// Whole rupees.
    pub price: i64,
    pub quantity: i64,
    /// Free-text promotion, e.g. `"10% off"`.
    pub offers: Option<String>,
    pub store_id: String,
}

impl Offering {
    /// Case-insensitive substring match against name or category.
    ///
    /// `lowered_query` must already be lower-cased.
    #[must_use]
    pub fn matches(&self, lowered_query: &str) -> bool {
        self.name.to_lowercase().contains(lowered_query)
            || self.category.to_lowercase().contains(lowered_query)
    }
}

/// Generates a fresh offering identifier.
#[must_use]
pub fn new_offering_id() -> String {
    format!("prod-{}", Uuid::new_v4())
}

/// Retailer input for listing a new product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffering {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: i64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub offers: Option<String>,
    pub store_id: String,
}

impl NewOffering {
    /// Checks field-level constraints. Store existence is checked by the
    /// repository.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming the first bad field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_text("name", &self.name)?;
        require_text("category", &self.category)?;
        require_text("storeId", &self.store_id)?;
        require_positive_price(self.price)?;
        require_stock(self.quantity)
    }

    /// Builds the stored offering under `id`.
    #[must_use]
    pub fn into_offering(self, id: String) -> Offering {
        Offering {
            id,
            name: self.name,
            category: self.category,
            image: self.image,
            price: self.price,
            quantity: self.quantity,
            offers: normalize_offers(self.offers),
            store_id: self.store_id,
        }
    }
}

/// Partial retailer edit. Absent fields are left untouched; an empty
/// `offers` string clears the promotion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i64>,
    pub offers: Option<String>,
}

impl OfferingPatch {
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] naming the first bad field.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(category) = &self.category {
            require_text("category", category)?;
        }
        if let Some(price) = self.price {
            require_positive_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            require_stock(quantity)?;
        }
        Ok(())
    }

    pub fn apply(self, offering: &mut Offering) {
        if let Some(name) = self.name {
            offering.name = name;
        }
        if let Some(category) = self.category {
            offering.category = category;
        }
        if let Some(image) = self.image {
            offering.image = Some(image);
        }
        if let Some(price) = self.price {
            offering.price = price;
        }
        if let Some(quantity) = self.quantity {
            offering.quantity = quantity;
        }
        if self.offers.is_some() {
            offering.offers = normalize_offers(self.offers);
        }
    }
}

/// An offline sale reported by a retailer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub store_id: String,
    pub product_id: String,
    pub quantity: i64,
}

impl NewSale {
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] when the quantity is not positive.
    pub fn validate(&self) -> Result<(), CatalogError> {
        require_text("storeId", &self.store_id)?;
        require_text("productId", &self.product_id)?;
        if self.quantity <= 0 {
            return Err(CatalogError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Stamps the sale with identifiers and the current time.
    #[must_use]
    pub fn into_sale(self) -> Sale {
        let id = Uuid::new_v4().simple().to_string();
        let bill_id = format!("BILL-{}", id[..8].to_ascii_uppercase());
        Sale {
            id: format!("sale-{id}"),
            store_id: self.store_id,
            product_id: self.product_id,
            quantity: self.quantity,
            bill_id,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub store_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub bill_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of recording a sale: the sale itself and the offering with its
/// reduced stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    pub updated_product: Offering,
}

/// Append-only record of one accepted search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEvent {
    pub id: String,
    /// Lower-cased query text.
    pub query: String,
    pub lat: f64,
    pub lng: f64,
    pub timestamp: DateTime<Utc>,
}

impl SearchEvent {
    #[must_use]
    pub fn new(query: &str, location: Coordinate) -> Self {
        Self {
            id: format!("search-{}", Uuid::new_v4()),
            query: query.to_lowercase(),
            lat: location.lat,
            lng: location.lng,
            timestamp: Utc::now(),
        }
    }
}

fn normalize_offers(offers: Option<String>) -> Option<String> {
    offers
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!("{field} must be non-empty")));
    }
    Ok(())
}

fn require_positive_price(price: i64) -> Result<(), CatalogError> {
    if price <= 0 {
        return Err(CatalogError::Validation(format!(
            "price must be positive, got {price}"
        )));
    }
    Ok(())
}

fn require_stock(quantity: i64) -> Result<(), CatalogError> {
    if quantity < 0 {
        return Err(CatalogError::Validation(format!(
            "quantity must be non-negative, got {quantity}"
        )));
    }
    Ok(())
}
