//! Best-deal scoring: a weighted blend of price and distance where lower is
//! better.

/// Price ceiling (in rupees) that prices are normalised against.
pub const PRICE_NORMALIZER: f64 = 300_000.0;
pub const PRICE_WEIGHT: f64 = 0.7;
/// Distance (km) beyond which a store is no further penalised.
pub const DISTANCE_CAP_KM: f64 = 50.0;
pub const DISTANCE_WEIGHT: f64 = 0.3;

/// Scores one offering given its price and its store's distance from the
/// shopper.
///
/// Price is normalised against a fixed ceiling rather than the price range of
/// the result set, so the absolute price drives the score. Distance saturates
/// at [`DISTANCE_CAP_KM`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn deal_score(price: i64, distance_km: f64) -> f64 {
    let price_component = (price as f64 / PRICE_NORMALIZER) * PRICE_WEIGHT;
    let distance_component = (distance_km / DISTANCE_CAP_KM).min(1.0) * DISTANCE_WEIGHT;
    price_component + distance_component
}
