//! Search orchestration: validate the request, resolve the shopper's
//! position, log the search, then match, group, and rank offerings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::{group_offerings, resolve_offerings, ProductGroup};
use crate::catalog::{CatalogError, CatalogIndex, SearchLog};
use crate::geo::{Coordinate, FALLBACK_COORDINATE};
use crate::models::SearchEvent;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Query required")]
    QueryRequired,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Raw search input as received from a transport.
///
/// Coordinates stay as strings so that unparsable values can fall back per
/// component instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lng: Option<String>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn at(mut self, lat: impl Into<String>, lng: impl Into<String>) -> Self {
        self.lat = Some(lat.into());
        self.lng = Some(lng.into());
        self
    }

    /// Shopper position, falling back per component to
    /// [`FALLBACK_COORDINATE`].
    #[must_use]
    pub fn location(&self) -> Coordinate {
        Coordinate::new(
            parse_component(self.lat.as_deref()).unwrap_or(FALLBACK_COORDINATE.lat),
            parse_component(self.lng.as_deref()).unwrap_or(FALLBACK_COORDINATE.lng),
        )
    }
}

/// A usable coordinate component: finite and non-zero. Zero is treated as
/// missing, matching how the storefront client has always been served.
fn parse_component(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value != 0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub results: Vec<ProductGroup>,
    pub user_location: Coordinate,
}

#[derive(Clone)]
pub struct SearchService {
    index: Arc<dyn CatalogIndex>,
    log: Arc<dyn SearchLog>,
}

impl SearchService {
    #[must_use]
    pub fn new(index: Arc<dyn CatalogIndex>, log: Arc<dyn SearchLog>) -> Self {
        Self { index, log }
    }

    /// Runs one search.
    ///
    /// A search event is recorded for every request that passes validation,
    /// including ones that match nothing. Failing to record it is logged and
    /// does not fail the search.
    ///
    /// # Errors
    ///
    /// [`SearchError::QueryRequired`] for a missing or empty query, and
    /// [`SearchError::Catalog`] when the index fails.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, SearchError> {
        let query = match request.query.as_deref() {
            Some(q) if !q.is_empty() => q,
            _ => return Err(SearchError::QueryRequired),
        };
        let location = request.location();

        if let Err(e) = self.log.record(SearchEvent::new(query, location)).await {
            tracing::warn!(error = %e, "failed to record search event");
        }

        let matches = self.index.find_by_query(&query.to_lowercase()).await?;
        let matched = matches.len();
        let resolved = resolve_offerings(self.index.as_ref(), matches).await?;
        let results = group_offerings(location, resolved);

        tracing::info!(
            query,
            matched,
            groups = results.len(),
            lat = location.lat,
            lng = location.lng,
            "search completed"
        );

        Ok(SearchResults {
            results,
            user_location: location,
        })
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
