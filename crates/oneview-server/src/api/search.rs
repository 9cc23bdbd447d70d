use axum::{
    extract::{Query, State},
    Extension, Json,
};
use oneview_core::{SearchRequest, SearchResults};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_search_error, ApiError, AppState};

/// Query string of the storefront search. Coordinates are kept as raw
/// strings; the search service decides what counts as usable.
#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    #[serde(alias = "query")]
    pub q: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let request = SearchRequest {
        query: query.q,
        lat: query.lat,
        lng: query.lng,
    };

    state
        .search
        .search(&request)
        .await
        .map(Json)
        .map_err(|e| map_search_error(req_id.0, &e))
}
