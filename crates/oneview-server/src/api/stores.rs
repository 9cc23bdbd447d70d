use axum::{
    extract::{Path, State},
    Extension, Json,
};
use oneview_core::{CatalogError, Offering, Store};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct StoreDetail {
    #[serde(flatten)]
    store: Store,
    products: Vec<Offering>,
}

pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Vec<Store>>, ApiError> {
    let stores = state
        .index
        .list_stores()
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    Ok(Json(stores))
}

pub(super) async fn get_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(store_id): Path<String>,
) -> Result<Json<StoreDetail>, ApiError> {
    let store = state
        .index
        .find_store(&store_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            map_catalog_error(req_id.0.clone(), &CatalogError::store_not_found(&store_id))
        })?;

    let products = state
        .index
        .list_store_offerings(&store.id)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    Ok(Json(StoreDetail { store, products }))
}
