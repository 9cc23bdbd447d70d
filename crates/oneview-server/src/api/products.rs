use axum::{
    extract::{Path, State},
    Extension, Json,
};
use oneview_core::{CatalogError, Offering};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, AppState};

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<String>,
) -> Result<Json<Offering>, ApiError> {
    state
        .index
        .find_offering(&product_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?
        .map(Json)
        .ok_or_else(|| {
            map_catalog_error(req_id.0, &CatalogError::product_not_found(&product_id))
        })
}
