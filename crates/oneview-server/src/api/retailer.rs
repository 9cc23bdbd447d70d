use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use oneview_core::{CatalogError, NewOffering, Offering, OfferingPatch};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct MessageBody {
    message: &'static str,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(store_id): Path<String>,
) -> Result<Json<Vec<Offering>>, ApiError> {
    let offerings = state
        .index
        .list_store_offerings(&store_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    Ok(Json(offerings))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(input): Json<NewOffering>,
) -> Result<(StatusCode, Json<Offering>), ApiError> {
    let offering = state
        .inventory
        .create_offering(input)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    tracing::info!(
        offering_id = %offering.id,
        store_id = %offering.store_id,
        "offering created"
    );
    Ok((StatusCode::CREATED, Json(offering)))
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(offering_id): Path<String>,
    Json(patch): Json<OfferingPatch>,
) -> Result<Json<Offering>, ApiError> {
    let updated = state
        .inventory
        .update_offering(&offering_id, patch)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            map_catalog_error(req_id.0, &CatalogError::product_not_found(&offering_id))
        })?;

    Ok(Json(updated))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(offering_id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let deleted = state
        .inventory
        .delete_offering(&offering_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    if !deleted {
        return Err(map_catalog_error(
            req_id.0,
            &CatalogError::product_not_found(&offering_id),
        ));
    }

    tracing::info!(offering_id = %offering_id, "offering deleted");
    Ok(Json(MessageBody { message: "Deleted" }))
}
