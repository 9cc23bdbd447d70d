use axum::{extract::State, Extension, Json};
use oneview_core::{NewSale, SaleReceipt};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, AppState};

/// Records an offline (in-store) sale and returns it with the offering's
/// reduced stock.
pub(super) async fn sync_sale(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(sale): Json<NewSale>,
) -> Result<Json<SaleReceipt>, ApiError> {
    let receipt = state
        .inventory
        .record_sale(sale)
        .await
        .map_err(|e| map_catalog_error(req_id.0, &e))?;

    tracing::info!(
        bill_id = %receipt.sale.bill_id,
        store_id = %receipt.sale.store_id,
        product_id = %receipt.sale.product_id,
        remaining = receipt.updated_product.quantity,
        "sale recorded"
    );
    Ok(Json(receipt))
}
