mod products;
mod retailer;
mod sales;
mod search;
mod stores;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use oneview_core::{CatalogError, CatalogIndex, Inventory, SearchError, SearchLog, SearchService};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState,
};

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn CatalogIndex>,
    pub inventory: Arc<dyn Inventory>,
    pub search: SearchService,
    /// Reported by the health endpoint.
    pub backend: &'static str,
}

impl AppState {
    /// Wires one backend into every role it can play.
    pub fn from_backend<B>(backend: Arc<B>, name: &'static str) -> Self
    where
        B: CatalogIndex + Inventory + SearchLog + 'static,
    {
        Self {
            index: backend.clone(),
            inventory: backend.clone(),
            search: SearchService::new(backend.clone(), backend),
            backend: name,
        }
    }
}

/// Error body shared by every route: `{ error, code, request_id }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    pub request_id: String,
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            request_id: request_id.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "bad_request" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "conflict" => StatusCode::CONFLICT,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

pub(super) fn map_catalog_error(request_id: String, error: &CatalogError) -> ApiError {
    match error {
        CatalogError::Validation(message) => ApiError::new(request_id, "bad_request", message),
        CatalogError::NotFound { entity: "store", .. } => {
            ApiError::new(request_id, "not_found", "Store not found")
        }
        CatalogError::NotFound { .. } => {
            ApiError::new(request_id, "not_found", "Product not found")
        }
        CatalogError::InsufficientStock { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        CatalogError::Backend(_) => {
            tracing::error!(error = %error, "catalog backend failed");
            ApiError::new(request_id, "internal_error", "catalog backend failure")
        }
    }
}

pub(super) fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::QueryRequired => ApiError::new(request_id, "bad_request", error.to_string()),
        SearchError::Catalog(inner) => map_catalog_error(request_id, inner),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    backend: &'static str,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/retailer/products",
            post(retailer::create_product),
        )
        .route(
            "/api/v1/retailer/products/{id}",
            get(retailer::list_products)
                .put(retailer::update_product)
                .delete(retailer::delete_product),
        )
        .route("/api/v1/sales/sync", post(sales::sync_sale))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/products/search", get(search::search_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route("/api/v1/stores", get(stores::list_stores))
        .route("/api/v1/stores/{id}", get(stores::get_store));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.index.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "ok",
                backend: state.backend,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: catalog backend unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unavailable",
                    backend: state.backend,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
