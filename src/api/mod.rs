//! REST surface over [`Storefront`].

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod response;

use std::sync::Arc;

use axum::routing::{get, patch, post, put};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::value_objects::OrderNumber;
use crate::services::Storefront;
use crate::store::PageRequest;
use crate::StorefrontError;
use response::{ok, ApiResponse};

pub type AppState = Arc<Storefront>;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest { PageRequest::new(self.page, self.limit) }
}

/// Malformed order numbers cannot exist, so they are reported as missing.
fn order_number(raw: &str) -> Result<OrderNumber, StorefrontError> {
    OrderNumber::parse(raw).map_err(|_| StorefrontError::OrderNotFound)
}

async fn health() -> axum::Json<ApiResponse<Value>> {
    ok(json!({ "status": "healthy", "service": "bloom-storefront" }))
}

/// Build the router (separated from `main` for testing).
pub fn router(storefront: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cart/session", post(cart::create_session))
        .route("/cart/:session_id", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/:session_id/items", post(cart::add_item))
        .route("/cart/:session_id/items/:product_id", put(cart::update_item).delete(cart::remove_item))
        .route("/cart/:session_id/merge", post(cart::merge))
        .route("/checkout/orders", get(checkout::list_orders))
        .route("/checkout/orders/:order_number", get(checkout::get_order))
        .route("/checkout/orders/:order_number/cancel", patch(checkout::cancel_order))
        .route("/checkout/:session_id", get(checkout::preview).post(checkout::checkout))
        .route("/admin/orders", get(admin::list_orders))
        .route("/admin/orders/:order_number", get(admin::get_order).delete(admin::delete_order))
        .route("/admin/orders/:order_number/status", put(admin::update_status))
        .route("/admin/orders/:order_number/payment", put(admin::update_payment))
        .route("/admin/carts/cleanup", post(admin::cleanup_carts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(storefront)
}
