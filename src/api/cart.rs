use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::response::{created, ok, ApiJson, ApiResponse, ApiResult};
use super::AppState;
use crate::domain::value_objects::{ProductId, SessionId};
use crate::services::CartView;
use crate::StorefrontError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityBody {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeBody {
    pub user_session_id: String,
    pub user_id: Uuid,
}

fn product_id(raw: &str) -> Result<ProductId, StorefrontError> {
    raw.parse().map_err(|_| StorefrontError::ProductNotFound)
}

pub async fn create_session(State(store): State<AppState>) -> (StatusCode, Json<ApiResponse<SessionCreated>>) {
    created(SessionCreated { session_id: store.create_session() })
}

pub async fn get_cart(State(store): State<AppState>, Path(session_id): Path<String>) -> ApiResult<CartView> {
    let session_id = SessionId::parse(session_id)?;
    Ok(ok(store.get_cart(&session_id).await?))
}

pub async fn add_item(
    State(store): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<AddItemBody>,
) -> ApiResult<CartView> {
    let session_id = SessionId::parse(session_id)?;
    let cart = store.add_item(&session_id, body.product_id, body.quantity.unwrap_or(1)).await?;
    Ok(ok(store.view(&cart).await?))
}

pub async fn update_item(
    State(store): State<AppState>,
    Path((session_id, product)): Path<(String, String)>,
    ApiJson(body): ApiJson<UpdateQuantityBody>,
) -> ApiResult<CartView> {
    let session_id = SessionId::parse(session_id)?;
    let cart = store.update_item_quantity(&session_id, product_id(&product)?, body.quantity).await?;
    Ok(ok(store.view(&cart).await?))
}

pub async fn remove_item(
    State(store): State<AppState>,
    Path((session_id, product)): Path<(String, String)>,
) -> ApiResult<CartView> {
    let session_id = SessionId::parse(session_id)?;
    let cart = store.remove_item(&session_id, product_id(&product)?).await?;
    Ok(ok(store.view(&cart).await?))
}

pub async fn clear_cart(State(store): State<AppState>, Path(session_id): Path<String>) -> ApiResult<CartView> {
    let session_id = SessionId::parse(session_id)?;
    let cart = store.clear_cart(&session_id).await?;
    Ok(ok(store.view(&cart).await?))
}

/// Merges the guest cart at the path into the user's cart.
pub async fn merge(
    State(store): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<MergeBody>,
) -> ApiResult<CartView> {
    let guest = SessionId::parse(session_id)?;
    let user_session = SessionId::parse(body.user_session_id)?;
    let cart = store.merge_carts(&guest, &user_session, body.user_id).await?;
    Ok(ok(store.view(&cart).await?))
}
