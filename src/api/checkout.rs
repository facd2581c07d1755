use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::auth::CurrentUser;
use super::response::{created, ok, ApiJson, ApiQuery, ApiResponse, ApiResult};
use super::{order_number, AppState, PageQuery};
use crate::domain::aggregates::{Order, PaymentMethod};
use crate::domain::value_objects::{Address, SessionId};
use crate::services::{CheckoutPreview, CheckoutReceipt, CheckoutRequest};
use crate::store::Page;
use crate::StorefrontError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[serde(default)]
    pub same_as_billing: bool,
}

impl From<CheckoutBody> for CheckoutRequest {
    fn from(body: CheckoutBody) -> Self {
        Self {
            shipping_address: body.shipping_address,
            billing_address: body.billing_address,
            same_as_billing: body.same_as_billing,
            payment_method: body.payment_method,
            notes: body.notes,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    pub reason: Option<String>,
}

pub async fn preview(
    State(store): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<CheckoutPreview> {
    let session_id = SessionId::parse(session_id)?;
    Ok(ok(store.preview_checkout(&session_id, user.id).await?))
}

pub async fn checkout(
    State(store): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<String>,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutReceipt>>), StorefrontError> {
    let session_id = SessionId::parse(session_id)?;
    let order = store.checkout(&session_id, user.id, body.into()).await?;
    Ok(created(CheckoutReceipt::from(&order)))
}

pub async fn list_orders(
    State(store): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Page<Order>> {
    Ok(ok(store.list_orders_for_user(user.id, query.page_request()).await?))
}

pub async fn get_order(
    State(store): State<AppState>,
    user: CurrentUser,
    Path(number): Path<String>,
) -> ApiResult<Order> {
    Ok(ok(store.order_for_user(user.id, &order_number(&number)?).await?))
}

pub async fn cancel_order(
    State(store): State<AppState>,
    user: CurrentUser,
    Path(number): Path<String>,
    body: Option<ApiJson<CancelBody>>,
) -> ApiResult<Order> {
    let reason = body.and_then(|ApiJson(b)| b.reason).filter(|r| !r.trim().is_empty());
    Ok(ok(store.cancel_order(user.id, &order_number(&number)?, reason).await?))
}
