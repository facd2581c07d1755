//! Back-office order management. Every handler requires the admin role.

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::AdminUser;
use super::response::{ok, ApiJson, ApiQuery, ApiResult};
use super::{order_number, AppState};
use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus};
use crate::domain::value_objects::OrderNumber;
use crate::store::{OrderFilter, Page, PageRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBody {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub tracking_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeleted {
    pub order_number: OrderNumber,
}

#[derive(Debug, Serialize)]
pub struct CartsReaped {
    pub deleted: u64,
}

pub async fn list_orders(
    State(store): State<AppState>,
    _admin: AdminUser,
    ApiQuery(query): ApiQuery<AdminOrderQuery>,
) -> ApiResult<Page<Order>> {
    let filter = OrderFilter { status: query.status, payment_status: query.payment_status, user_id: query.user_id };
    Ok(ok(store.list_orders(&filter, PageRequest::new(query.page, query.limit)).await?))
}

pub async fn get_order(State(store): State<AppState>, _admin: AdminUser, Path(number): Path<String>) -> ApiResult<Order> {
    Ok(ok(store.order(&order_number(&number)?).await?))
}

pub async fn update_status(
    State(store): State<AppState>,
    _admin: AdminUser,
    Path(number): Path<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<Order> {
    let number = order_number(&number)?;
    let note = body.note.filter(|n| !n.trim().is_empty());
    Ok(ok(store.update_order_status(&number, body.status, note, body.tracking_number).await?))
}

pub async fn update_payment(
    State(store): State<AppState>,
    _admin: AdminUser,
    Path(number): Path<String>,
    ApiJson(body): ApiJson<PaymentBody>,
) -> ApiResult<Order> {
    Ok(ok(store.update_payment_status(&order_number(&number)?, body.payment_status).await?))
}

pub async fn delete_order(State(store): State<AppState>, _admin: AdminUser, Path(number): Path<String>) -> ApiResult<OrderDeleted> {
    let number = order_number(&number)?;
    store.delete_order(&number).await?;
    Ok(ok(OrderDeleted { order_number: number }))
}

pub async fn cleanup_carts(State(store): State<AppState>, _admin: AdminUser) -> ApiResult<CartsReaped> {
    Ok(ok(CartsReaped { deleted: store.reap_carts().await? }))
}
