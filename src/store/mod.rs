//! Persistence seams for carts, orders and the product catalog.
//!
//! Carts and orders are versioned documents. `save` succeeds only when the
//! stored version still equals the one the caller loaded, and bumps it;
//! otherwise it fails with [`StorefrontError::Conflict`](crate::StorefrontError::Conflict)
//! and the caller reloads.

pub mod fixture;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, OrderStatus, PaymentStatus, Product};
use crate::domain::value_objects::{OrderNumber, ProductId, SessionId};
use crate::Result;

pub use fixture::FixtureCatalog;
pub use memory::MemoryStore;
pub use postgres::{LiveCatalog, PgStore};

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find_by_session(&self, session_id: &SessionId) -> Result<Option<Cart>>;

    /// Inserts a new cart. Conflict if the session already has one.
    async fn insert(&self, cart: &Cart) -> Result<()>;

    async fn save(&self, cart: &mut Cart) -> Result<()>;

    /// Saves both carts of a merge in one transaction.
    async fn save_pair(&self, target: &mut Cart, source: &mut Cart) -> Result<()>;

    /// Deletes carts past expiry, marked abandoned/expired, or not updated
    /// since `stale_before`. Returns how many were deleted.
    async fn delete_reapable(&self, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts `order` and saves the converted `cart` as one atomic write.
    /// Conflict if the cart version moved or the order number is taken.
    async fn place(&self, order: &Order, cart: &mut Cart) -> Result<()>;

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>>;

    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>>;

    async fn save(&self, order: &mut Order) -> Result<()>;

    async fn delete(&self, number: &OrderNumber) -> Result<bool>;
}

/// Read-only view of the product catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Products for the given ids; unknown ids are absent from the result.
    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn for_user(user_id: Uuid) -> Self { Self { user_id: Some(user_id), ..Self::default() } }

    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status() == s)
            && self.payment_status.map_or(true, |p| order.payment_status() == p)
            && self.user_id.map_or(true, |u| order.user_id() == u)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 { u64::from(self.page - 1) * u64::from(self.limit) }
}

impl Default for PageRequest {
    fn default() -> Self { Self::new(None, None) }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = total.div_ceil(u64::from(request.limit));
        Self { data, total, page: request.page, limit: request.limit, total_pages }
    }
}
