//! Postgres-backed stores.
//!
//! Carts and orders live as JSONB documents next to the scalar columns used
//! for lookups, filtering and the optimistic version check.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Executor, Postgres};
use tracing::instrument;
use uuid::Uuid;

use super::{CartRepository, Catalog, OrderFilter, OrderRepository, Page, PageRequest};
use crate::domain::aggregates::{Cart, Order, Product};
use crate::domain::value_objects::{OrderNumber, ProductId, SessionId};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32, connect_timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool { &self.pool }
}

fn conflict_on_unique(e: sqlx::Error) -> StorefrontError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorefrontError::Conflict,
        _ => e.into(),
    }
}

async fn update_cart<'e, E>(executor: E, cart: &mut Cart) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    let expected = cart.version();
    cart.bump_version();
    let result = sqlx::query(
        "UPDATE carts SET user_id = $2, status = $3, version = $4, expires_at = $5, updated_at = $6, doc = $7 \
         WHERE session_id = $1 AND version = $8",
    )
    .bind(cart.session_id().as_str())
    .bind(cart.user_id())
    .bind(cart.status().as_str())
    .bind(cart.version())
    .bind(cart.expires_at())
    .bind(cart.updated_at())
    .bind(Json(&*cart))
    .bind(expected)
    .execute(executor)
    .await?;
    if result.rows_affected() == 0 { return Err(StorefrontError::Conflict); }
    Ok(())
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find_by_session(&self, session_id: &SessionId) -> Result<Option<Cart>> {
        let row: Option<(Json<Cart>,)> = sqlx::query_as("SELECT doc FROM carts WHERE session_id = $1")
            .bind(session_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn insert(&self, cart: &Cart) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO carts (session_id, user_id, status, version, expires_at, created_at, updated_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(cart.session_id().as_str())
        .bind(cart.user_id())
        .bind(cart.status().as_str())
        .bind(cart.version())
        .bind(cart.expires_at())
        .bind(cart.created_at())
        .bind(cart.updated_at())
        .bind(Json(cart))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 { return Err(StorefrontError::Conflict); }
        Ok(())
    }

    async fn save(&self, cart: &mut Cart) -> Result<()> {
        update_cart(&self.pool, cart).await
    }

    async fn save_pair(&self, target: &mut Cart, source: &mut Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        update_cart(&mut *tx, target).await?;
        update_cart(&mut *tx, source).await?;
        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_reapable(&self, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM carts WHERE expires_at < $1 OR status IN ('abandoned', 'expired') OR updated_at < $2",
        )
        .bind(now)
        .bind(stale_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for PgStore {
    #[instrument(skip_all, fields(order_number = %order.order_number()))]
    async fn place(&self, order: &Order, cart: &mut Cart) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO orders (order_number, user_id, session_id, status, payment_status, version, created_at, updated_at, doc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.order_number().as_str())
        .bind(order.user_id())
        .bind(order.session_id().as_str())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.version())
        .bind(order.created_at())
        .bind(order.updated_at())
        .bind(Json(order))
        .execute(&mut *tx)
        .await
        .map_err(conflict_on_unique)?;
        update_cart(&mut *tx, cart).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        let row: Option<(Json<Order>,)> = sqlx::query_as("SELECT doc FROM orders WHERE order_number = $1")
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(doc,)| doc.0))
    }

    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>> {
        const WHERE: &str = "($1::text IS NULL OR status = $1) \
            AND ($2::text IS NULL OR payment_status = $2) \
            AND ($3::uuid IS NULL OR user_id = $3)";
        let status = filter.status.map(|s| s.as_str());
        let payment_status = filter.payment_status.map(|p| p.as_str());

        let rows: Vec<(Json<Order>,)> = sqlx::query_as(&format!(
            "SELECT doc FROM orders WHERE {WHERE} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(status)
        .bind(payment_status)
        .bind(filter.user_id)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;
        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM orders WHERE {WHERE}"))
            .bind(status)
            .bind(payment_status)
            .bind(filter.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(rows.into_iter().map(|(doc,)| doc.0).collect(), total.0.max(0) as u64, page))
    }

    async fn save(&self, order: &mut Order) -> Result<()> {
        let expected = order.version();
        order.bump_version();
        let result = sqlx::query(
            "UPDATE orders SET status = $2, payment_status = $3, version = $4, updated_at = $5, doc = $6 \
             WHERE order_number = $1 AND version = $7",
        )
        .bind(order.order_number().as_str())
        .bind(order.status().as_str())
        .bind(order.payment_status().as_str())
        .bind(order.version())
        .bind(order.updated_at())
        .bind(Json(&*order))
        .bind(expected)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 { return Ok(()); }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM orders WHERE order_number = $1")
            .bind(order.order_number().as_str())
            .fetch_optional(&self.pool)
            .await?;
        Err(if exists.is_some() { StorefrontError::Conflict } else { StorefrontError::OrderNotFound })
    }

    async fn delete(&self, number: &OrderNumber) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE order_number = $1")
            .bind(number.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price: Decimal,
    image: Option<String>,
    category: Option<String>,
    description: Option<String>,
    in_stock: bool,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: ProductId::new(r.id), name: r.name, price: r.price, image: r.image,
            category: r.category, description: r.description, in_stock: r.in_stock,
        }
    }
}

/// Reads the catalog collaborator's `products` table.
#[derive(Clone, Debug)]
pub struct LiveCatalog {
    pool: PgPool,
}

impl LiveCatalog {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

const PRODUCT_COLUMNS: &str = "id, name, price, image, category, description, in_stock";

#[async_trait]
impl Catalog for LiveCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        if ids.is_empty() { return Ok(vec![]); }
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
