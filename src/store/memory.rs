//! In-process cart and order store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CartRepository, OrderFilter, OrderRepository, Page, PageRequest};
use crate::domain::aggregates::{Cart, Order};
use crate::domain::value_objects::{OrderNumber, SessionId};
use crate::{Result, StorefrontError};

#[derive(Debug, Default)]
struct Inner {
    carts: HashMap<SessionId, Cart>,
    orders: HashMap<OrderNumber, Order>,
}

/// Keeps every document behind one lock, so multi-document writes are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub async fn order_count(&self) -> usize { self.inner.read().await.orders.len() }
}

fn stored<T: Clone>(doc: &T, drain: impl FnOnce(&mut T)) -> T {
    let mut copy = doc.clone();
    drain(&mut copy);
    copy
}

fn save_cart(carts: &mut HashMap<SessionId, Cart>, cart: &mut Cart) -> Result<()> {
    match carts.get(cart.session_id()) {
        Some(current) if current.version() == cart.version() => {}
        _ => return Err(StorefrontError::Conflict),
    }
    cart.bump_version();
    carts.insert(cart.session_id().clone(), stored(cart, |c| { c.take_events(); }));
    Ok(())
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find_by_session(&self, session_id: &SessionId) -> Result<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(session_id).cloned())
    }

    async fn insert(&self, cart: &Cart) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.carts.contains_key(cart.session_id()) { return Err(StorefrontError::Conflict); }
        inner.carts.insert(cart.session_id().clone(), stored(cart, |c| { c.take_events(); }));
        Ok(())
    }

    async fn save(&self, cart: &mut Cart) -> Result<()> {
        save_cart(&mut self.inner.write().await.carts, cart)
    }

    async fn save_pair(&self, target: &mut Cart, source: &mut Cart) -> Result<()> {
        let mut inner = self.inner.write().await;
        let versions_match = [&*target, &*source].iter().all(|c| {
            inner.carts.get(c.session_id()).is_some_and(|current| current.version() == c.version())
        });
        if !versions_match { return Err(StorefrontError::Conflict); }
        save_cart(&mut inner.carts, target)?;
        save_cart(&mut inner.carts, source)
    }

    async fn delete_reapable(&self, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.carts.len();
        inner.carts.retain(|_, cart| !cart.is_reapable(now, stale_before));
        Ok((before - inner.carts.len()) as u64)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn place(&self, order: &Order, cart: &mut Cart) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.orders.contains_key(order.order_number()) { return Err(StorefrontError::Conflict); }
        save_cart(&mut inner.carts, cart)?;
        inner.orders.insert(order.order_number().clone(), stored(order, |o| { o.take_events(); }));
        Ok(())
    }

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(number).cloned())
    }

    async fn list(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Order> = inner.orders.values().filter(|o| filter.matches(o)).collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        let total = matching.len() as u64;
        let data = matching.into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(data, total, page))
    }

    async fn save(&self, order: &mut Order) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.orders.get(order.order_number()) {
            Some(current) if current.version() == order.version() => {}
            Some(_) => return Err(StorefrontError::Conflict),
            None => return Err(StorefrontError::OrderNotFound),
        }
        order.bump_version();
        inner.orders.insert(order.order_number().clone(), stored(order, |o| { o.take_events(); }));
        Ok(())
    }

    async fn delete(&self, number: &OrderNumber) -> Result<bool> {
        Ok(self.inner.write().await.orders.remove(number).is_some())
    }
}
