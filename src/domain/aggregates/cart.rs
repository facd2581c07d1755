//! Cart Aggregate

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::Product;
use crate::domain::events::{CartEvent, DomainEvent};
use crate::domain::value_objects::{OrderNumber, ProductId, ProductSnapshot, SessionId};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    session_id: SessionId,
    user_id: Option<Uuid>,
    items: Vec<CartItem>,
    total_items: u32,
    total_amount: Decimal,
    currency: String,
    status: CartStatus,
    version: i64,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub product_snapshot: ProductSnapshot,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus { #[default] Active, Abandoned, Converted, Expired }

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Abandoned => "abandoned",
            Self::Converted => "converted",
            Self::Expired => "expired",
        }
    }
}

impl Cart {
    pub fn new(session_id: SessionId, user_id: Option<Uuid>, currency: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            session_id, user_id, items: vec![], total_items: 0, total_amount: Decimal::ZERO,
            currency: currency.to_string(), status: CartStatus::Active, version: 0,
            expires_at: now + ttl, created_at: now, updated_at: now, events: vec![],
        }
    }

    pub fn session_id(&self) -> &SessionId { &self.session_id }
    pub fn user_id(&self) -> Option<Uuid> { self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn total_items(&self) -> u32 { self.total_items }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn status(&self) -> CartStatus { self.status }
    pub fn version(&self) -> i64 { self.version }
    pub fn expires_at(&self) -> DateTime<Utc> { self.expires_at }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item(&self, product_id: ProductId) -> Option<&CartItem> { self.items.iter().find(|i| i.product_id == product_id) }

    /// Adds `quantity` of `product`, merging with an existing line for the same product.
    /// Price and display data are captured from the product as it is right now.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 { return Err(CartError::InvalidQuantity); }
        if !product.is_in_stock() { return Err(CartError::OutOfStock(product.name.clone())); }
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            existing.quantity = existing.quantity.checked_add(quantity).ok_or(CartError::InvalidQuantity)?;
        } else {
            self.items.push(CartItem {
                product_id: product.id, quantity, price: product.price, product_snapshot: product.cart_snapshot(),
            });
        }
        self.mutated();
        Ok(())
    }

    /// Sets the quantity of a line; zero or less removes it.
    pub fn update_item_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.product_id == product_id).ok_or(CartError::ItemNotFound)?;
        if quantity <= 0 {
            self.items.retain(|i| i.product_id != product_id);
        } else {
            item.quantity = u32::try_from(quantity).map_err(|_| CartError::InvalidQuantity)?;
        }
        self.mutated();
        Ok(())
    }

    /// Removes the line for `product_id` if present. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed { self.mutated(); }
        removed
    }

    /// Drops lines that fail `keep`. Returns how many were dropped.
    pub fn retain_items(&mut self, mut keep: impl FnMut(&CartItem) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|i| keep(i));
        let dropped = before - self.items.len();
        if dropped > 0 { self.mutated(); }
        dropped
    }

    pub fn clear(&mut self) { self.items.clear(); self.mutated(); }

    /// Guest carts are open to anyone holding the session id; owned carts only to their owner.
    pub fn is_accessible_to(&self, user_id: Uuid) -> bool { self.user_id.map_or(true, |owner| owner == user_id) }

    /// Claims a guest cart for `user_id`. Fails without changes if another user owns it.
    pub fn assign_user(&mut self, user_id: Uuid) -> Result<(), CartError> {
        match self.user_id {
            Some(owner) if owner == user_id => Ok(()),
            Some(_) => Err(CartError::NotOwner),
            None => {
                self.user_id = Some(user_id);
                self.touch();
                Ok(())
            }
        }
    }

    /// Moves every line of `source` into this cart, summing quantities for
    /// products already present. This cart's price and snapshot are kept on
    /// conflict. `source` is cleared. Returns the number of source lines moved.
    /// Neither cart changes if a summed quantity would overflow.
    pub fn merge_from(&mut self, source: &mut Cart) -> Result<usize, CartError> {
        for incoming in &source.items {
            if let Some(existing) = self.item(incoming.product_id) {
                existing.quantity.checked_add(incoming.quantity).ok_or(CartError::InvalidQuantity)?;
            }
        }
        let moved = source.items.len();
        for incoming in source.items.drain(..) {
            match self.items.iter_mut().find(|i| i.product_id == incoming.product_id) {
                Some(existing) => existing.quantity += incoming.quantity,
                None => self.items.push(incoming),
            }
        }
        source.mutated();
        self.mutated();
        self.raise_event(DomainEvent::Cart(CartEvent::Merged {
            source_session_id: source.session_id.clone(), target_session_id: self.session_id.clone(), items_moved: moved,
        }));
        Ok(moved)
    }

    /// Empties the cart after it has been turned into `order_number`.
    pub fn convert(&mut self, order_number: &OrderNumber) {
        self.items.clear();
        self.recalculate();
        self.status = CartStatus::Converted;
        self.touch();
        self.raise_event(DomainEvent::Cart(CartEvent::Converted {
            session_id: self.session_id.clone(), order_number: order_number.clone(),
        }));
    }

    /// True when the reaper should delete this cart.
    pub fn is_reapable(&self, now: DateTime<Utc>, stale_before: DateTime<Utc>) -> bool {
        self.expires_at < now
            || matches!(self.status, CartStatus::Abandoned | CartStatus::Expired)
            || self.updated_at < stale_before
    }

    pub(crate) fn bump_version(&mut self) { self.version += 1; }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }

    fn mutated(&mut self) {
        if self.status == CartStatus::Converted && !self.items.is_empty() { self.status = CartStatus::Active; }
        self.recalculate();
        self.touch();
    }

    fn recalculate(&mut self) {
        self.total_items = self.items.iter().map(|i| i.quantity).fold(0u32, u32::saturating_add);
        self.total_amount = self.items.iter().map(CartItem::line_total).sum();
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("Cart belongs to another user")]
    NotOwner,
}
