//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::pricing::Charges;
use crate::domain::value_objects::{Address, OrderNumber, ProductRef, ProductSnapshot, SessionId};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    order_number: OrderNumber,
    user_id: Uuid,
    session_id: SessionId,
    items: Vec<OrderItem>,
    shipping_address: Address,
    billing_address: Option<Address>,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    status: OrderStatus,
    subtotal: Decimal,
    shipping_cost: Decimal,
    tax: Decimal,
    discount: Decimal,
    total_amount: Decimal,
    currency: String,
    notes: Option<String>,
    tracking_number: Option<String>,
    estimated_delivery: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
    status_history: Vec<StatusEntry>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductRef,
    pub quantity: u32,
    pub price: Decimal,
    pub product_snapshot: ProductSnapshot,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus { #[default] Pending, Confirmed, Processing, Shipped, Delivered, Cancelled, Returned }

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        Self::Pending, Self::Confirmed, Self::Processing, Self::Shipped, Self::Delivered, Self::Cancelled, Self::Returned,
    ];

    /// Transition table. Cancelled and returned are absorbing and reachable
    /// from every other status.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Processing, Cancelled, Returned],
            Confirmed => &[Processing, Cancelled, Returned],
            Processing => &[Shipped, Cancelled, Returned],
            Shipped => &[Delivered, Cancelled, Returned],
            Delivered => &[Cancelled, Returned],
            Cancelled | Returned => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { self.allowed_next().contains(&next) }
    pub fn is_customer_cancellable(&self) -> bool { matches!(self, Self::Pending | Self::Confirmed) }
    pub fn is_terminal(&self) -> bool { self.allowed_next().is_empty() }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus { #[default] Pending, Paid, Failed, Refunded, PartialRefund }

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
            Self::PartialRefund => "partial_refund",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { Card, Paypal, BankTransfer, CashOnDelivery }

/// Everything needed to place an order. Monetary totals are derived, not supplied.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: Uuid,
    pub session_id: SessionId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub payment_method: PaymentMethod,
    pub charges: Charges,
    pub currency: String,
    pub notes: Option<String>,
    pub estimated_delivery: DateTime<Utc>,
}

impl Order {
    pub fn place(new: NewOrder) -> Result<Self, OrderError> {
        if new.items.is_empty() { return Err(OrderError::NoItems); }
        if new.items.iter().any(|i| i.quantity == 0) { return Err(OrderError::InvalidQuantity); }
        if new.items.iter().any(|i| i.price.is_sign_negative())
            || new.charges.shipping_cost.is_sign_negative()
            || new.charges.tax.is_sign_negative()
            || new.charges.discount.is_sign_negative()
        {
            return Err(OrderError::NegativeAmount);
        }
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(), order_number: new.order_number, user_id: new.user_id, session_id: new.session_id,
            items: new.items, shipping_address: new.shipping_address, billing_address: new.billing_address,
            payment_method: new.payment_method, payment_status: PaymentStatus::Pending, status: OrderStatus::Pending,
            subtotal: Decimal::ZERO, shipping_cost: new.charges.shipping_cost, tax: new.charges.tax,
            discount: new.charges.discount, total_amount: Decimal::ZERO, currency: new.currency, notes: new.notes,
            tracking_number: None, estimated_delivery: new.estimated_delivery, delivered_at: None,
            status_history: vec![StatusEntry { status: OrderStatus::Pending, timestamp: now, note: Some("Order created".into()) }],
            version: 0, created_at: now, updated_at: now, events: vec![],
        };
        order.recalculate();
        order.raise_event(DomainEvent::Order(OrderEvent::Placed {
            order_number: order.order_number.clone(), user_id: order.user_id, total: order.total_amount, at: now,
        }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &OrderNumber { &self.order_number }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn session_id(&self) -> &SessionId { &self.session_id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn shipping_address(&self) -> &Address { &self.shipping_address }
    pub fn billing_address(&self) -> Option<&Address> { self.billing_address.as_ref() }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn subtotal(&self) -> Decimal { self.subtotal }
    pub fn shipping_cost(&self) -> Decimal { self.shipping_cost }
    pub fn tax(&self) -> Decimal { self.tax }
    pub fn discount(&self) -> Decimal { self.discount }
    pub fn total_amount(&self) -> Decimal { self.total_amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn notes(&self) -> Option<&str> { self.notes.as_deref() }
    pub fn tracking_number(&self) -> Option<&str> { self.tracking_number.as_deref() }
    pub fn estimated_delivery(&self) -> DateTime<Utc> { self.estimated_delivery }
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> { self.delivered_at }
    pub fn status_history(&self) -> &[StatusEntry] { &self.status_history }
    pub fn version(&self) -> i64 { self.version }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves the order to `next` if the transition table allows it.
    pub fn transition(&mut self, next: OrderStatus, note: Option<String>) -> Result<(), OrderError> {
        let from = self.status;
        if !from.can_transition_to(next) { return Err(OrderError::InvalidTransition { from, to: next }); }
        let now = Utc::now();
        self.status = next;
        if next == OrderStatus::Delivered { self.delivered_at = Some(now); }
        self.status_history.push(StatusEntry { status: next, timestamp: now, note });
        self.updated_at = now;
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged {
            order_number: self.order_number.clone(), from, to: next, at: now,
        }));
        Ok(())
    }

    /// Customer-initiated cancellation, only before processing starts.
    pub fn cancel(&mut self, reason: Option<String>) -> Result<(), OrderError> {
        if !self.status.is_customer_cancellable() {
            return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Cancelled });
        }
        let note = reason.filter(|r| !r.trim().is_empty()).unwrap_or_else(|| "Cancelled by customer".to_string());
        self.transition(OrderStatus::Cancelled, Some(note))
    }

    pub fn set_payment_status(&mut self, next: PaymentStatus) {
        let from = self.payment_status;
        if from == next { return; }
        self.payment_status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::PaymentStatusChanged {
            order_number: self.order_number.clone(), from, to: next,
        }));
    }

    pub fn set_tracking_number(&mut self, tracking_number: impl Into<String>) {
        self.tracking_number = Some(tracking_number.into());
        self.touch();
    }

    pub(crate) fn bump_version(&mut self) { self.version += 1; }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }

    fn recalculate(&mut self) {
        self.subtotal = self.items.iter().map(OrderItem::line_total).sum();
        self.total_amount = self.subtotal + self.shipping_cost + self.tax - self.discount;
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Order item quantity must be at least 1")]
    InvalidQuantity,
    #[error("Order amounts cannot be negative")]
    NegativeAmount,
    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
