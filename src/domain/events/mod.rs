//! Domain events
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::{OrderNumber, SessionId};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DomainEvent {
    Cart(CartEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// Subject suffix the event is published under.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Cart(CartEvent::Converted { .. }) => "cart.converted",
            Self::Cart(CartEvent::Merged { .. }) => "cart.merged",
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
            Self::Order(OrderEvent::PaymentStatusChanged { .. }) => "order.payment_status_changed",
            Self::Order(OrderEvent::Deleted { .. }) => "order.deleted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartEvent {
    Converted { session_id: SessionId, order_number: OrderNumber },
    Merged { source_session_id: SessionId, target_session_id: SessionId, items_moved: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_number: OrderNumber, user_id: Uuid, total: Decimal, at: DateTime<Utc> },
    StatusChanged { order_number: OrderNumber, from: OrderStatus, to: OrderStatus, at: DateTime<Utc> },
    PaymentStatusChanged { order_number: OrderNumber, from: PaymentStatus, to: PaymentStatus },
    Deleted { order_number: OrderNumber },
}
