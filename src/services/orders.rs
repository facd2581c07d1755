use tracing::{info, instrument};
use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::OrderNumber;
use crate::retry::retry_on_conflict;
use crate::store::{OrderFilter, Page, PageRequest};
use crate::{Result, StorefrontError};

impl Storefront {
    pub async fn list_orders_for_user(&self, user_id: Uuid, page: PageRequest) -> Result<Page<Order>> {
        self.orders.list(&OrderFilter::for_user(user_id), page).await
    }

    pub async fn order_for_user(&self, user_id: Uuid, number: &OrderNumber) -> Result<Order> {
        self.orders
            .find_by_number(number)
            .await?
            .filter(|o| o.user_id() == user_id)
            .ok_or(StorefrontError::OrderNotFound)
    }

    #[instrument(skip(self), fields(order_number = %number))]
    pub async fn cancel_order(&self, user_id: Uuid, number: &OrderNumber, reason: Option<String>) -> Result<Order> {
        let reason = &reason;
        let mut order = retry_on_conflict(&self.settings.retry, "cancel_order", || async move {
            let mut order = self.order_for_user(user_id, number).await?;
            order.cancel(reason.clone())?;
            self.orders.save(&mut order).await?;
            Ok(order)
        })
        .await?;
        info!("Order cancelled by customer");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }

    pub async fn list_orders(&self, filter: &OrderFilter, page: PageRequest) -> Result<Page<Order>> {
        self.orders.list(filter, page).await
    }

    pub async fn order(&self, number: &OrderNumber) -> Result<Order> {
        self.orders.find_by_number(number).await?.ok_or(StorefrontError::OrderNotFound)
    }

    /// Admin status change, validated against the transition table.
    #[instrument(skip(self), fields(order_number = %number))]
    pub async fn update_order_status(
        &self,
        number: &OrderNumber,
        status: OrderStatus,
        note: Option<String>,
        tracking_number: Option<String>,
    ) -> Result<Order> {
        let (note, tracking_number) = (&note, &tracking_number);
        let mut order = retry_on_conflict(&self.settings.retry, "update_order_status", || async move {
            let mut order = self.order(number).await?;
            order.transition(status, note.clone())?;
            if let Some(tracking) = tracking_number.as_deref().filter(|t| !t.trim().is_empty()) {
                order.set_tracking_number(tracking);
            }
            self.orders.save(&mut order).await?;
            Ok(order)
        })
        .await?;
        info!(%status, "Order status updated");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_number = %number))]
    pub async fn update_payment_status(&self, number: &OrderNumber, payment_status: PaymentStatus) -> Result<Order> {
        let mut order = retry_on_conflict(&self.settings.retry, "update_payment_status", || async move {
            let mut order = self.order(number).await?;
            order.set_payment_status(payment_status);
            self.orders.save(&mut order).await?;
            Ok(order)
        })
        .await?;
        self.events.publish(order.take_events()).await;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_number = %number))]
    pub async fn delete_order(&self, number: &OrderNumber) -> Result<()> {
        if !self.orders.delete(number).await? { return Err(StorefrontError::OrderNotFound); }
        info!("Order deleted");
        self.events.publish(vec![DomainEvent::Order(OrderEvent::Deleted { order_number: number.clone() })]).await;
        Ok(())
    }
}
