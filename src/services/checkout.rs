use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{CartView, Storefront};
use crate::domain::aggregates::{Cart, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod, Product};
use crate::domain::pricing::Quote;
use crate::domain::value_objects::{Address, OrderNumber, ProductId, ProductSnapshot, SessionId};
use crate::retry::retry_on_conflict;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug)]
pub struct CheckoutRequest {
    pub shipping_address: Address,
    pub billing_address: Option<Address>,
    pub same_as_billing: bool,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Pricing and availability of a cart, computed without touching it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreview {
    pub cart: CartView,
    #[serde(flatten)]
    pub quote: Quote,
    pub unavailable_items: Vec<String>,
    pub can_checkout: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_number: OrderNumber,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub estimated_delivery: DateTime<Utc>,
}

impl From<&Order> for CheckoutReceipt {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number().clone(),
            total_amount: order.total_amount(),
            status: order.status(),
            estimated_delivery: order.estimated_delivery(),
        }
    }
}

/// Names of cart lines whose product is gone or out of stock.
fn unavailable_items(cart: &Cart, products: &HashMap<ProductId, Product>) -> Vec<String> {
    cart.items()
        .iter()
        .filter(|item| !products.get(&item.product_id).is_some_and(Product::is_in_stock))
        .map(|item| item.product_snapshot.name.clone())
        .collect()
}

fn order_items(cart: &Cart, products: &HashMap<ProductId, Product>) -> Vec<OrderItem> {
    cart.items()
        .iter()
        .map(|item| OrderItem {
            product: item.product_id.into(),
            quantity: item.quantity,
            price: item.price,
            product_snapshot: ProductSnapshot {
                description: products.get(&item.product_id).and_then(|p| p.description.clone()),
                ..item.product_snapshot.clone()
            },
        })
        .collect()
}

impl Storefront {
    async fn owned_cart(&self, session_id: &SessionId, user_id: Uuid) -> Result<Cart> {
        match self.carts.find_by_session(session_id).await? {
            Some(cart) if cart.is_accessible_to(user_id) => Ok(cart),
            _ => Err(StorefrontError::CartNotFound),
        }
    }

    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn preview_checkout(&self, session_id: &SessionId, user_id: Uuid) -> Result<CheckoutPreview> {
        let cart = self.owned_cart(session_id, user_id).await?;
        let products = self.live_products(&cart).await?;
        let unavailable_items = unavailable_items(&cart, &products);
        Ok(CheckoutPreview {
            quote: self.settings.pricing.quote(cart.total_amount()),
            can_checkout: !cart.is_empty() && unavailable_items.is_empty(),
            unavailable_items,
            cart: CartView::new(&cart, &products),
        })
    }

    /// Turns the session's cart into an order.
    ///
    /// The order insert and the cart conversion are one write guarded by the
    /// cart version, so a cart can be checked out at most once.
    #[instrument(skip(self, request), fields(session = %session_id, %user_id))]
    pub async fn checkout(&self, session_id: &SessionId, user_id: Uuid, request: CheckoutRequest) -> Result<Order> {
        request.shipping_address.validate()?;
        let billing_address = if request.same_as_billing {
            Some(request.shipping_address.clone())
        } else {
            request.billing_address.clone()
        };
        if let Some(billing) = &billing_address { billing.validate()?; }
        let request = &request;
        let billing_address = &billing_address;

        let (mut order, mut cart) = retry_on_conflict(&self.settings.retry, "checkout", || async move {
            let mut cart = self.owned_cart(session_id, user_id).await?;
            if cart.is_empty() { return Err(StorefrontError::EmptyCart); }

            let products = self.live_products(&cart).await?;
            let unavailable = unavailable_items(&cart, &products);
            if !unavailable.is_empty() { return Err(StorefrontError::ItemsUnavailable(unavailable)); }

            let quote = self.settings.pricing.quote(cart.total_amount());
            let order = Order::place(NewOrder {
                order_number: self.numbers.next(),
                user_id,
                session_id: session_id.clone(),
                items: order_items(&cart, &products),
                shipping_address: request.shipping_address.clone(),
                billing_address: billing_address.clone(),
                payment_method: request.payment_method,
                charges: quote.charges,
                currency: cart.currency().to_string(),
                notes: request.notes.clone().filter(|n| !n.trim().is_empty()),
                estimated_delivery: Utc::now() + self.settings.estimated_delivery,
            })?;
            cart.convert(order.order_number());
            self.orders.place(&order, &mut cart).await?;
            Ok((order, cart))
        })
        .await?;

        info!(order_number = %order.order_number(), total = %order.total_amount(), "Order placed");
        let mut events = order.take_events();
        events.extend(cart.take_events());
        self.events.publish(events).await;
        Ok(order)
    }
}
