//! Cart, checkout and order operations over the store seams.

mod cart;
mod checkout;
mod events;
mod orders;
mod reaper;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use crate::domain::aggregates::{Cart, Product};
use crate::domain::pricing::PricingPolicy;
use crate::domain::value_objects::{OrderNumberError, OrderNumberGenerator, ProductId};
use crate::retry::RetryPolicy;
use crate::store::{CartRepository, Catalog, OrderRepository};
use crate::Result;

pub use cart::{CartLineView, CartView};
pub use checkout::{CheckoutPreview, CheckoutReceipt, CheckoutRequest};
pub use events::EventPublisher;
pub use reaper::spawn_reaper;

#[derive(Clone, Debug)]
pub struct StorefrontSettings {
    pub currency: String,
    pub pricing: PricingPolicy,
    pub cart_ttl: Duration,
    pub cart_stale_after: Duration,
    pub estimated_delivery: Duration,
    pub order_number_prefix: String,
    pub retry: RetryPolicy,
}

impl Default for StorefrontSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            pricing: PricingPolicy::default(),
            cart_ttl: Duration::days(30),
            cart_stale_after: Duration::days(30),
            estimated_delivery: Duration::days(7),
            order_number_prefix: "FL".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct Storefront {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn Catalog>,
    numbers: OrderNumberGenerator,
    settings: StorefrontSettings,
    events: EventPublisher,
}

impl Storefront {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn Catalog>,
        settings: StorefrontSettings,
        events: EventPublisher,
    ) -> std::result::Result<Self, OrderNumberError> {
        let numbers = OrderNumberGenerator::new(&settings.order_number_prefix)?;
        Ok(Self { carts, orders, catalog, numbers, settings, events })
    }

    /// Current catalog state for every product in `cart`, keyed by id.
    async fn live_products(&self, cart: &Cart) -> Result<HashMap<ProductId, Product>> {
        let ids: Vec<ProductId> = cart.items().iter().map(|i| i.product_id).collect();
        if ids.is_empty() { return Ok(HashMap::new()); }
        let products = self.catalog.products(&ids).await?;
        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }
}
