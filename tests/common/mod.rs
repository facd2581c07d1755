#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bloom_storefront::domain::aggregates::PaymentMethod;
use bloom_storefront::domain::value_objects::{Address, ProductId, SessionId};
use bloom_storefront::retry::RetryPolicy;
use bloom_storefront::services::{CheckoutRequest, EventPublisher, Storefront, StorefrontSettings};
use bloom_storefront::store::{FixtureCatalog, MemoryStore};
use uuid::Uuid;

pub const RED_ROSES: u128 = 1;
pub const MONSTERA: u128 = 3;
pub const SUCCULENTS: u128 = 5;
pub const ORCHID: u128 = 6;

pub struct Harness {
    pub storefront: Arc<Storefront>,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<FixtureCatalog>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(FixtureCatalog::sample());
    let settings = StorefrontSettings {
        retry: RetryPolicy { min_delay: Duration::from_millis(1), max_delay: Duration::from_millis(5), max_retries: 3 },
        ..StorefrontSettings::default()
    };
    let storefront = Storefront::new(store.clone(), store.clone(), catalog.clone(), settings, EventPublisher::disabled())
        .unwrap();
    Harness { storefront: Arc::new(storefront), store, catalog }
}

pub fn product(n: u128) -> ProductId { ProductId::new(Uuid::from_u128(n)) }

pub fn session(name: &str) -> SessionId { SessionId::parse(name).unwrap() }

pub fn address() -> Address {
    Address {
        full_name: "Ada Gardener".into(),
        street: "12 Fern Lane".into(),
        city: "Portland".into(),
        state: "OR".into(),
        postal_code: "97201".into(),
        phone: "555-0100".into(),
        country: "United States".into(),
    }
}

pub fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: address(),
        billing_address: None,
        same_as_billing: true,
        payment_method: PaymentMethod::Card,
        notes: None,
    }
}
