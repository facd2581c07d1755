//! Bloom storefront: cart and order service
//!
//! Session carts, checkout into immutable orders, and the order status
//! lifecycle behind a small REST API.
//!
//! ## Features
//! - Session-scoped carts with snapshotted prices
//! - Atomic checkout with stock re-validation
//! - Order status state machine with an append-only history
//! - Admin order management
//! - Background reaping of stale carts

pub mod api;
pub mod config;
pub mod domain;
pub mod retry;
pub mod services;
pub mod store;

use thiserror::Error;
use crate::domain::aggregates::{CartError, OrderError};
use crate::domain::value_objects::SessionIdError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Admin access required")]
    Forbidden,

    #[error("Cart not found")]
    CartNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Some items in your cart are no longer available: {}", .0.join(", "))]
    ItemsUnavailable(Vec<String>),

    #[error("The record was modified concurrently, please retry")]
    Conflict,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorefrontError {
    pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<SessionIdError> for StorefrontError {
    fn from(e: SessionIdError) -> Self { Self::Validation(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
