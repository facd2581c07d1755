//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::Product;
pub use order::{NewOrder, Order, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, StatusEntry};
pub use cart::{Cart, CartError, CartItem, CartStatus};
