//! Catalog product as seen by the cart and checkout

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{ProductId, ProductSnapshot};

/// A sellable item owned by the catalog. Carts and orders copy what they need.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub in_stock: bool,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self { id, name: name.into(), price, image: None, category: None, description: None, in_stock: true }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = Some(category.into()); self }
    pub fn with_image(mut self, image: impl Into<String>) -> Self { self.image = Some(image.into()); self }
    pub fn with_description(mut self, description: impl Into<String>) -> Self { self.description = Some(description.into()); self }
    pub fn out_of_stock(mut self) -> Self { self.in_stock = false; self }

    pub fn is_in_stock(&self) -> bool { self.in_stock }

    /// Display data for a cart line.
    pub fn cart_snapshot(&self) -> ProductSnapshot {
        ProductSnapshot { name: self.name.clone(), image: self.image.clone(), category: self.category.clone(), description: None }
    }
}
