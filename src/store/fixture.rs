//! Catalog backed by a fixed product list, for local runs and tests.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Catalog;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::ProductId;
use crate::Result;

#[derive(Debug, Default)]
pub struct FixtureCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl FixtureCatalog {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self { products: RwLock::new(products.into_iter().map(|p| (p.id, p)).collect()) }
    }

    /// Reads a JSON array of products.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog fixture {}", path.display()))?;
        let products: Vec<Product> = serde_json::from_str(&content)
            .context("Failed to parse catalog fixture JSON")?;
        Ok(Self::new(products))
    }

    /// A small built-in plant shop catalog.
    pub fn sample() -> Self {
        let product = |n: u128, name: &str, cents: i64, category: &str| {
            Product::new(ProductId::new(Uuid::from_u128(n)), name, Decimal::new(cents, 2))
                .with_category(category)
                .with_image(format!("/images/products/{n}.jpg"))
        };
        Self::new([
            product(1, "Red Rose Bouquet", 4999, "Bouquets").with_description("A dozen long-stem red roses"),
            product(2, "Sunflower Bunch", 2499, "Bouquets"),
            product(3, "Monstera Deliciosa", 6000, "Indoor Plants").with_description("Split-leaf philodendron in a 10\" pot"),
            product(4, "Snake Plant", 3500, "Indoor Plants"),
            product(5, "Succulent Trio", 2000, "Succulents"),
            product(6, "Orchid Phalaenopsis", 4500, "Indoor Plants").out_of_stock(),
        ])
    }

    pub async fn upsert(&self, product: Product) {
        self.products.write().await.insert(product.id, product);
    }

    pub async fn remove(&self, id: ProductId) -> Option<Product> {
        self.products.write().await.remove(&id)
    }

    pub async fn set_in_stock(&self, id: ProductId, in_stock: bool) -> bool {
        match self.products.write().await.get_mut(&id) {
            Some(product) => { product.in_stock = in_stock; true }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for FixtureCatalog {
    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}
