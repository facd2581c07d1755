use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::Storefront;
use crate::domain::aggregates::{Cart, CartError, CartStatus, Product};
use crate::domain::value_objects::{ProductId, ProductSnapshot, SessionId};
use crate::retry::retry_on_conflict;
use crate::{Result, StorefrontError};

/// Cart as returned to shoppers, with live catalog state next to each line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub session_id: SessionId,
    pub user_id: Option<Uuid>,
    pub status: CartStatus,
    pub items: Vec<CartLineView>,
    pub total_items: u32,
    pub total_amount: Decimal,
    pub currency: String,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub line_total: Decimal,
    pub product_snapshot: ProductSnapshot,
    pub in_stock: bool,
    pub current_price: Option<Decimal>,
}

impl CartView {
    pub fn new(cart: &Cart, products: &HashMap<ProductId, Product>) -> Self {
        let items = cart.items().iter().map(|item| {
            let live = products.get(&item.product_id);
            CartLineView {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                line_total: item.line_total(),
                product_snapshot: item.product_snapshot.clone(),
                in_stock: live.is_some_and(Product::is_in_stock),
                current_price: live.map(|p| p.price),
            }
        }).collect();
        Self {
            session_id: cart.session_id().clone(), user_id: cart.user_id(), status: cart.status(), items,
            total_items: cart.total_items(), total_amount: cart.total_amount(), currency: cart.currency().to_string(),
            expires_at: cart.expires_at(), updated_at: cart.updated_at(),
        }
    }
}

impl Storefront {
    pub fn create_session(&self) -> SessionId { SessionId::mint() }

    /// Returns the session's cart, creating an empty one on first touch.
    pub async fn find_or_create_cart(&self, session_id: &SessionId, user_id: Option<Uuid>) -> Result<Cart> {
        if let Some(cart) = self.carts.find_by_session(session_id).await? { return Ok(cart); }
        let cart = Cart::new(session_id.clone(), user_id, &self.settings.currency, self.settings.cart_ttl);
        match self.carts.insert(&cart).await {
            Ok(()) => Ok(cart),
            // Another request created it first.
            Err(StorefrontError::Conflict) => self.carts.find_by_session(session_id).await?.ok_or(StorefrontError::Conflict),
            Err(e) => Err(e),
        }
    }

    async fn existing_cart(&self, session_id: &SessionId) -> Result<Cart> {
        self.carts.find_by_session(session_id).await?.ok_or(StorefrontError::CartNotFound)
    }

    pub async fn view(&self, cart: &Cart) -> Result<CartView> {
        let products = self.live_products(cart).await?;
        Ok(CartView::new(cart, &products))
    }

    /// Loads the cart against the live catalog, dropping lines whose product no longer exists.
    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn get_cart(&self, session_id: &SessionId) -> Result<CartView> {
        retry_on_conflict(&self.settings.retry, "get_cart", || async {
            let mut cart = self.find_or_create_cart(session_id, None).await?;
            let products = self.live_products(&cart).await?;
            let dropped = cart.retain_items(|item| products.contains_key(&item.product_id));
            if dropped > 0 {
                info!(dropped, "Removed cart items for deleted products");
                self.carts.save(&mut cart).await?;
            }
            Ok(CartView::new(&cart, &products))
        })
        .await
    }

    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn add_item(&self, session_id: &SessionId, product_id: ProductId, quantity: i64) -> Result<Cart> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| StorefrontError::Validation("Quantity must be at least 1".into()))?;
        let product = self.catalog.product(product_id).await?.ok_or(StorefrontError::ProductNotFound)?;
        if !product.is_in_stock() { return Err(CartError::OutOfStock(product.name).into()); }

        retry_on_conflict(&self.settings.retry, "add_item", || async {
            let mut cart = self.find_or_create_cart(session_id, None).await?;
            cart.add_item(&product, quantity)?;
            self.carts.save(&mut cart).await?;
            Ok(cart)
        })
        .await
    }

    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn update_item_quantity(&self, session_id: &SessionId, product_id: ProductId, quantity: i64) -> Result<Cart> {
        retry_on_conflict(&self.settings.retry, "update_item_quantity", || async {
            let mut cart = self.existing_cart(session_id).await?;
            cart.update_item_quantity(product_id, quantity)?;
            self.carts.save(&mut cart).await?;
            Ok(cart)
        })
        .await
    }

    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn remove_item(&self, session_id: &SessionId, product_id: ProductId) -> Result<Cart> {
        retry_on_conflict(&self.settings.retry, "remove_item", || async {
            let mut cart = self.existing_cart(session_id).await?;
            if cart.remove_item(product_id) { self.carts.save(&mut cart).await?; }
            Ok(cart)
        })
        .await
    }

    #[instrument(skip(self), fields(session = %session_id))]
    pub async fn clear_cart(&self, session_id: &SessionId) -> Result<Cart> {
        retry_on_conflict(&self.settings.retry, "clear_cart", || async {
            let mut cart = self.existing_cart(session_id).await?;
            cart.clear();
            self.carts.save(&mut cart).await?;
            Ok(cart)
        })
        .await
    }

    /// Folds the guest cart into the user's cart and empties the guest cart.
    #[instrument(skip(self), fields(guest = %guest_session, user_session = %user_session))]
    pub async fn merge_carts(&self, guest_session: &SessionId, user_session: &SessionId, user_id: Uuid) -> Result<Cart> {
        if guest_session == user_session {
            return Err(StorefrontError::Validation("Cannot merge a cart into itself".into()));
        }
        let target = retry_on_conflict(&self.settings.retry, "merge_carts", || async {
            let mut target = self.find_or_create_cart(user_session, Some(user_id)).await?;
            // Someone else's cart is reported as missing.
            target.assign_user(user_id).map_err(|_| StorefrontError::CartNotFound)?;
            match self.carts.find_by_session(guest_session).await? {
                Some(guest) if !guest.is_accessible_to(user_id) => return Err(StorefrontError::CartNotFound),
                Some(mut guest) if !guest.is_empty() => {
                    let moved = target.merge_from(&mut guest)?;
                    self.carts.save_pair(&mut target, &mut guest).await?;
                    info!(moved, "Merged guest cart");
                }
                _ => self.carts.save(&mut target).await?,
            }
            Ok(target)
        })
        .await;
        let mut target = target?;
        self.events.publish(target.take_events()).await;
        Ok(target)
    }
}
