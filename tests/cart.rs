mod common;

use chrono::{Duration, Utc};
use common::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use bloom_storefront::domain::aggregates::{Cart, CartError, CartStatus};
use bloom_storefront::store::CartRepository;
use bloom_storefront::StorefrontError;

#[tokio::test]
async fn test_get_cart_creates_empty_cart() {
    let h = harness();
    let view = h.storefront.get_cart(&session("fresh")).await.unwrap();
    assert!(view.items.is_empty());
    assert_eq!(view.total_items, 0);
    assert_eq!(view.currency, "USD");
    assert_eq!(view.status, CartStatus::Active);
}

#[tokio::test]
async fn test_adding_same_product_merges_lines() {
    let h = harness();
    let sid = session("roses");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    let cart = h.storefront.add_item(&sid, product(RED_ROSES), 2).await.unwrap();

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total_items(), 3);
    assert_eq!(cart.total_amount(), Decimal::new(14997, 2));
}

#[tokio::test]
async fn test_add_rejects_bad_input() {
    let h = harness();
    let sid = session("bad-add");

    let err = h.storefront.add_item(&sid, product(RED_ROSES), 0).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));

    let err = h.storefront.add_item(&sid, product(999), 1).await.unwrap_err();
    assert!(matches!(err, StorefrontError::ProductNotFound));

    let err = h.storefront.add_item(&sid, product(ORCHID), 1).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Cart(CartError::OutOfStock(_))));
}

#[tokio::test]
async fn test_zero_quantity_removes_only_that_item() {
    let h = harness();
    let sid = session("trim");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.storefront.add_item(&sid, product(SUCCULENTS), 2).await.unwrap();

    let cart = h.storefront.update_item_quantity(&sid, product(RED_ROSES), 0).await.unwrap();
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.total_items(), 2);
    assert_eq!(cart.total_amount(), Decimal::new(4000, 2));
}

#[tokio::test]
async fn test_update_missing_item_is_not_found() {
    let h = harness();
    let sid = session("missing-line");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();

    let err = h.storefront.update_item_quantity(&sid, product(MONSTERA), 3).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Cart(CartError::ItemNotFound)));

    let err = h.storefront.clear_cart(&session("never-made")).await.unwrap_err();
    assert!(matches!(err, StorefrontError::CartNotFound));
}

#[tokio::test]
async fn test_price_captured_at_add_time() {
    let h = harness();
    let sid = session("price-lock");
    h.storefront.add_item(&sid, product(SUCCULENTS), 1).await.unwrap();
    let mut repriced = h.catalog.remove(product(SUCCULENTS)).await.unwrap();
    repriced.price = Decimal::new(2500, 2);
    h.catalog.upsert(repriced).await;

    let view = h.storefront.get_cart(&sid).await.unwrap();
    assert_eq!(view.items[0].price, Decimal::new(2000, 2));
    assert_eq!(view.items[0].current_price, Some(Decimal::new(2500, 2)));
    assert_eq!(view.total_amount, Decimal::new(2000, 2));
}

#[tokio::test]
async fn test_get_cart_prunes_deleted_products() {
    let h = harness();
    let sid = session("prune");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.storefront.add_item(&sid, product(MONSTERA), 1).await.unwrap();
    h.catalog.remove(product(RED_ROSES)).await;

    let view = h.storefront.get_cart(&sid).await.unwrap();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.total_amount, Decimal::new(6000, 2));
}

#[tokio::test]
async fn test_merge_moves_guest_items() {
    let h = harness();
    let guest = session("guest-1");
    let mine = session("user-1");
    let user = Uuid::new_v4();
    h.storefront.add_item(&guest, product(RED_ROSES), 1).await.unwrap();
    h.storefront.add_item(&guest, product(SUCCULENTS), 1).await.unwrap();
    h.storefront.add_item(&mine, product(RED_ROSES), 2).await.unwrap();

    let merged = h.storefront.merge_carts(&guest, &mine, user).await.unwrap();
    assert_eq!(merged.user_id(), Some(user));
    assert_eq!(merged.items().len(), 2);
    assert_eq!(merged.total_items(), 4);

    let emptied = h.storefront.find_or_create_cart(&guest, None).await.unwrap();
    assert!(emptied.is_empty());

    let err = h.storefront.merge_carts(&mine, &mine, user).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
}

#[tokio::test]
async fn test_reaper_deletes_stale_carts_only() {
    let h = harness();
    h.storefront.add_item(&session("old"), product(RED_ROSES), 1).await.unwrap();

    assert_eq!(h.storefront.reap_carts().await.unwrap(), 0);
    let deleted = h.storefront.reap_carts_at(Utc::now() + Duration::days(31)).await.unwrap();
    assert_eq!(deleted, 1);

    let view = h.storefront.get_cart(&session("old")).await.unwrap();
    assert!(view.items.is_empty());
}

#[tokio::test]
async fn test_merge_refuses_carts_owned_by_someone_else() {
    let h = harness();
    let (owner, intruder) = (Uuid::new_v4(), Uuid::new_v4());
    let owned = session("owned-cart");
    let guest = session("intruder-guest");
    h.storefront.add_item(&owned, product(MONSTERA), 1).await.unwrap();
    h.storefront.merge_carts(&session("owner-guest"), &owned, owner).await.unwrap();
    h.storefront.add_item(&guest, product(RED_ROSES), 2).await.unwrap();

    // Taking over the owned cart as the merge target.
    let err = h.storefront.merge_carts(&guest, &owned, intruder).await.unwrap_err();
    assert!(matches!(err, StorefrontError::CartNotFound));
    // Draining the owned cart as the merge source.
    let err = h.storefront.merge_carts(&owned, &guest, intruder).await.unwrap_err();
    assert!(matches!(err, StorefrontError::CartNotFound));

    let cart = h.store.find_by_session(&owned).await.unwrap().unwrap();
    assert_eq!(cart.user_id(), Some(owner));
    assert_eq!(cart.total_items(), 1);
    let cart = h.store.find_by_session(&guest).await.unwrap().unwrap();
    assert_eq!(cart.user_id(), None);
    assert_eq!(cart.total_items(), 2);
}

fn stored_cart(session_id: &str, status: &str, updated_days_ago: i64) -> Cart {
    let now = Utc::now();
    serde_json::from_value(serde_json::json!({
        "sessionId": session_id,
        "userId": null,
        "items": [],
        "totalItems": 0,
        "totalAmount": "0",
        "currency": "USD",
        "status": status,
        "version": 3,
        "expiresAt": now + Duration::days(20),
        "createdAt": now - Duration::days(updated_days_ago),
        "updatedAt": now - Duration::days(updated_days_ago),
    }))
    .unwrap()
}

#[tokio::test]
async fn test_reaper_deletes_abandoned_expired_and_idle_carts() {
    let h = harness();
    for cart in [
        stored_cart("abandoned-cart", "abandoned", 0),
        stored_cart("expired-cart", "expired", 0),
        stored_cart("idle-cart", "active", 31),
        stored_cart("fresh-cart", "active", 1),
        stored_cart("converted-cart", "converted", 2),
    ] {
        h.store.insert(&cart).await.unwrap();
    }

    assert_eq!(h.storefront.reap_carts().await.unwrap(), 3);
    for gone in ["abandoned-cart", "expired-cart", "idle-cart"] {
        assert!(h.store.find_by_session(&session(gone)).await.unwrap().is_none(), "{gone} survived");
    }
    for kept in ["fresh-cart", "converted-cart"] {
        assert!(h.store.find_by_session(&session(kept)).await.unwrap().is_some(), "{kept} was reaped");
    }
}
