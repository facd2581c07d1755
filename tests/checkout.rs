mod common;

use common::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use bloom_storefront::domain::aggregates::{CartStatus, OrderStatus, PaymentStatus};
use bloom_storefront::StorefrontError;

fn d(cents: i64) -> Decimal { Decimal::new(cents, 2) }

#[tokio::test]
async fn test_checkout_over_free_shipping_threshold() {
    let h = harness();
    let user = Uuid::new_v4();
    let sid = session("big-order");
    h.storefront.add_item(&sid, product(MONSTERA), 2).await.unwrap();

    let order = h.storefront.checkout(&sid, user, checkout_request()).await.unwrap();

    assert_eq!(order.subtotal(), d(12000));
    assert_eq!(order.shipping_cost(), Decimal::ZERO);
    assert_eq!(order.tax(), d(960));
    assert_eq!(order.total_amount(), d(12960));
    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.payment_status(), PaymentStatus::Pending);
    assert_eq!(order.status_history().len(), 1);
    assert_eq!(order.status_history()[0].status, OrderStatus::Pending);
    assert_eq!(order.billing_address(), Some(&address()));
    assert_eq!(order.user_id(), user);
}

#[tokio::test]
async fn test_checkout_under_threshold_pays_shipping() {
    let h = harness();
    let sid = session("small-order");
    h.storefront.add_item(&sid, product(SUCCULENTS), 1).await.unwrap();

    let order = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap();

    assert_eq!(order.shipping_cost(), d(999));
    assert_eq!(order.tax(), d(240));
    assert_eq!(order.total_amount(), d(3239));
}

#[tokio::test]
async fn test_checkout_converts_and_empties_cart() {
    let h = harness();
    let sid = session("convert-me");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.storefront.add_item(&sid, product(MONSTERA), 1).await.unwrap();

    let order = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap();
    assert_eq!(order.items().len(), 2);
    assert_eq!(h.store.order_count().await, 1);

    let cart = h.storefront.find_or_create_cart(&sid, None).await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(cart.total_amount(), Decimal::ZERO);
    assert_eq!(cart.status(), CartStatus::Converted);
}

#[tokio::test]
async fn test_checkout_snapshots_product_description() {
    let h = harness();
    let sid = session("describe");
    h.storefront.add_item(&sid, product(MONSTERA), 1).await.unwrap();

    let order = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap();
    let item = &order.items()[0];
    assert_eq!(item.product.known(), Some(product(MONSTERA)));
    assert!(item.product_snapshot.description.is_some());
}

#[tokio::test]
async fn test_empty_cart_checkout_creates_no_order() {
    let h = harness();
    let sid = session("empty");
    h.storefront.find_or_create_cart(&sid, None).await.unwrap();

    let err = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::EmptyCart));
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_missing_cart_checkout_is_not_found() {
    let h = harness();
    let err = h.storefront.checkout(&session("nobody"), Uuid::new_v4(), checkout_request()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::CartNotFound));
}

#[tokio::test]
async fn test_out_of_stock_checkout_leaves_cart_untouched() {
    let h = harness();
    let sid = session("sold-out");
    h.storefront.add_item(&sid, product(MONSTERA), 2).await.unwrap();
    let before = h.storefront.find_or_create_cart(&sid, None).await.unwrap();
    assert!(h.catalog.set_in_stock(product(MONSTERA), false).await);

    let err = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap_err();
    match err {
        StorefrontError::ItemsUnavailable(names) => assert_eq!(names, vec!["Monstera Deliciosa".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }

    let after = h.storefront.find_or_create_cart(&sid, None).await.unwrap();
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(after.version(), before.version());
    assert_eq!(after.total_items(), 2);
    assert_eq!(after.status(), CartStatus::Active);
}

#[tokio::test]
async fn test_deleted_product_blocks_checkout() {
    let h = harness();
    let sid = session("gone");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.catalog.remove(product(RED_ROSES)).await.unwrap();

    let err = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::ItemsUnavailable(_)));
}

#[tokio::test]
async fn test_invalid_address_is_rejected() {
    let h = harness();
    let sid = session("bad-address");
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    let mut request = checkout_request();
    request.shipping_address.city = String::new();

    let err = h.storefront.checkout(&sid, Uuid::new_v4(), request).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_checkouts_place_one_order() {
    let h = harness();
    let sid = session("double-click");
    let user = Uuid::new_v4();
    h.storefront.add_item(&sid, product(MONSTERA), 1).await.unwrap();

    let (a, b) = tokio::join!(
        h.storefront.checkout(&sid, user, checkout_request()),
        h.storefront.checkout(&sid, user, checkout_request()),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let failure = a.err().or(b.err()).unwrap();
    assert!(matches!(failure, StorefrontError::EmptyCart));
    assert_eq!(h.store.order_count().await, 1);
}

#[tokio::test]
async fn test_other_users_cart_is_hidden() {
    let h = harness();
    let sid = session("owned");
    let owner = Uuid::new_v4();
    h.storefront.merge_carts(&session("guest"), &sid, owner).await.unwrap();
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();

    let err = h.storefront.checkout(&sid, Uuid::new_v4(), checkout_request()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::CartNotFound));
}

#[tokio::test]
async fn test_preview_does_not_mutate() {
    let h = harness();
    let sid = session("peek");
    let user = Uuid::new_v4();
    h.storefront.add_item(&sid, product(SUCCULENTS), 1).await.unwrap();
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.catalog.set_in_stock(product(RED_ROSES), false).await;
    let before = h.storefront.find_or_create_cart(&sid, None).await.unwrap();

    let preview = h.storefront.preview_checkout(&sid, user).await.unwrap();
    assert!(!preview.can_checkout);
    assert_eq!(preview.unavailable_items, vec!["Red Rose Bouquet".to_string()]);
    assert_eq!(preview.quote.subtotal, d(6999));

    let after = h.storefront.find_or_create_cart(&sid, None).await.unwrap();
    assert_eq!(after.version(), before.version());
    assert_eq!(h.store.order_count().await, 0);
}
