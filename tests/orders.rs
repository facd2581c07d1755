mod common;

use common::*;
use uuid::Uuid;

use bloom_storefront::domain::aggregates::{Order, OrderError, OrderStatus, PaymentStatus};
use bloom_storefront::store::{OrderFilter, PageRequest};
use bloom_storefront::StorefrontError;

async fn place_order(h: &Harness, name: &str, user: Uuid) -> Order {
    let sid = session(name);
    h.storefront.add_item(&sid, product(RED_ROSES), 1).await.unwrap();
    h.storefront.checkout(&sid, user, checkout_request()).await.unwrap()
}

#[tokio::test]
async fn test_customer_cancels_pending_order() {
    let h = harness();
    let user = Uuid::new_v4();
    let order = place_order(&h, "cancel-me", user).await;

    let cancelled = h.storefront.cancel_order(user, order.order_number(), Some("Changed my mind".into())).await.unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);
    assert_eq!(cancelled.status_history().len(), 2);
    assert_eq!(cancelled.status_history()[1].note.as_deref(), Some("Changed my mind"));
}

#[tokio::test]
async fn test_cancel_after_shipping_is_rejected() {
    let h = harness();
    let user = Uuid::new_v4();
    let order = place_order(&h, "shipped", user).await;
    let number = order.order_number();
    h.storefront.update_order_status(number, OrderStatus::Processing, None, None).await.unwrap();
    let shipped = h.storefront
        .update_order_status(number, OrderStatus::Shipped, Some("Left the depot".into()), Some("1Z999".into()))
        .await
        .unwrap();
    assert_eq!(shipped.tracking_number(), Some("1Z999"));

    let err = h.storefront.cancel_order(user, number, None).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Order(OrderError::InvalidTransition { .. })));
    assert_eq!(h.storefront.order(number).await.unwrap().status_history().len(), 3);
}

#[tokio::test]
async fn test_delivery_sets_timestamp() {
    let h = harness();
    let order = place_order(&h, "deliver", Uuid::new_v4()).await;
    let number = order.order_number();
    for status in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        h.storefront.update_order_status(number, status, None, None).await.unwrap();
    }
    let delivered = h.storefront.order(number).await.unwrap();
    assert!(delivered.delivered_at().is_some());
    assert_eq!(delivered.status_history().len(), 5);

    let err = h.storefront.update_order_status(number, OrderStatus::Pending, None, None).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Order(_)));
}

#[tokio::test]
async fn test_orders_are_private_to_their_user() {
    let h = harness();
    let owner = Uuid::new_v4();
    let order = place_order(&h, "private", owner).await;

    let err = h.storefront.order_for_user(Uuid::new_v4(), order.order_number()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::OrderNotFound));
    let err = h.storefront.cancel_order(Uuid::new_v4(), order.order_number(), None).await.unwrap_err();
    assert!(matches!(err, StorefrontError::OrderNotFound));
}

#[tokio::test]
async fn test_order_history_paginates() {
    let h = harness();
    let user = Uuid::new_v4();
    for n in 0..3 {
        place_order(&h, &format!("history-{n}"), user).await;
    }
    place_order(&h, "someone-else", Uuid::new_v4()).await;

    let page = h.storefront.list_orders_for_user(user, PageRequest::new(Some(1), Some(2))).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 2);
    assert!(page.data[0].created_at() >= page.data[1].created_at());
}

#[tokio::test]
async fn test_admin_filters_and_payment() {
    let h = harness();
    let first = place_order(&h, "pay-1", Uuid::new_v4()).await;
    place_order(&h, "pay-2", Uuid::new_v4()).await;

    let paid = h.storefront.update_payment_status(first.order_number(), PaymentStatus::Paid).await.unwrap();
    assert_eq!(paid.payment_status(), PaymentStatus::Paid);
    assert_eq!(paid.status(), OrderStatus::Pending);

    let filter = OrderFilter { payment_status: Some(PaymentStatus::Paid), ..OrderFilter::default() };
    let page = h.storefront.list_orders(&filter, PageRequest::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].order_number(), first.order_number());
}

#[tokio::test]
async fn test_admin_delete() {
    let h = harness();
    let order = place_order(&h, "delete-me", Uuid::new_v4()).await;

    h.storefront.delete_order(order.order_number()).await.unwrap();
    assert_eq!(h.store.order_count().await, 0);
    let err = h.storefront.delete_order(order.order_number()).await.unwrap_err();
    assert!(matches!(err, StorefrontError::OrderNotFound));
}
