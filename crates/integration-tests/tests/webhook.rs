//! Stripe webhook reconciliation tests.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use spice_store_core::{OrderStatus, PaymentStatus, SessionId, TransactionStatus};
use spice_store_integration_tests::TestContext;
use spice_store_storefront::db::{
    Collection, DocumentStore, Filter, OrderRepository, PaymentTransactionRepository,
};
use spice_store_storefront::models::PaymentTransaction;

const PAYLOAD: &str = r#"{"type":"checkout.session.completed"}"#;
const SIGNATURE: &str = "t=1700000000,v1=deadbeef";

async fn checkout(ctx: &TestContext) {
    let body = json!({
        "items": [{"product_id": "p1", "quantity": 2, "price": 10.0}],
        "customer_email": "a@b.com",
        "origin_url": "https://shop.test"
    });
    let (status, _) = ctx.post_json("/api/checkout/session", &body).await;
    assert_eq!(status, StatusCode::OK);
}

async fn transaction(ctx: &TestContext) -> PaymentTransaction {
    PaymentTransactionRepository::new(ctx.store.as_ref())
        .get_by_session_id(&SessionId::new("cs_test_1"))
        .await
        .unwrap()
        .unwrap()
}

async fn order_status(ctx: &TestContext, tx: &PaymentTransaction) -> OrderStatus {
    OrderRepository::new(ctx.store.as_ref())
        .get_by_id(&tx.order_id)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn test_paid_webhook_marks_order_paid() {
    let ctx = TestContext::new();
    checkout(&ctx).await;
    ctx.gateway().accept_webhook("cs_test_1", PaymentStatus::Paid);

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let tx = transaction(&ctx).await;
    assert_eq!(tx.payment_status, PaymentStatus::Paid);
    assert_eq!(tx.status, TransactionStatus::Completed);
    assert!(tx.updated_at >= tx.created_at);
    assert_eq!(order_status(&ctx, &tx).await, OrderStatus::Paid);

    // Later polls are served locally.
    let (_, polled) = ctx.get("/api/checkout/status/cs_test_1").await;
    assert_eq!(polled["payment_status"], "paid");
    assert_eq!(ctx.gateway().polls(), 0);
}

#[tokio::test]
async fn test_failed_webhook_marks_transaction_failed() {
    let ctx = TestContext::new();
    checkout(&ctx).await;
    ctx.gateway().accept_webhook("cs_test_1", PaymentStatus::Failed);

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    let tx = transaction(&ctx).await;
    assert_eq!(tx.payment_status, PaymentStatus::Failed);
    assert_eq!(tx.status, TransactionStatus::Failed);
    assert_eq!(order_status(&ctx, &tx).await, OrderStatus::Pending);
}

#[tokio::test]
async fn test_every_non_paid_webhook_marks_transaction_failed() {
    for payment_status in [PaymentStatus::Expired, PaymentStatus::Initiated] {
        let ctx = TestContext::new();
        checkout(&ctx).await;
        ctx.gateway().accept_webhook("cs_test_1", payment_status);

        let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success"}));

        let tx = transaction(&ctx).await;
        assert_eq!(tx.payment_status, payment_status);
        assert_eq!(tx.status, TransactionStatus::Failed, "{payment_status}");
        assert_eq!(order_status(&ctx, &tx).await, OrderStatus::Pending);
    }
}

#[tokio::test]
async fn test_webhook_for_unknown_session_is_noop() {
    let ctx = TestContext::new();
    checkout(&ctx).await;
    let before = transaction(&ctx).await;
    ctx.gateway().accept_webhook("cs_other", PaymentStatus::Paid);

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));

    assert_eq!(transaction(&ctx).await, before);
    let store = ctx.store.as_ref();
    assert_eq!(
        store
            .count(Collection::PaymentTransactions, &Filter::all())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_unrelated_event_acknowledged() {
    let ctx = TestContext::new();
    checkout(&ctx).await;
    let before = transaction(&ctx).await;
    ctx.gateway().accept_unrelated_webhook();

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success"}));
    assert_eq!(transaction(&ctx).await, before);
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let ctx = TestContext::new();
    checkout(&ctx).await;

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Webhook processing failed"}));

    ctx.gateway().accept_webhook("cs_test_1", PaymentStatus::Paid);
    let (status, _) = ctx.post_webhook(PAYLOAD, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let tx = transaction(&ctx).await;
    assert_eq!(tx.payment_status, PaymentStatus::Initiated);
}

#[tokio::test]
async fn test_webhook_not_configured() {
    let ctx = TestContext::without_gateway();

    let (status, body) = ctx.post_webhook(PAYLOAD, Some(SIGNATURE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"detail": "Payment system not configured"}));
}
