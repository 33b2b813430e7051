//! Smoke tests against a running storefront.
//!
//! These tests require:
//! - A running storefront (cargo run -p spice-store-storefront)
//! - Its document store migrated (cargo run -p spice-store-cli -- migrate)
//!
//! Run with: cargo test -p spice-store-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Base URL for the storefront API (configurable via environment).
fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:8001".to_string())
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_live_health() {
    let client = Client::new();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_live_catalog_seeded() {
    let client = Client::new();
    let base_url = storefront_base_url();

    let resp = client
        .post(format!("{base_url}/api/init-products"))
        .send()
        .await
        .expect("Failed to seed products");
    assert_eq!(resp.status(), StatusCode::OK);

    let products: Value = client
        .get(format!("{base_url}/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Failed to parse products");
    assert!(!products.as_array().expect("products array").is_empty());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_live_unknown_transaction() {
    let client = Client::new();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/api/checkout/status/cs_does_not_exist"))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
