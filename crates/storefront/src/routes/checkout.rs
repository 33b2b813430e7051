//! Checkout and payment webhook route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::{Value, json};

use spice_store_core::SessionId;

use crate::error::{AppError, CheckoutStage, Result};
use crate::payments::{CheckoutSession, CheckoutStatus};
use crate::services::CheckoutRequest;
use crate::state::AppState;

/// Header carrying Stripe's webhook signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

/// Create an order and a Stripe checkout session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>> {
    state
        .checkout()
        .create_session(request)
        .await
        .map(Json)
        .map_err(|e| AppError::checkout(CheckoutStage::CreateSession, e))
}

/// Poll the payment status of a checkout session.
pub async fn status(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<CheckoutStatus>> {
    state
        .checkout()
        .get_status(&session_id)
        .await
        .map(Json)
        .map_err(|e| AppError::checkout(CheckoutStage::Status, e))
}

/// Receive a Stripe webhook.
///
/// The body is taken raw; the signature covers its exact bytes.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    state
        .checkout()
        .handle_webhook(&body, signature)
        .await
        .map_err(|e| AppError::checkout(CheckoutStage::Webhook, e))?;

    Ok(Json(json!({ "status": "success" })))
}
