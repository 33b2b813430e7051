//! Payment processor integration.
//!
//! The checkout service talks to the processor only through the
//! [`PaymentGateway`] trait, which normalizes the processor's vocabulary into
//! [`PaymentStatus`] and [`SessionState`]. [`StripeClient`] is the production
//! implementation.

pub mod stripe;
pub mod webhook;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use spice_store_core::{PaymentStatus, Price, SessionId, SessionState};

use crate::models::Metadata;

pub use stripe::StripeClient;

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The processor's response could not be understood.
    #[error("parse error: {0}")]
    Parse(String),

    /// Webhook signature missing, stale or wrong.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// No webhook signing secret is configured.
    #[error("webhook signing secret not configured")]
    WebhookSecretMissing,

    /// The amount cannot be expressed in minor units.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(Decimal),
}

/// Parameters for a new checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// Total to charge.
    pub price: Price,
    /// Name shown on the processor's checkout page.
    pub description: String,
    /// Where the customer lands after paying. May contain the processor's
    /// `{CHECKOUT_SESSION_ID}` placeholder.
    pub success_url: String,
    pub cancel_url: String,
    /// Endpoint that receives the processor's webhooks for this session.
    /// Stripe registers webhook endpoints per account, so its client ignores it.
    pub webhook_url: String,
    pub metadata: Metadata,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: SessionId,
    /// Processor-hosted page to redirect the customer to.
    pub url: String,
}

/// Status of a checkout session, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutStatus {
    pub status: SessionState,
    pub payment_status: PaymentStatus,
    /// Amount in minor units (cents).
    pub amount_total: i64,
    /// Lowercase ISO 4217 code.
    pub currency: String,
    pub metadata: Metadata,
}

/// A verified, normalized webhook notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    /// Processor event type, e.g. `checkout.session.completed`.
    pub event_type: String,
    /// Session the event concerns. `None` for events that do not affect checkout.
    pub session_id: Option<SessionId>,
    pub payment_status: PaymentStatus,
}

/// Operations the checkout service needs from a payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session.
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Fetch the processor's current view of a session.
    async fn get_status(&self, session_id: &SessionId) -> Result<CheckoutStatus, PaymentError>;

    /// Verify a webhook's signature and parse it.
    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, PaymentError>;
}
