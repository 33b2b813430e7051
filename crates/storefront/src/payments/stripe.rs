//! Stripe Checkout client.
//!
//! Talks to the Stripe REST API directly with `reqwest`: form-encoded
//! requests, basic auth with the secret key.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use spice_store_core::{PaymentStatus, SessionId, SessionState};

use super::webhook;
use super::{
    CheckoutSession, CheckoutSessionRequest, CheckoutStatus, PaymentError, PaymentGateway,
    WebhookEvent,
};
use crate::config::StripeConfig;
use crate::models::Metadata;

/// Client for Stripe Checkout sessions and webhooks.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    api_key: SecretString,
    webhook_secret: Option<SecretString>,
}

/// Checkout session object as returned by Stripe.
#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base.trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                webhook_secret: config.webhook_secret.clone(),
            }),
        }
    }

    fn sessions_url(&self) -> String {
        format!("{}/v1/checkout/sessions", self.inner.api_base)
    }

    /// Decode a Stripe response, mapping non-success statuses to `PaymentError::Api`.
    async fn read_session(response: reqwest::Response) -> Result<SessionObject, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "Stripe API returned non-success status");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Stripe session"
            );
            PaymentError::Parse(e.to_string())
        })
    }
}

/// Form parameters for `POST /v1/checkout/sessions`.
fn session_form(request: &CheckoutSessionRequest) -> Result<Vec<(String, String)>, PaymentError> {
    let unit_amount = request
        .price
        .minor_units()
        .ok_or(PaymentError::AmountOutOfRange(request.price.amount))?;

    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.price.currency_code.as_str().to_string(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.description.clone(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    Ok(form)
}

/// Map Stripe's session `status` and `payment_status` onto [`PaymentStatus`].
pub(crate) fn normalize_payment_status(
    status: Option<&str>,
    payment_status: Option<&str>,
) -> PaymentStatus {
    if status == Some("expired") {
        return PaymentStatus::Expired;
    }
    match payment_status {
        Some("paid" | "no_payment_required") => PaymentStatus::Paid,
        _ => PaymentStatus::Initiated,
    }
}

fn normalize_session_state(status: Option<&str>) -> SessionState {
    match status {
        Some("complete") => SessionState::Complete,
        Some("expired") => SessionState::Expired,
        _ => SessionState::Open,
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self, request), fields(amount = %request.price.amount))]
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = session_form(request)?;

        let response = self
            .inner
            .client
            .post(self.sessions_url())
            .basic_auth(self.inner.api_key.expose_secret(), Some(""))
            .form(&form)
            .send()
            .await?;

        let session = Self::read_session(response).await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::Parse("checkout session has no url".to_string()))?;

        debug!(session_id = %session.id, "Stripe checkout session created");
        Ok(CheckoutSession {
            session_id: SessionId::new(session.id),
            url,
        })
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn get_status(&self, session_id: &SessionId) -> Result<CheckoutStatus, PaymentError> {
        let response = self
            .inner
            .client
            .get(format!("{}/{}", self.sessions_url(), session_id))
            .basic_auth(self.inner.api_key.expose_secret(), Some(""))
            .send()
            .await?;

        let session = Self::read_session(response).await?;
        let status = session.status.as_deref();

        Ok(CheckoutStatus {
            status: normalize_session_state(status),
            payment_status: normalize_payment_status(status, session.payment_status.as_deref()),
            amount_total: session.amount_total.unwrap_or_default(),
            currency: session.currency.unwrap_or_default(),
            metadata: session.metadata,
        })
    }

    fn verify_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, PaymentError> {
        let secret = self
            .inner
            .webhook_secret
            .as_ref()
            .ok_or(PaymentError::WebhookSecretMissing)?;
        let signature = signature.ok_or_else(|| {
            PaymentError::InvalidSignature("missing Stripe-Signature header".to_string())
        })?;

        webhook::verify_signature(
            payload,
            signature,
            secret.expose_secret(),
            chrono::Utc::now().timestamp(),
        )?;
        webhook::parse_event(payload)
    }
}
