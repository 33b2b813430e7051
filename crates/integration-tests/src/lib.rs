//! Integration tests for the Spice Store.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests (in-memory store, scripted payment gateway)
//! cargo test -p spice-store-integration-tests
//!
//! # Smoke tests against a running storefront
//! STOREFRONT_BASE_URL=http://localhost:8001 \
//!     cargo test -p spice-store-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Product listing, creation and seeding
//! - `checkout` - Session creation and status polling
//! - `webhook` - Webhook reconciliation
//! - `live_server` - HTTP smoke tests against a deployed storefront

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use spice_store_core::{PaymentStatus, SessionId, SessionState};
use spice_store_storefront::db::{DocumentStore, MemoryDocumentStore};
use spice_store_storefront::models::Metadata;
use spice_store_storefront::payments::{
    CheckoutSession, CheckoutSessionRequest, CheckoutStatus, PaymentError, PaymentGateway,
    WebhookEvent,
};
use spice_store_storefront::routes::build_router;
use spice_store_storefront::state::AppState;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Payment gateway whose answers are set by the test.
///
/// Sessions are numbered `cs_test_1`, `cs_test_2`, ... in creation order.
/// Without a scripted webhook event every signature is rejected.
#[derive(Debug)]
pub struct ScriptedGateway {
    payment_status: Mutex<PaymentStatus>,
    fail_create: Mutex<bool>,
    webhook_event: Mutex<Option<WebhookEvent>>,
    sessions_created: AtomicU32,
    polls: AtomicU32,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            payment_status: Mutex::new(PaymentStatus::Initiated),
            fail_create: Mutex::new(false),
            webhook_event: Mutex::new(None),
            sessions_created: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGateway {
    /// Payment status reported by subsequent polls.
    pub fn set_payment_status(&self, status: PaymentStatus) {
        *lock(&self.payment_status) = status;
    }

    /// Make session creation fail with an API error.
    pub fn fail_session_creation(&self) {
        *lock(&self.fail_create) = true;
    }

    /// Accept the next webhooks as this event.
    pub fn accept_webhook(&self, session_id: &str, payment_status: PaymentStatus) {
        *lock(&self.webhook_event) = Some(WebhookEvent {
            event_type: "checkout.session.completed".to_string(),
            session_id: Some(SessionId::new(session_id)),
            payment_status,
        });
    }

    /// Accept the next webhooks as an event unrelated to checkout.
    pub fn accept_unrelated_webhook(&self) {
        *lock(&self.webhook_event) = Some(WebhookEvent {
            event_type: "customer.created".to_string(),
            session_id: None,
            payment_status: PaymentStatus::Initiated,
        });
    }

    /// Number of times the processor was polled.
    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    /// Session requests received so far.
    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        if *lock(&self.fail_create) {
            return Err(PaymentError::Api {
                status: 402,
                message: "card_declined".to_string(),
            });
        }

        lock(&self.requests).push(request.clone());
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CheckoutSession {
            session_id: SessionId::new(format!("cs_test_{n}")),
            url: format!("https://checkout.stripe.test/pay/cs_test_{n}"),
        })
    }

    async fn get_status(&self, _session_id: &SessionId) -> Result<CheckoutStatus, PaymentError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let payment_status = *lock(&self.payment_status);
        Ok(CheckoutStatus {
            status: if payment_status.is_paid() {
                SessionState::Complete
            } else {
                SessionState::Open
            },
            payment_status,
            amount_total: 2000,
            currency: "usd".to_string(),
            metadata: Metadata::new(),
        })
    }

    fn verify_webhook(
        &self,
        _payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, PaymentError> {
        if signature.is_none() {
            return Err(PaymentError::InvalidSignature("missing header".to_string()));
        }
        lock(&self.webhook_event)
            .clone()
            .ok_or_else(|| PaymentError::InvalidSignature("no matching signature".to_string()))
    }
}

/// A storefront router over an in-memory store.
pub struct TestContext {
    pub store: Arc<MemoryDocumentStore>,
    /// `None` when the context was built without a payment gateway.
    pub gateway: Option<Arc<ScriptedGateway>>,
    router: Router,
}

impl TestContext {
    /// Storefront with a scripted payment gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::build(Some(Arc::new(ScriptedGateway::default())))
    }

    /// Storefront with no payment credentials configured.
    #[must_use]
    pub fn without_gateway() -> Self {
        Self::build(None)
    }

    fn build(gateway: Option<Arc<ScriptedGateway>>) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            gateway
                .as_ref()
                .map(|g| Arc::clone(g) as Arc<dyn PaymentGateway>),
        );
        Self {
            store,
            gateway,
            router: build_router(state),
        }
    }

    /// The scripted gateway.
    ///
    /// # Panics
    ///
    /// Panics if the context was built without a gateway.
    #[must_use]
    pub fn gateway(&self) -> &ScriptedGateway {
        self.gateway
            .as_deref()
            .expect("context built without a payment gateway")
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::get(path).body(Body::empty()))
            .await
    }

    /// Send a POST request with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Request::post(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
        )
        .await
    }

    /// Send a POST request with a raw body and an optional Stripe signature.
    pub async fn post_webhook(&self, payload: &str, signature: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::post("/api/webhook/stripe");
        if let Some(signature) = signature {
            request = request.header("stripe-signature", signature);
        }
        self.send(request.body(Body::from(payload.to_string())))
            .await
    }

    async fn send(
        &self,
        request: Result<Request<Body>, axum::http::Error>,
    ) -> (StatusCode, Value) {
        let request = request.expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
