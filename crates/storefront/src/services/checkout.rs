//! Checkout orchestration.
//!
//! Keeps `Order.status` and `PaymentTransaction.payment_status` in line with
//! the payment processor across three entry points:
//!
//! - [`CheckoutService::create_session`] - order, processor session, transaction
//! - [`CheckoutService::get_status`] - poll the processor and reconcile
//! - [`CheckoutService::handle_webhook`] - apply a pushed processor event
//!
//! Each step is its own write. Nothing is rolled back on partial failure, and
//! concurrent polls and webhooks for one session race with last-write-wins.
//!
//! Poll and webhook differ on non-paid outcomes: a poll leaves the local
//! `status` as it was, a webhook sets it to `failed`.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use spice_store_core::{
    CurrencyCode, Email, OrderStatus, PaymentStatus, Price, SessionId, SessionState,
    TransactionStatus,
};

use crate::db::{DocumentStore, OrderRepository, PaymentTransactionRepository, RepositoryError};
use crate::error::add_breadcrumb;
use crate::models::{CartItem, Metadata, Order, PaymentTransaction};
use crate::payments::{
    CheckoutSession, CheckoutSessionRequest, CheckoutStatus, PaymentError, PaymentGateway,
    WebhookEvent,
};

/// Tag identifying orders from this store in processor metadata.
pub const METADATA_SOURCE: &str = "spice_store";

const LINE_ITEM_NAME: &str = "Spice Store order";

/// Errors from checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No payment processor credentials are configured.
    #[error("payment system not configured")]
    NotConfigured,

    /// The cart total does not fit in a decimal.
    #[error("cart total overflows")]
    TotalOverflow,

    /// No transaction exists for the session.
    #[error("transaction not found for session {0}")]
    TransactionNotFound(SessionId),

    /// The payment processor call failed.
    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    /// A store operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A checkout request as submitted by the client.
///
/// `customer_email` must be a syntactically valid address; a body with an
/// address that fails [`Email::parse`] is rejected during deserialization
/// (422) before any order is written.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
    pub customer_email: Email,
    /// Origin of the storefront, used to build the callback URLs.
    pub origin_url: String,
}

/// Orchestrates orders, payment sessions and status reconciliation.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn DocumentStore>,
    gateway: Option<Arc<dyn PaymentGateway>>,
}

impl CheckoutService {
    /// Create a checkout service. `gateway = None` disables every operation.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self { store, gateway }
    }

    /// Whether a payment gateway is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.gateway.is_some()
    }

    fn gateway(&self) -> Result<&dyn PaymentGateway, CheckoutError> {
        self.gateway.as_deref().ok_or(CheckoutError::NotConfigured)
    }

    fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(self.store.as_ref())
    }

    fn transactions(&self) -> PaymentTransactionRepository<'_> {
        PaymentTransactionRepository::new(self.store.as_ref())
    }

    /// Create an order and a processor checkout session for it.
    ///
    /// Item prices are taken as supplied. Writes made before a failure are
    /// left in place.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotConfigured` before touching storage if no
    /// gateway is configured, or the first store or processor failure.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let gateway = self.gateway()?;
        let CheckoutRequest {
            items,
            customer_email,
            origin_url,
        } = request;

        let order =
            Order::pending(customer_email.clone(), items).ok_or(CheckoutError::TotalOverflow)?;
        self.orders().insert(&order).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order created");

        let urls = CallbackUrls::new(&origin_url);
        let metadata = Metadata::from([
            ("order_id".to_string(), order.id.to_string()),
            ("customer_email".to_string(), customer_email.to_string()),
            ("source".to_string(), METADATA_SOURCE.to_string()),
        ]);

        let session = gateway
            .create_session(&CheckoutSessionRequest {
                price: Price::new(order.total_amount, CurrencyCode::USD),
                description: LINE_ITEM_NAME.to_string(),
                success_url: urls.success,
                cancel_url: urls.cancel,
                webhook_url: urls.webhook,
                metadata: metadata.clone(),
            })
            .await?;

        let transaction = PaymentTransaction::initiated(
            session.session_id.clone(),
            order.id.clone(),
            order.total_amount,
            customer_email,
            metadata,
        );
        self.transactions().insert(&transaction).await?;

        if !self
            .orders()
            .set_session_id(&order.id, &session.session_id)
            .await?
        {
            warn!(order_id = %order.id, "Order vanished before session could be attached");
        }

        add_breadcrumb(
            "checkout",
            "Checkout session created",
            Some(&[
                ("order_id", order.id.as_str()),
                ("session_id", session.session_id.as_str()),
            ]),
        );
        info!(order_id = %order.id, session_id = %session.session_id, "Checkout session created");

        Ok(session)
    }

    /// Current status of a checkout session, reconciling local records with
    /// the processor.
    ///
    /// Once the local transaction is paid the processor is not asked again and
    /// nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::TransactionNotFound` for an unknown session, or
    /// the first store or processor failure.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn get_status(&self, session_id: &SessionId) -> Result<CheckoutStatus, CheckoutError> {
        let gateway = self.gateway()?;

        let transaction = self
            .transactions()
            .get_by_session_id(session_id)
            .await?
            .ok_or_else(|| CheckoutError::TransactionNotFound(session_id.clone()))?;

        if transaction.payment_status.is_paid() {
            return settled_view(&transaction);
        }

        let remote = gateway.get_status(session_id).await?;

        if remote.payment_status != transaction.payment_status {
            let paid = remote.payment_status.is_paid();
            let status = if paid {
                TransactionStatus::Completed
            } else {
                transaction.status
            };

            self.transactions()
                .update_status(session_id, remote.payment_status, status)
                .await?;
            info!(
                from = %transaction.payment_status,
                to = %remote.payment_status,
                "Payment status changed"
            );

            if paid {
                self.mark_order_paid(&transaction).await?;
            }
        }

        Ok(remote)
    }

    /// Verify and apply a processor webhook.
    ///
    /// Events for sessions that are not stored are acknowledged without
    /// changing anything.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotConfigured`, a verification failure, or the
    /// first store failure.
    #[instrument(skip(self, payload, signature), fields(bytes = payload.len()))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, CheckoutError> {
        let gateway = self.gateway()?;
        let event = gateway.verify_webhook(payload, signature)?;

        let Some(session_id) = &event.session_id else {
            info!(event_type = %event.event_type, "Ignoring webhook without checkout session");
            return Ok(event);
        };

        let paid = event.payment_status.is_paid();
        let status = if paid {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };

        let matched = self
            .transactions()
            .update_status(session_id, event.payment_status, status)
            .await?;
        if !matched {
            info!(session_id = %session_id, "Webhook for unknown session");
            return Ok(event);
        }

        if paid
            && let Some(transaction) = self.transactions().get_by_session_id(session_id).await?
        {
            self.mark_order_paid(&transaction).await?;
        }

        info!(
            session_id = %session_id,
            event_type = %event.event_type,
            payment_status = %event.payment_status,
            "Webhook applied"
        );
        Ok(event)
    }

    async fn mark_order_paid(&self, transaction: &PaymentTransaction) -> Result<(), CheckoutError> {
        let matched = self
            .orders()
            .set_status(&transaction.order_id, OrderStatus::Paid)
            .await?;
        if matched {
            info!(order_id = %transaction.order_id, "Order paid");
        } else {
            warn!(order_id = %transaction.order_id, "Paid transaction references missing order");
        }
        Ok(())
    }
}

/// Status view built from a locally settled transaction.
fn settled_view(transaction: &PaymentTransaction) -> Result<CheckoutStatus, CheckoutError> {
    let amount_total = Price::new(transaction.amount, transaction.currency)
        .minor_units()
        .ok_or(PaymentError::AmountOutOfRange(transaction.amount))?;

    Ok(CheckoutStatus {
        status: SessionState::Complete,
        payment_status: PaymentStatus::Paid,
        amount_total,
        currency: transaction.currency.as_str().to_string(),
        metadata: transaction.metadata.clone(),
    })
}

/// Redirect and webhook URLs derived from the storefront origin.
#[derive(Debug, PartialEq, Eq)]
struct CallbackUrls {
    success: String,
    cancel: String,
    webhook: String,
}

impl CallbackUrls {
    fn new(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success: format!("{origin}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}"),
            cancel: format!("{origin}/checkout/cancel"),
            webhook: format!("{origin}/api/webhook/stripe"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use spice_store_core::ProductId;

    use super::*;
    use crate::db::MemoryDocumentStore;

    /// Gateway returning a fixed status and recording calls.
    struct FixedGateway {
        payment_status: PaymentStatus,
        requests: Mutex<Vec<CheckoutSessionRequest>>,
        polls: Mutex<u32>,
    }

    impl FixedGateway {
        fn new(payment_status: PaymentStatus) -> Self {
            Self {
                payment_status,
                requests: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FixedGateway {
        async fn create_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(CheckoutSession {
                session_id: SessionId::new("cs_test_1"),
                url: "https://pay.test/cs_test_1".to_string(),
            })
        }

        async fn get_status(&self, _: &SessionId) -> Result<CheckoutStatus, PaymentError> {
            *self.polls.lock().unwrap() += 1;
            Ok(CheckoutStatus {
                status: SessionState::Open,
                payment_status: self.payment_status,
                amount_total: 2000,
                currency: "usd".to_string(),
                metadata: Metadata::new(),
            })
        }

        fn verify_webhook(&self, _: &[u8], _: Option<&str>) -> Result<WebhookEvent, PaymentError> {
            Err(PaymentError::WebhookSecretMissing)
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            items: vec![CartItem {
                product_id: ProductId::new("p1"),
                quantity: 2,
                price: Decimal::from_str("10.0").unwrap(),
            }],
            customer_email: Email::parse("a@b.com").unwrap(),
            origin_url: "https://shop.test/".to_string(),
        }
    }

    #[test]
    fn test_callback_urls() {
        let urls = CallbackUrls::new("https://shop.test/");
        assert_eq!(
            urls,
            CallbackUrls {
                success: "https://shop.test/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                    .to_string(),
                cancel: "https://shop.test/checkout/cancel".to_string(),
                webhook: "https://shop.test/api/webhook/stripe".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_not_configured_touches_nothing() {
        let store = Arc::new(MemoryDocumentStore::new());
        let checkout = CheckoutService::new(store.clone(), None);

        assert!(matches!(
            checkout.create_session(request()).await,
            Err(CheckoutError::NotConfigured)
        ));
        assert!(matches!(
            checkout.get_status(&SessionId::new("cs_x")).await,
            Err(CheckoutError::NotConfigured)
        ));
        assert!(matches!(
            checkout.handle_webhook(b"{}", None).await,
            Err(CheckoutError::NotConfigured)
        ));

        let orders = store
            .count(crate::db::Collection::Orders, &crate::db::Filter::all())
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[tokio::test]
    async fn test_session_request_carries_total_and_metadata() {
        let gateway = Arc::new(FixedGateway::new(PaymentStatus::Initiated));
        let checkout = CheckoutService::new(
            Arc::new(MemoryDocumentStore::new()),
            Some(gateway.clone()),
        );

        checkout.create_session(request()).await.unwrap();

        let requests = gateway.requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.price.amount, Decimal::from(20));
        assert_eq!(sent.price.currency_code, CurrencyCode::USD);
        assert_eq!(sent.metadata["customer_email"], "a@b.com");
        assert_eq!(sent.metadata["source"], METADATA_SOURCE);
        assert!(sent.metadata.contains_key("order_id"));
        assert_eq!(sent.cancel_url, "https://shop.test/checkout/cancel");
    }

    #[tokio::test]
    async fn test_paid_poll_settles_then_short_circuits() {
        let gateway = Arc::new(FixedGateway::new(PaymentStatus::Paid));
        let checkout = CheckoutService::new(
            Arc::new(MemoryDocumentStore::new()),
            Some(gateway.clone()),
        );
        let session = checkout.create_session(request()).await.unwrap();

        let first = checkout.get_status(&session.session_id).await.unwrap();
        assert_eq!(first.payment_status, PaymentStatus::Paid);

        let second = checkout.get_status(&session.session_id).await.unwrap();
        assert_eq!(second.status, SessionState::Complete);
        assert_eq!(second.amount_total, 2000);
        assert_eq!(second.currency, "usd");
        assert_eq!(second.metadata["source"], METADATA_SOURCE);

        assert_eq!(*gateway.polls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let checkout = CheckoutService::new(
            Arc::new(MemoryDocumentStore::new()),
            Some(Arc::new(FixedGateway::new(PaymentStatus::Paid))),
        );

        assert!(matches!(
            checkout.get_status(&SessionId::new("cs_missing")).await,
            Err(CheckoutError::TransactionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_webhook_verification_failure_propagates() {
        let checkout = CheckoutService::new(
            Arc::new(MemoryDocumentStore::new()),
            Some(Arc::new(FixedGateway::new(PaymentStatus::Paid))),
        );

        assert!(matches!(
            checkout.handle_webhook(b"{}", Some("t=1,v1=00")).await,
            Err(CheckoutError::Payment(PaymentError::WebhookSecretMissing))
        ));
    }
}
