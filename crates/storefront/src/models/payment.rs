//! Payment transaction records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use spice_store_core::{
    CurrencyCode, Email, OrderId, PaymentStatus, SessionId, TransactionId, TransactionStatus,
};

/// Opaque string pairs passed to the payment processor and echoed back.
pub type Metadata = BTreeMap<String, String>;

/// Local record of one payment processor checkout session.
///
/// `session_id` is the lookup key. `payment_status` mirrors the processor;
/// `status` is the coarse local projection of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub session_id: SessionId,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(default)]
    pub customer_email: Option<Email>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// A freshly initiated transaction for a new session.
    #[must_use]
    pub fn initiated(
        session_id: SessionId,
        order_id: OrderId,
        amount: Decimal,
        customer_email: Email,
        metadata: Metadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::generate(),
            session_id,
            order_id,
            amount,
            currency: CurrencyCode::USD,
            payment_status: PaymentStatus::Initiated,
            status: TransactionStatus::Pending,
            customer_email: Some(customer_email),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}
