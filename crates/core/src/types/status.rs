//! Status enums for orders, payment transactions and checkout sessions.
//!
//! All of them serialize in lowercase, which is also how they are stored in
//! documents and returned over the API.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Checkout only ever moves an order from `Pending` to `Paid`. `Shipped` and
/// `Delivered` are set by fulfilment outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
}

/// Payment status in the processor's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Session created, customer has not completed payment yet.
    #[default]
    Initiated,
    Paid,
    Failed,
    Expired,
}

impl PaymentStatus {
    /// Whether the processor has confirmed the payment.
    #[must_use]
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Paid)
    }

    /// Whether no further transition is expected from the processor.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Initiated)
    }
}

/// Coarse local projection of [`PaymentStatus`] kept on a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// State of a checkout session at the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Open,
    Complete,
    Expired,
}

macro_rules! impl_display_via_serde_name {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Lowercase name as stored and serialized.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_display_via_serde_name!(OrderStatus {
    Pending => "pending",
    Paid => "paid",
    Shipped => "shipped",
    Delivered => "delivered",
});

impl_display_via_serde_name!(PaymentStatus {
    Initiated => "initiated",
    Paid => "paid",
    Failed => "failed",
    Expired => "expired",
});

impl_display_via_serde_name!(TransactionStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
});

impl_display_via_serde_name!(SessionState {
    Open => "open",
    Complete => "complete",
    Expired => "expired",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for status in [
            PaymentStatus::Initiated,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Expired,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }

        assert_eq!(
            serde_json::to_string(&TransactionStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::to_string(&SessionState::Complete).unwrap(),
            "\"complete\""
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Initiated);
        assert_eq!(TransactionStatus::default(), TransactionStatus::Pending);
    }

    #[test]
    fn test_terminal_payment_states() {
        assert!(!PaymentStatus::Initiated.is_terminal());
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(PaymentStatus::Expired.is_terminal());
        assert!(PaymentStatus::Paid.is_paid());
        assert!(!PaymentStatus::Expired.is_paid());
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<OrderStatus>("\"refunded\"").is_err());
    }
}
