//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use spice_store_core::{Email, OrderId, OrderStatus, ProductId, SessionId};

/// A line in a checkout request.
///
/// Only ever embedded in an [`Order`]. The product id is not checked against
/// the catalog and the price is taken as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price in major units.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl CartItem {
    /// `price × quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Sum of line totals over a cart, or `None` on overflow.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
}

/// An order created at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_email: Email,
    /// Items in the order they were submitted.
    pub items: Vec<CartItem>,
    /// Computed once at creation from `items`.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub stripe_session_id: Option<SessionId>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A new pending order with the total computed from `items`.
    ///
    /// Returns `None` if the total overflows.
    #[must_use]
    pub fn pending(customer_email: Email, items: Vec<CartItem>) -> Option<Self> {
        let total_amount = cart_total(&items)?;
        Some(Self {
            id: OrderId::generate(),
            customer_email,
            total_amount,
            items,
            status: OrderStatus::Pending,
            stripe_session_id: None,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(price: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new("p1"),
            quantity,
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn test_cart_total() {
        assert_eq!(cart_total(&[]), Some(Decimal::ZERO));
        assert_eq!(
            cart_total(&[item("10.0", 2)]),
            Some(Decimal::from_str("20.0").unwrap())
        );
        assert_eq!(
            cart_total(&[item("12.99", 3), item("0.01", 1)]),
            Some(Decimal::from_str("38.98").unwrap())
        );
    }

    #[test]
    fn test_pending_order() {
        let order = Order::pending(
            Email::parse("a@b.com").unwrap(),
            vec![item("15.99", 1), item("8.99", 2)],
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.stripe_session_id, None);
        assert_eq!(order.total_amount, Decimal::from_str("33.97").unwrap());
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn test_overflowing_total_is_none() {
        let huge = CartItem {
            product_id: ProductId::new("p1"),
            quantity: 10,
            price: Decimal::MAX,
        };
        assert_eq!(huge.line_total(), None);
        assert_eq!(cart_total(&[item("1.0", 1), huge.clone()]), None);

        let half = Decimal::MAX / Decimal::TWO + Decimal::ONE;
        let parts = [
            CartItem { price: half, quantity: 1, ..huge.clone() },
            CartItem { price: half, quantity: 1, ..huge },
        ];
        assert_eq!(cart_total(&parts), None);
        assert!(Order::pending(Email::parse("a@b.com").unwrap(), parts.to_vec()).is_none());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let result = serde_json::from_str::<CartItem>(
            r#"{"product_id": "p1", "quantity": -1, "price": 1.0}"#,
        );
        assert!(result.is_err());
    }
}
