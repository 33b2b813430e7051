//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use spice_store_core::ProductId;

/// Stock level assigned when a product is created without one.
pub const DEFAULT_STOCK_QUANTITY: i64 = 100;

const fn default_stock_quantity() -> i64 {
    DEFAULT_STOCK_QUANTITY
}

/// A catalog product.
///
/// Products are immutable once created; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in major units (dollars).
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Free-text label, e.g. "Powders".
    pub category: String,
    /// Free-text label, e.g. "250g".
    pub weight: String,
    pub image_url: String,
    /// Informational only; checkout never decrements it.
    #[serde(default = "default_stock_quantity")]
    pub stock_quantity: i64,
    #[serde(default)]
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    pub weight: String,
    pub image_url: String,
    #[serde(default = "default_stock_quantity")]
    pub stock_quantity: i64,
    #[serde(default)]
    pub featured: bool,
}

impl NewProduct {
    /// Assign an id and creation time.
    #[must_use]
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            weight: self.weight,
            image_url: self.image_url,
            stock_quantity: self.stock_quantity,
            featured: self.featured,
            created_at,
        }
    }
}
