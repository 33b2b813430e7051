//! Catalog service.
//!
//! Products are created once and never updated or deleted. Orders are only
//! read here; they are written by the checkout service.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use spice_store_core::{OrderId, ProductId};

use super::sample_products::sample_products;
use crate::db::{DocumentStore, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{NewProduct, Order, Product};

/// Result of [`CatalogService::seed_sample_products`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Products already existed; nothing was inserted.
    AlreadyInitialized(u64),
    /// The store was empty and this many products were inserted.
    Seeded(u64),
}

impl SeedOutcome {
    /// Number of products in the store afterwards.
    #[must_use]
    pub const fn count(self) -> u64 {
        match self {
            Self::AlreadyInitialized(count) | Self::Seeded(count) => count,
        }
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(self) -> String {
        match self {
            Self::AlreadyInitialized(count) => {
                format!("Products already initialized. Count: {count}")
            }
            Self::Seeded(count) => format!("Initialized {count} products successfully"),
        }
    }
}

/// Product catalog operations.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
}

impl CatalogService {
    /// Create a catalog service over a document store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(self.store.as_ref())
    }

    /// List all products (capped).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails or holds a malformed product.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products().list().await
    }

    /// List featured products (capped).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails or holds a malformed product.
    #[instrument(skip(self))]
    pub async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products().list_featured().await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails or the product is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.products().get_by_id(id).await
    }

    /// Create a product, assigning its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the insert fails.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let product = new.into_product(ProductId::generate(), Utc::now());
        self.products().insert(&product).await?;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Insert the sample catalog if the store has no products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if counting or inserting fails.
    #[instrument(skip(self))]
    pub async fn seed_sample_products(&self) -> Result<SeedOutcome, RepositoryError> {
        let existing = self.products().count().await?;
        if existing > 0 {
            info!(count = existing, "Products already initialized");
            return Ok(SeedOutcome::AlreadyInitialized(existing));
        }

        let mut inserted = 0;
        for new in sample_products() {
            self.create_product(new).await?;
            inserted += 1;
        }

        info!(count = inserted, "Sample products inserted");
        Ok(SeedOutcome::Seeded(inserted))
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails or the order is malformed.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(self.store.as_ref()).get_by_id(id).await
    }
}
