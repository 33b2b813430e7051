//! Product repository.

use spice_store_core::ProductId;

use super::{Collection, DocumentStore, Filter, RepositoryError, decode};
use crate::models::Product;

/// Upper bound on a full catalog listing.
pub const LIST_LIMIT: usize = 1000;
/// Upper bound on the featured listing.
pub const FEATURED_LIMIT: usize = 100;

/// Repository for product documents.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// All products in insertion order, at most [`LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored product is malformed.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.find(&Filter::all(), LIST_LIMIT).await
    }

    /// Featured products, at most [`FEATURED_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a stored product is malformed.
    pub async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        self.find(&Filter::all().where_eq("featured", true), FEATURED_LIMIT)
            .await
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored product is malformed.
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.store
            .find_one(Collection::Products, &Filter::by_id(id))
            .await?
            .map(|doc| decode(Collection::Products, doc))
            .transpose()
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already taken.
    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(product)?;
        self.store.insert_one(Collection::Products, doc).await
    }

    /// Number of stored products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the count fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        self.store.count(Collection::Products, &Filter::all()).await
    }

    async fn find(&self, filter: &Filter, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        self.store
            .find(Collection::Products, filter, limit)
            .await?
            .into_iter()
            .map(|doc| decode(Collection::Products, doc))
            .collect()
    }
}
