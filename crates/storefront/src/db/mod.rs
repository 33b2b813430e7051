//! Document store access for the storefront.
//!
//! # Collections
//!
//! - `products` - Catalog entries
//! - `orders` - Orders created at checkout
//! - `payment_transactions` - One record per payment processor session
//!
//! Records are JSON documents keyed by an opaque string `id`. The
//! [`DocumentStore`] trait exposes only the operations the services need:
//! equality filters, top-level field merges and counts. There are no
//! transactions and no multi-document atomicity.
//!
//! # Backends
//!
//! - [`PgDocumentStore`] - `PostgreSQL`, one JSONB table per collection
//! - [`MemoryDocumentStore`] - in-process, for tests and local development
//!
//! Tables are created by the CLI, never at server start:
//! ```bash
//! cargo run -p spice-store-cli -- migrate
//! ```

pub mod memory;
pub mod orders;
pub mod payment_transactions;
pub mod postgres;
pub mod products;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};

pub use memory::MemoryDocumentStore;
pub use orders::OrderRepository;
pub use payment_transactions::PaymentTransactionRepository;
pub use postgres::PgDocumentStore;
pub use products::ProductRepository;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document does not match the expected record shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A document passed to the store is not usable (e.g. not an object, no `id`).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A record could not be converted to a document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Orders,
    PaymentTransactions,
}

impl Collection {
    /// All collections, in creation order.
    pub const ALL: [Self; 3] = [Self::Products, Self::Orders, Self::PaymentTransactions];

    /// Collection (table) name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Orders => "orders",
            Self::PaymentTransactions => "payment_transactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conjunction of top-level field equality constraints.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality constraint on a top-level field.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_owned(), value.into());
        self
    }

    /// Filter on the document `id`.
    #[must_use]
    pub fn by_id(id: impl AsRef<str>) -> Self {
        Self::all().where_eq("id", id.as_ref())
    }

    /// Whether a document satisfies every constraint.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// The constraints as a JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Top-level fields to overwrite on a matched document (`$set` semantics).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update(Map<String, Value>);

impl Update {
    /// An empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a serializable value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Serialization` if the value cannot be encoded.
    pub fn set(mut self, field: &str, value: impl Serialize) -> Result<Self, RepositoryError> {
        self.0.insert(field.to_owned(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Merge the update into a document in place.
    pub fn apply_to(&self, document: &mut Value) {
        if let Value::Object(fields) = document {
            for (field, value) in &self.0 {
                fields.insert(field.clone(), value.clone());
            }
        }
    }

    /// The fields as a JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Generic async document store over the storefront collections.
///
/// Implementations must be safe for concurrent use; every call is an
/// independent operation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents matching the filter, in insertion order, at most `limit`.
    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Value>, RepositoryError>;

    /// First document matching the filter.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, RepositoryError>;

    /// Insert a document. It must be a JSON object with a string `id`.
    async fn insert_one(&self, collection: Collection, document: Value)
    -> Result<(), RepositoryError>;

    /// Merge `update` into the first document matching `filter`.
    ///
    /// Returns the number of matched documents (0 or 1).
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, RepositoryError>;

    /// Number of documents matching the filter.
    async fn count(&self, collection: Collection, filter: &Filter) -> Result<u64, RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Release connections. Further calls may fail.
    async fn close(&self);
}

/// Extract the string `id` every stored document must carry.
pub(crate) fn document_id(document: &Value) -> Result<&str, RepositoryError> {
    if !document.is_object() {
        return Err(RepositoryError::InvalidDocument(
            "document must be a JSON object".to_owned(),
        ));
    }
    document
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| RepositoryError::InvalidDocument("document has no string id".to_owned()))
}

/// Decode a stored document into a typed record.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    collection: Collection,
    document: Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(document).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid document in {collection}: {e}"))
    })
}

/// Connect to the document store selected by the configuration.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the `PostgreSQL` pool cannot be created.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, RepositoryError> {
    match config.backend {
        StoreBackend::Postgres => {
            let store = PgDocumentStore::connect(&config.url, &config.database_name).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryDocumentStore::new())),
    }
}
