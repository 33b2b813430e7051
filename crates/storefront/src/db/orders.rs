//! Order repository.

use spice_store_core::{OrderId, OrderStatus, SessionId};

use super::{Collection, DocumentStore, Filter, RepositoryError, Update, decode};
use crate::models::Order;

/// Repository for order documents.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored order is malformed.
    pub async fn get_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.store
            .find_one(Collection::Orders, &Filter::by_id(id))
            .await?
            .map(|doc| decode(Collection::Orders, doc))
            .transpose()
    }

    /// Insert an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already taken.
    pub async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(order)?;
        self.store.insert_one(Collection::Orders, doc).await
    }

    /// Attach the payment session to an order.
    ///
    /// Returns whether an order matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_session_id(
        &self,
        id: &OrderId,
        session_id: &SessionId,
    ) -> Result<bool, RepositoryError> {
        let update = Update::new().set("stripe_session_id", session_id)?;
        let matched = self
            .store
            .update_one(Collection::Orders, &Filter::by_id(id), &update)
            .await?;
        Ok(matched > 0)
    }

    /// Set an order's status.
    ///
    /// Returns whether an order matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<bool, RepositoryError> {
        let update = Update::new().set("status", status)?;
        let matched = self
            .store
            .update_one(Collection::Orders, &Filter::by_id(id), &update)
            .await?;
        Ok(matched > 0)
    }
}
