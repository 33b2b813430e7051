//! Payment transaction repository.
//!
//! Transactions are looked up by processor session id, not by their own id.

use chrono::Utc;

use spice_store_core::{PaymentStatus, SessionId, TransactionStatus};

use super::{Collection, DocumentStore, Filter, RepositoryError, Update, decode};
use crate::models::PaymentTransaction;

/// Repository for payment transaction documents.
pub struct PaymentTransactionRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> PaymentTransactionRepository<'a> {
    /// Create a new payment transaction repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get the transaction for a processor session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the stored transaction is malformed.
    pub async fn get_by_session_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<PaymentTransaction>, RepositoryError> {
        self.store
            .find_one(Collection::PaymentTransactions, &by_session(session_id))
            .await?
            .map(|doc| decode(Collection::PaymentTransactions, doc))
            .transpose()
    }

    /// Insert a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id is already taken.
    pub async fn insert(&self, transaction: &PaymentTransaction) -> Result<(), RepositoryError> {
        let doc = serde_json::to_value(transaction)?;
        self.store
            .insert_one(Collection::PaymentTransactions, doc)
            .await
    }

    /// Record a new payment status and local status, refreshing `updated_at`.
    ///
    /// No compare-and-swap: the last writer wins. Returns whether a
    /// transaction matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        session_id: &SessionId,
        payment_status: PaymentStatus,
        status: TransactionStatus,
    ) -> Result<bool, RepositoryError> {
        let update = Update::new()
            .set("payment_status", payment_status)?
            .set("status", status)?
            .set("updated_at", Utc::now())?;
        let matched = self
            .store
            .update_one(
                Collection::PaymentTransactions,
                &by_session(session_id),
                &update,
            )
            .await?;
        Ok(matched > 0)
    }
}

fn by_session(session_id: &SessionId) -> Filter {
    Filter::all().where_eq("session_id", session_id.as_str())
}
