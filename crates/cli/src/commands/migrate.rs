//! Collection setup for the `PostgreSQL` document store.
//!
//! Each collection is a JSONB table inside the schema named by `STOREFRONT_DB_NAME`.
//! Running this twice is harmless; every statement is `IF NOT EXISTS`.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `postgres://` connection string
//! - `STOREFRONT_DB_NAME` - schema holding the collections

use thiserror::Error;

use spice_store_storefront::config::{ConfigError, StoreBackend, StoreConfig};
use spice_store_storefront::db::{PgDocumentStore, RepositoryError};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// Create the schema, collection tables and indexes.
///
/// # Errors
///
/// Returns an error if configuration is missing or a statement fails.
pub async fn collections() -> Result<(), MigrationError> {
    let config = StoreConfig::from_env()?;

    if config.backend == StoreBackend::Memory {
        tracing::info!("In-memory store selected; nothing to migrate");
        return Ok(());
    }

    tracing::info!(schema = %config.database_name, "Connecting to document store...");
    let store = PgDocumentStore::connect(&config.url, &config.database_name).await?;

    tracing::info!("Creating collections...");
    store.ensure_collections().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
