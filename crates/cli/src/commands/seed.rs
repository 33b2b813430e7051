//! Seed the catalog with the sample spice range.
//!
//! Does nothing when products already exist, matching `POST /api/init-products`.

use std::sync::Arc;

use thiserror::Error;

use spice_store_storefront::config::{ConfigError, StoreConfig};
use spice_store_storefront::db::{self, RepositoryError};
use spice_store_storefront::services::CatalogService;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// Insert the sample products if the catalog is empty.
///
/// # Errors
///
/// Returns an error if configuration is missing or the store rejects a write.
pub async fn sample_products() -> Result<(), SeedError> {
    let config = StoreConfig::from_env()?;

    let store = db::connect(&config).await?;
    let catalog = CatalogService::new(Arc::clone(&store));

    let outcome = catalog.seed_sample_products().await?;
    tracing::info!(count = outcome.count(), "{}", outcome.message());

    store.close().await;
    Ok(())
}
