//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::DocumentStore;
use crate::payments::PaymentGateway;
use crate::services::{CatalogService, CheckoutService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store and the services built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn DocumentStore>,
    catalog: CatalogService,
    checkout: CheckoutService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Document store shared by all services
    /// * `gateway` - Payment gateway; `None` disables checkout and webhooks
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog: CatalogService::new(Arc::clone(&store)),
                checkout: CheckoutService::new(Arc::clone(&store), gateway),
                store,
            }),
        }
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
