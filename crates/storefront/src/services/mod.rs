//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Product listing, creation and sample data; order lookup
//! - `checkout` - Orders, payment sessions and payment status reconciliation

pub mod catalog;
pub mod checkout;
mod sample_products;

pub use catalog::{CatalogService, SeedOutcome};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService};
