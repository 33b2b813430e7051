//! Domain models for the storefront.
//!
//! These are the typed records stored as documents. Field names are the
//! document field names, and they are also the JSON returned over the API.

pub mod order;
pub mod payment;
pub mod product;

pub use order::{CartItem, Order};
pub use payment::{Metadata, PaymentTransaction};
pub use product::{NewProduct, Product};
