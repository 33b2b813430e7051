//! Spice Store Core - Shared types library.
//!
//! This crate provides common types used across all Spice Store components:
//! - `storefront` - JSON API for the catalog, orders and checkout
//! - `cli` - Command-line tools for collection setup and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

#[doc(hidden)]
pub use uuid as __uuid;
