//! Spice Store storefront library.
//!
//! Catalog, orders and Stripe checkout over a document store, served as a
//! JSON API. The binary in `main.rs` wires configuration, logging and the
//! server around [`routes::build_router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
