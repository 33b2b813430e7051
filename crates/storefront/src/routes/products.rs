//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use spice_store_core::ProductId;

use crate::error::{AppError, Result};
use crate::models::{NewProduct, Product};
use crate::state::AppState;

/// Response for `POST /api/init-products`.
#[derive(Debug, Serialize)]
pub struct InitProductsResponse {
    pub message: String,
    pub count: u64,
}

/// List all products.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_products().await?))
}

/// List featured products.
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().list_featured().await?))
}

/// Show a single product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Product not found"))
}

/// Create a product.
pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewProduct>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().create_product(new).await?))
}

/// Seed the sample catalog if no products exist.
pub async fn init(State(state): State<AppState>) -> Result<Json<InitProductsResponse>> {
    let outcome = state.catalog().seed_sample_products().await?;
    Ok(Json(InitProductsResponse {
        message: outcome.message(),
        count: outcome.count(),
    }))
}
