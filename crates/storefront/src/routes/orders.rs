//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
};

use spice_store_core::OrderId;

use crate::error::{AppError, Result};
use crate::models::Order;
use crate::state::AppState;

/// Show a single order.
pub async fn show(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    state
        .catalog()
        .get_order(&id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Order not found"))
}
