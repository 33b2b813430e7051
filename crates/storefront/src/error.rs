//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"detail": "<message>"}`. Internal detail is logged,
//! never returned.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::CheckoutError;

/// Which checkout operation failed, for the client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    CreateSession,
    Status,
    Webhook,
}

impl CheckoutStage {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::CreateSession => "Failed to create checkout session",
            Self::Status => "Failed to check payment status",
            Self::Webhook => "Webhook processing failed",
        }
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout operation failed.
    #[error("Checkout error ({stage:?}): {source}")]
    Checkout {
        stage: CheckoutStage,
        #[source]
        source: CheckoutError,
    },

    /// Resource not found. The message is returned to the client.
    #[error("{0}")]
    NotFound(&'static str),
}

impl AppError {
    /// Wrap a checkout failure with the operation it came from.
    #[must_use]
    pub const fn checkout(stage: CheckoutStage, source: CheckoutError) -> Self {
        Self::Checkout { stage, source }
    }

    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, *message),
            Self::Checkout { source, stage } => match source {
                CheckoutError::TransactionNotFound(_) => {
                    (StatusCode::NOT_FOUND, "Transaction not found")
                }
                CheckoutError::NotConfigured => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Payment system not configured",
                ),
                CheckoutError::TotalOverflow
                | CheckoutError::Payment(_)
                | CheckoutError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, stage.failure_message())
                }
            },
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Checkout session created", Some(&[("order_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use spice_store_core::SessionId;

    use super::*;
    use crate::payments::PaymentError;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_detail() {
        let (status, body) = response_parts(AppError::NotFound("Product not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Product not found"}));
    }

    #[tokio::test]
    async fn test_checkout_messages() {
        let (status, body) = response_parts(AppError::checkout(
            CheckoutStage::CreateSession,
            CheckoutError::NotConfigured,
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Payment system not configured");

        let (status, body) = response_parts(AppError::checkout(
            CheckoutStage::Status,
            CheckoutError::TransactionNotFound(SessionId::new("cs_1")),
        ))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Transaction not found");

        let (status, body) = response_parts(AppError::checkout(
            CheckoutStage::Webhook,
            CheckoutError::Payment(PaymentError::InvalidSignature("mismatch".to_string())),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Webhook processing failed");
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let (status, body) = response_parts(AppError::Database(
            RepositoryError::DataCorruption("secret table layout".to_string()),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }
}
