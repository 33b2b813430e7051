//! Request ID middleware for request tracing and correlation.
//!
//! Each request carries an `x-request-id`: the upstream proxy's value when it
//! is present and sane, otherwise a fresh UUID v4. The ID is recorded on the
//! `http_request` span, tagged on the Sentry scope, forwarded to handlers in
//! the request headers and echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upstream IDs longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Accept an upstream request ID only if it is short printable ASCII.
fn upstream_request_id(value: &HeaderValue) -> Option<String> {
    let id = value.to_str().ok()?.trim();
    let usable = !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id.bytes().all(|b| b.is_ascii_graphic());
    usable.then(|| id.to_owned())
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(upstream_request_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let header = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    let mut response = next.run(request).await;

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::HeaderMap, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    use super::*;

    /// Echoes the request ID the handler saw.
    async fn echo(headers: HeaderMap) -> String {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(from_fn(request_id_middleware))
    }

    async fn send(request_id: Option<&str>) -> (String, String) {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (header, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_generates_id_when_missing() {
        let (header, seen) = send(None).await;
        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(header, seen);
    }

    #[tokio::test]
    async fn test_keeps_upstream_id() {
        let (header, seen) = send(Some("cf-ray-8a1b2c3d")).await;
        assert_eq!(header, "cf-ray-8a1b2c3d");
        assert_eq!(seen, "cf-ray-8a1b2c3d");
    }

    #[tokio::test]
    async fn test_replaces_oversized_upstream_id() {
        let long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        let (header, _) = send(Some(&long)).await;
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[test]
    fn test_upstream_request_id_rules() {
        assert_eq!(
            upstream_request_id(&HeaderValue::from_static("abc-123")),
            Some("abc-123".to_string())
        );
        assert_eq!(upstream_request_id(&HeaderValue::from_static("")), None);
        assert_eq!(upstream_request_id(&HeaderValue::from_static("a b")), None);
    }
}
