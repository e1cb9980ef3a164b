//! Custom Axum extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use gateway_core::invocation::REQUEST_ID_HEADER;
use std::convert::Infallible;

/// Request ID from `x-request-id` (or `x-correlation-id`), generated when absent
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .or_else(|| parts.headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> String {
        let (mut parts, ()) = request.into_parts();
        let RequestId(id) = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_request_id_from_header() {
        let request = Request::builder()
            .header("x-request-id", "req-123")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, "req-123");
    }

    #[tokio::test]
    async fn test_request_id_from_correlation_header() {
        let request = Request::builder()
            .header("x-correlation-id", "corr-9")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, "corr-9");
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let id = extract(Request::builder().body(()).unwrap()).await;
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
