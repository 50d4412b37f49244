use crate::config::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Extract the key from `Authorization: Bearer <key>` or `X-API-Key`.
pub fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        return auth.strip_prefix("Bearer ").map(str::trim);
    }
    headers.get("x-api-key").and_then(|v| v.to_str().ok()).map(str::trim)
}

/// Comparison whose duration does not depend on where the inputs differ.
pub fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    let mut diff = u8::from(expected.len() != provided.len());
    for (i, byte) in expected.iter().enumerate() {
        diff |= byte ^ provided.get(i).copied().unwrap_or(0xff);
    }
    diff == 0
}

/// Reject requests without the configured API key. Without a configured key
/// every request passes.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let Some(provided) = extract_api_key(request.headers()) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Missing or invalid Authorization header"})),
        )
            .into_response();
    };

    if !constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
        tracing::warn!("Rejected request with invalid API key");
        return (StatusCode::FORBIDDEN, Json(json!({"error": "Invalid API key"}))).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_api_key() {
        let mut headers = HeaderMap::new();
        assert!(extract_api_key(&headers).is_none());

        headers.insert("x-api-key", HeaderValue::from_static("k1"));
        assert_eq!(extract_api_key(&headers), Some("k1"));

        headers.insert("authorization", HeaderValue::from_static("Bearer token123"));
        assert_eq!(extract_api_key(&headers), Some("token123"));

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
        assert!(!constant_time_eq(b"secret", b""));
    }
}
