use crate::config::AppState;
use crate::middleware::require_api_key;
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Start the API server
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/api/health/homeassistant", get(homeassistant_health))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(protected)
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new())
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hassbridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Reachability of the configured Home Assistant instance
async fn homeassistant_health(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let version = state
        .client
        .config()
        .version()
        .await
        .map_err(ApiError::bad_gateway)?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "homeassistant_version": version,
    })))
}

/// Handle POST /mcp
///
/// The body is one JSON-RPC message. Notifications are acknowledged with
/// 202 and no body.
async fn handle_mcp_post(State(state): State<Arc<AppState>>, body: String) -> Response {
    match state.mcp.handle_line(&body).await {
        Some(response) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            response,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Custom error type for API handlers
pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    /// Failure of the upstream Home Assistant instance.
    pub fn bad_gateway(err: impl Into<anyhow::Error>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            error: err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_msg = self.error.to_string();
        let details = self
            .error
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        let response = if details.is_empty() {
            ErrorResponse::new(error_msg)
        } else {
            ErrorResponse::with_details(error_msg, details)
        };

        (self.status, Json(response)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
