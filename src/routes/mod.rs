//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod error;
pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers); tighten for production
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/variants", get(http::http_get_variants))
        .route("/api/v1/validate", post(http::http_post_validate))
        .route("/api/v1/lessons", get(http::http_get_lessons).post(http::http_post_lesson))
        .route("/api/v1/lessons/:lesson_id", get(http::http_get_lesson))
        .route("/api/v1/lessons/:lesson_id/blocks", post(http::http_post_block))
        .route(
            "/api/v1/lessons/:lesson_id/blocks/:block_id",
            put(http::http_put_block).delete(http::http_delete_block),
        )
        .route("/api/v1/lessons/:lesson_id/blocks/:block_id/move", post(http::http_post_move))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
