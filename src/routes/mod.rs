//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/catalog", get(http::http_catalog))
        .route("/api/v1/dashboard", get(http::http_dashboard))
        .route("/api/v1/status", get(http::http_status))
        // Setup context
        .route("/api/v1/setup", get(http::http_get_setup).put(http::http_put_setup))
        .route("/api/v1/setup/outline", post(http::http_post_outline))
        // Curriculum documents
        .route("/api/v1/documents", get(http::http_list_documents))
        .route("/api/v1/documents/generate", post(http::http_generate_documents))
        .route("/api/v1/documents/:id/export", get(http::http_export_document))
        // Question bank
        .route("/api/v1/questions", get(http::http_list_questions).delete(http::http_clear_questions))
        .route("/api/v1/questions/generate", post(http::http_generate_questions))
        .route("/api/v1/questions/package", post(http::http_export_package))
        .route("/api/v1/questions/:id", delete(http::http_delete_question))
        // Administrative documents
        .route("/api/v1/admin", get(http::http_list_admin))
        .route("/api/v1/admin/generate", post(http::http_generate_admin))
        .route("/api/v1/admin/:id/export", get(http::http_export_admin))
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
        // Frontend fallback
        .fallback_service(static_service)
}
