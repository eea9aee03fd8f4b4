//! Route configuration.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Headroom over the file size cap for multipart framing.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Hard ceiling on requests in flight, above the per-pipeline bounds.
const MAX_IN_FLIGHT_REQUESTS: usize = 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/upload", post(handlers::upload))
        .route(
            "/images/{filename}",
            get(handlers::image_get).delete(handlers::image_delete),
        )
        .route("/images/{filename}/watermark", get(handlers::image_watermark))
        .route("/s/{code}", get(handlers::short_link_get))
        .route("/links/{id}", post(handlers::link_create))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
