//! API Routes
//!
//! - `/` - Welcome message
//! - `/health` - Health check
//! - `/upload/`, `/download/{filename}`, `/list-files/` - File transfer

pub mod files;
pub mod health;

use axum::{extract::DefaultBodyLimit, Router};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
///
/// Uploads have no body size limit unless `max_upload_bytes` is configured.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = match state.config.storage.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .merge(health::router(state.clone()))
        .merge(files::router(state))
        .layer(body_limit)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer()),
        )
}
