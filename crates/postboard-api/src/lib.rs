//! # postboard-api
//!
//! REST API layer for Postboard: user signup/login, post CRUD with image
//! upload, and serving of locally stored images.

pub mod auth;
pub mod middleware;
pub mod routes;
pub mod upload;

use axum::{extract::DefaultBodyLimit, Router};
use postboard_common::config::{AuthConfig, LimitsConfig};
use postboard_db::{storage::StorageClient, Database};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Room for the text fields and multipart framing around an image.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Image storage (local directory or S3-compatible bucket).
    pub storage: StorageClient,
    /// JWT secret and token lifetime.
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
    /// Origin used in image links; derived from `Host` when unset.
    pub public_url: Option<String>,
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.limits.max_image_bytes + FORM_OVERHEAD_BYTES;
    let state = Arc::new(state);

    let api_routes = Router::new()
        .merge(routes::user::router())
        .merge(routes::posts::router(state.clone()))
        .merge(routes::health::router());

    Router::new()
        .nest("/api", api_routes)
        .merge(routes::files::router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
