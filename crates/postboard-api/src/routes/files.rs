//! Static image serving for local storage.
//!
//! `GET /images/{*key}` serves uploaded images from the storage directory.
//! With S3-compatible storage image links point at the bucket, so every
//! request here ends in 404.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/images/{*key}", get(serve_image))
}

async fn serve_image(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let key = format!("images/{key}");
    match state.storage.read_local_file(&key).await {
        Ok(Some((bytes, content_type))) => {
            let etag = format!("\"{}\"", hex::encode(Sha256::digest(&bytes)));
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::ETAG, etag),
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=31536000, immutable".to_string(),
                    ),
                ],
                Body::from(bytes),
            )
                .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(key, error = %e, "Failed to serve local image");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
