//! Middleware — authentication check and security headers.

use axum::{
    extract::{Request, State},
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use postboard_common::{auth, error::PostboardError};
use std::sync::Arc;

use crate::AppState;

/// Authentication context extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: uuid::Uuid,
    pub email: String,
}

/// Validate the `Authorization: Bearer <token>` header and attach the caller's
/// identity to the request. Any failure ends the request with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, PostboardError> {
    let Authorization(bearer) = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(PostboardError::Unauthorized)?;

    let claims = auth::validate_token(bearer.token(), &state.auth.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        PostboardError::Unauthorized
    })?;

    let user_id = claims
        .sub
        .parse::<uuid::Uuid>()
        .map_err(|_| PostboardError::Unauthorized)?;

    // Insert auth context into request extensions for handlers to use
    request.extensions_mut().insert(AuthContext {
        user_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Add a minimal set of security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let h = response.headers_mut();

    h.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    h.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    h.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
