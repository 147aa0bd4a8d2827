//! Account routes — signup and login.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use postboard_common::{
    error::{PostboardError, PostboardResult},
    models::user::{LoginRequest, LoginResponse, SignupRequest, User},
    snowflake,
    validation::validate_request,
};
use postboard_db::repository::users;
use serde::Serialize;
use std::sync::Arc;

use crate::{auth, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/signup", post(signup))
        .route("/user/login", post(login))
}

#[derive(Serialize)]
struct SignupResponse {
    message: &'static str,
    result: User,
}

/// POST /api/user/signup
async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> PostboardResult<(StatusCode, Json<SignupResponse>)> {
    validate_request(&body)?;

    if users::find_by_email(&state.db.pool, &body.email)
        .await?
        .is_some()
    {
        return Err(PostboardError::AlreadyExists {
            resource: "Email".into(),
        });
    }

    let password_hash = auth::hash_password(&body.password)
        .map_err(|e| PostboardError::Internal(anyhow::anyhow!("{e}")))?;

    let user = users::create_user(
        &state.db.pool,
        snowflake::generate_id(),
        &body.email,
        &password_hash,
    )
    .await
    .map_err(|e| PostboardError::from_insert(e, "Email"))?;

    tracing::info!(user_id = %user.id, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created!",
            result: user,
        }),
    ))
}

/// POST /api/user/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> PostboardResult<Json<LoginResponse>> {
    validate_request(&body).map_err(|_| PostboardError::InvalidCredentials)?;

    let user = users::find_by_email(&state.db.pool, &body.email)
        .await?
        .ok_or(PostboardError::InvalidCredentials)?;

    let valid = auth::verify_password(&body.password, &user.password_hash)
        .map_err(|_| PostboardError::InvalidCredentials)?;
    if !valid {
        return Err(PostboardError::InvalidCredentials);
    }

    let token = auth::generate_token(
        user.id,
        &user.email,
        &state.auth.jwt_secret,
        state.auth.token_ttl_secs,
    )
    .map_err(|e| PostboardError::Internal(e.into()))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_in: state.auth.token_ttl_secs,
        user_id: user.id,
    }))
}
