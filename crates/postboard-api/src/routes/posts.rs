//! Post routes — create, list, read, update, delete.
//!
//! POST   /api/posts        — auth, file extraction
//! PUT    /api/posts/{id}   — auth, file extraction
//! GET    /api/posts        — optional `pagesize` + `page` (1-based)
//! GET    /api/posts/{id}
//! DELETE /api/posts/{id}   — auth
//!
//! Only the creator of a post may change or delete it.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use postboard_common::{
    error::{PostboardError, PostboardResult},
    models::post::{Post, PostFields, PostsPage, PostsQuery},
    snowflake,
    validation::validate_request,
};
use postboard_db::repository::posts;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    middleware::{auth_middleware, AuthContext},
    upload::{ImageUpload, PostForm},
    AppState,
};

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let check_auth = || middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route(
            "/posts",
            get(list_posts).merge(post(create_post).route_layer(check_auth())),
        )
        .route(
            "/posts/{id}",
            get(get_post).merge(
                put(update_post)
                    .delete(delete_post)
                    .route_layer(check_auth()),
            ),
        )
}

#[derive(Serialize)]
struct CreatedResponse {
    message: &'static str,
    post: Post,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ============================================================
// POST /posts
// ============================================================

async fn create_post(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    form: PostForm,
) -> PostboardResult<(StatusCode, Json<CreatedResponse>)> {
    let fields = PostFields {
        title: form.title,
        content: form.content,
    };
    validate_request(&fields)?;
    let image = form
        .image
        .ok_or_else(|| PostboardError::validation("Image is required"))?;

    let image_path = store_image(&state, image, &form.origin).await?;

    let post = match posts::create_post(
        &state.db.pool,
        snowflake::generate_id(),
        auth.user_id,
        &fields.title,
        &fields.content,
        &image_path,
    )
    .await
    {
        Ok(post) => post,
        Err(e) => {
            remove_image(&state, &image_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(post_id = %post.id, creator = %auth.user_id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Post added successfully",
            post,
        }),
    ))
}

// ============================================================
// PUT /posts/{id}
// ============================================================

async fn update_post(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    form: PostForm,
) -> PostboardResult<Json<MessageResponse>> {
    let existing = find_post(&state, &id).await?;
    if existing.creator != auth.user_id {
        return Err(PostboardError::NotAuthorized);
    }

    let fields = PostFields {
        title: form.title,
        content: form.content,
    };
    validate_request(&fields)?;

    // Without a new file the stored image stays.
    let new_image = match form.image {
        Some(image) => Some(store_image(&state, image, &form.origin).await?),
        None => {
            if let Some(sent) = form.image_path.as_deref().filter(|p| !p.is_empty()) {
                if sent != existing.image_path {
                    return Err(PostboardError::validation(
                        "Image path does not match the stored image",
                    ));
                }
            }
            None
        }
    };
    let image_path = new_image.as_deref().unwrap_or(existing.image_path.as_str());

    let result = posts::update_post(
        &state.db.pool,
        existing.id,
        auth.user_id,
        &fields.title,
        &fields.content,
        image_path,
    )
    .await;
    if !matches!(result, Ok(n) if n > 0) {
        if let Some(stored) = &new_image {
            remove_image(&state, stored).await;
        }
        result?;
        return Err(PostboardError::NotAuthorized);
    }

    if new_image.is_some() {
        remove_image(&state, &existing.image_path).await;
    }

    tracing::info!(post_id = %existing.id, "Post updated");
    Ok(Json(MessageResponse {
        message: "Update successful!",
    }))
}

// ============================================================
// GET /posts
// ============================================================

async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostsQuery>,
) -> PostboardResult<Json<PostsPage>> {
    let posts = match (query.pagesize, query.page) {
        (Some(size), Some(page)) => {
            let size = size.clamp(1, state.limits.max_page_size.max(1));
            posts::list_page(&state.db.pool, size, page.max(1)).await?
        }
        _ => posts::list_all(&state.db.pool).await?,
    };
    let max_posts = posts::count(&state.db.pool).await?;

    Ok(Json(PostsPage {
        message: "Posts fetched successfully!".into(),
        posts,
        max_posts,
    }))
}

// ============================================================
// GET /posts/{id}
// ============================================================

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> PostboardResult<Json<Post>> {
    Ok(Json(find_post(&state, &id).await?))
}

// ============================================================
// DELETE /posts/{id}
// ============================================================

async fn delete_post(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> PostboardResult<Json<MessageResponse>> {
    let existing = find_post(&state, &id).await?;
    if existing.creator != auth.user_id {
        return Err(PostboardError::NotAuthorized);
    }

    if posts::delete_post(&state.db.pool, existing.id, auth.user_id).await? == 0 {
        return Err(PostboardError::NotAuthorized);
    }
    remove_image(&state, &existing.image_path).await;

    tracing::info!(post_id = %existing.id, "Post deleted");
    Ok(Json(MessageResponse {
        message: "Deletion successful!",
    }))
}

// ============================================================
// Helpers
// ============================================================

/// Load a post by its path parameter; malformed IDs are simply not found.
async fn find_post(state: &AppState, id: &str) -> PostboardResult<Post> {
    let not_found = || PostboardError::not_found("Post");
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    posts::find_by_id(&state.db.pool, id).await?.ok_or_else(not_found)
}

async fn store_image(state: &AppState, image: ImageUpload, origin: &str) -> PostboardResult<String> {
    let key = state
        .storage
        .put_object(&image.key, image.data, &image.content_type)
        .await?;
    Ok(state.storage.public_url(origin, &key))
}

/// Best-effort removal of an image we stored; foreign links are left alone.
async fn remove_image(state: &AppState, image_path: &str) {
    let Some(key) = state.storage.key_from_url(image_path) else {
        return;
    };
    if let Err(e) = state.storage.delete_object(&key).await {
        tracing::warn!(key, error = %e, "Failed to delete stored image");
    }
}
