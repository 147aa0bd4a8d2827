//! Post model — a user-authored content record with one image attachment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A stored post.
///
/// The identifier goes over the wire as `_id`, the name the original document
/// store used; clients are expected to map it to their own `id` field.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,

    pub title: String,

    pub content: String,

    /// Public URL of the stored image
    pub image_path: String,

    /// ID of the user who created the post
    pub creator: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// The editable text of a post, validated on create and update.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PostFields {
    #[validate(length(min = 3, max = 200, message = "Title must be 3-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content cannot be empty"))]
    pub content: String,
}

/// JSON body for an update that keeps the already stored image.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    /// Echo of the path parameter; ignored when present.
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    pub image_path: String,
}

/// Pagination query for `GET /posts`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PostsQuery {
    pub pagesize: Option<u32>,
    /// 1-based page index
    pub page: Option<u32>,
}

/// Body of `GET /posts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsPage {
    pub message: String,
    pub posts: Vec<Post>,
    pub max_posts: i64,
}
