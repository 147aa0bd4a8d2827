//! Wire and view models for posts and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post exactly as the backend sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_path: String,
    pub creator: String,
}

/// A post as the rest of the client sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_path: String,
    pub creator: String,
}

impl From<PostDto> for Post {
    fn from(dto: PostDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            content: dto.content,
            image_path: dto.image_path,
            creator: dto.creator,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub message: String,
    pub posts: Vec<PostDto>,
    pub max_posts: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostResponse {
    pub message: String,
    pub post: PostDto,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Snapshot published after every successful list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostsUpdate {
    pub posts: Vec<Post>,
    pub post_count: u64,
}

/// Raw image bytes picked by the user. The upload is named after the post
/// title, so only the MIME type travels with the bytes.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Image half of an update: either a new file or the path already stored.
#[derive(Debug, Clone)]
pub enum PostImage {
    Upload(ImageFile),
    Existing(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePostBody<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub image_path: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
    pub user_id: String,
}

/// Session persisted between runs and fed back to `auto_auth_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAuth {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub email: String,
}
