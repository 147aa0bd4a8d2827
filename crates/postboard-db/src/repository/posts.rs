//! Post repository — CRUD for posts.
//!
//! Mutations take the caller's user ID and only touch rows that user created;
//! callers read `rows_affected` to tell "not yours" from "done".

use chrono::Utc;
use postboard_common::models::post::Post;
use sqlx::SqlitePool;
use uuid::Uuid;

// ============================================================
// Create
// ============================================================

pub async fn create_post(
    pool: &SqlitePool,
    id: Uuid,
    creator: Uuid,
    title: &str,
    content: &str,
    image_path: &str,
) -> Result<Post, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, title, content, image_path, creator, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(image_path)
    .bind(creator)
    .bind(now)
    .fetch_one(pool)
    .await
}

// ============================================================
// Read
// ============================================================

/// Find a post by ID.
pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// One page of posts in creation order. `page` is 1-based.
pub async fn list_page(
    pool: &SqlitePool,
    page_size: u32,
    page: u32,
) -> Result<Vec<Post>, sqlx::Error> {
    let offset = i64::from(page_size) * i64::from(page.saturating_sub(1));
    sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY id ASC LIMIT $1 OFFSET $2")
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Every post in creation order.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

/// Total number of posts.
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// ============================================================
// Update
// ============================================================

/// Replace the editable fields of a post owned by `creator`.
pub async fn update_post(
    pool: &SqlitePool,
    id: Uuid,
    creator: Uuid,
    title: &str,
    content: &str,
    image_path: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = $3, content = $4, image_path = $5, updated_at = $6
        WHERE id = $1 AND creator = $2
        "#,
    )
    .bind(id)
    .bind(creator)
    .bind(title)
    .bind(content)
    .bind(image_path)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ============================================================
// Delete
// ============================================================

/// Delete a post owned by `creator`. Caller is responsible for the stored image.
pub async fn delete_post(pool: &SqlitePool, id: Uuid, creator: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND creator = $2")
        .bind(id)
        .bind(creator)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
