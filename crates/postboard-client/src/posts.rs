//! Posts data service.
//!
//! Wraps the `/posts` endpoints, renames the backend `_id` to `id`, keeps
//! the last fetched page, and republishes it on a broadcast stream.

use reqwest::multipart::{Form, Part};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;

use crate::{
    error::Result,
    rest::RestClient,
    routing::Navigator,
    types::{
        CreatePostResponse, ImageFile, MessageResponse, Post, PostDto, PostImage, PostsResponse,
        PostsUpdate, UpdatePostBody,
    },
};

const UPDATES_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct PostsService {
    rest: RestClient,
    navigator: Arc<dyn Navigator>,
    posts: Arc<Mutex<Vec<Post>>>,
    updates: broadcast::Sender<PostsUpdate>,
}

impl PostsService {
    pub fn new(rest: RestClient, navigator: Arc<dyn Navigator>) -> Self {
        let (updates, _) = broadcast::channel(UPDATES_CAPACITY);
        Self {
            rest,
            navigator,
            posts: Arc::new(Mutex::new(Vec::new())),
            updates,
        }
    }

    /// Subscribe to list snapshots. Only fetches made after subscribing are
    /// delivered.
    pub fn posts_update_listener(&self) -> broadcast::Receiver<PostsUpdate> {
        self.updates.subscribe()
    }

    /// Copy of the last fetched page.
    pub fn posts(&self) -> Vec<Post> {
        self.posts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `GET /posts?pagesize=N&page=M`, then publish the result.
    pub async fn get_posts(&self, posts_per_page: u32, current_page: u32) -> Result<PostsUpdate> {
        let path = format!("/posts?pagesize={posts_per_page}&page={current_page}");
        let resp: PostsResponse = self.rest.get(&path).await?;

        let posts: Vec<Post> = resp.posts.into_iter().map(Post::from).collect();
        *self.posts.lock().unwrap_or_else(PoisonError::into_inner) = posts.clone();

        let update = PostsUpdate {
            posts,
            post_count: resp.max_posts,
        };
        // No subscribers is fine.
        let _ = self.updates.send(update.clone());
        Ok(update)
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        let dto: PostDto = self.rest.get(&format!("/posts/{id}")).await?;
        Ok(dto.into())
    }

    /// Multipart `POST /posts`, then back to the post list.
    pub async fn add_post(&self, title: &str, content: &str, image: ImageFile) -> Result<Post> {
        let form = post_form(None, title, content, image)?;
        let resp: CreatePostResponse = self.rest.post_multipart("/posts", form).await?;
        tracing::debug!(message = %resp.message, post_id = %resp.post.id, "Post added");
        self.navigator.navigate_by_url("/");
        Ok(resp.post.into())
    }

    /// `PUT /posts/{id}`: multipart when a new image is picked, JSON with the
    /// stored path otherwise. Then back to the post list.
    pub async fn update_post(
        &self,
        id: &str,
        title: &str,
        content: &str,
        image: PostImage,
    ) -> Result<()> {
        let path = format!("/posts/{id}");
        let resp: MessageResponse = match image {
            PostImage::Upload(file) => {
                let form = post_form(Some(id), title, content, file)?;
                self.rest.put_multipart(&path, form).await?
            }
            PostImage::Existing(image_path) => {
                let body = UpdatePostBody {
                    id,
                    title,
                    content,
                    image_path: &image_path,
                };
                self.rest.put_json(&path, &body).await?
            }
        };
        tracing::debug!(message = %resp.message, post_id = id, "Post updated");
        self.navigator.navigate_by_url("/");
        Ok(())
    }

    /// `DELETE /posts/{id}`. The caller decides what to refresh.
    pub async fn delete_post(&self, id: &str) -> Result<()> {
        let resp: MessageResponse = self.rest.delete(&format!("/posts/{id}")).await?;
        tracing::debug!(message = %resp.message, post_id = id, "Post deleted");
        Ok(())
    }
}

fn post_form(id: Option<&str>, title: &str, content: &str, image: ImageFile) -> Result<Form> {
    let part = Part::bytes(image.bytes)
        .file_name(title.to_owned())
        .mime_str(&image.content_type)?;
    let mut form = Form::new();
    if let Some(id) = id {
        form = form.text("id", id.to_owned());
    }
    Ok(form
        .text("title", title.to_owned())
        .text("content", content.to_owned())
        .part("image", part))
}
