//! File extraction — turns a post submission into a [`PostForm`].
//!
//! Create and update requests arrive either as `multipart/form-data` (text
//! fields plus an `image` file) or, for updates that keep the stored image,
//! as JSON. The extractor checks the image type and size and picks its
//! storage key; handlers store it once the text fields validate.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, HeaderMap},
    Json,
};
use postboard_common::{error::PostboardError, models::post::UpdatePostRequest};
use std::sync::Arc;

use crate::AppState;

/// Image MIME types accepted for upload and the extension stored for each.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        _ => None,
    }
}

/// An image accepted by the extractor but not stored yet.
#[derive(Debug)]
pub struct ImageUpload {
    /// Storage key, `images/<name>-<unix millis>-<8 hex>.<ext>`
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// The fields of a post submission.
#[derive(Debug)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    /// Newly uploaded image, if the request carried one
    pub image: Option<ImageUpload>,
    /// Already stored image link sent back by the client
    pub image_path: Option<String>,
    /// Origin used to build links for images stored on this server
    pub origin: String,
}

impl FromRequest<Arc<AppState>> for PostForm {
    type Rejection = PostboardError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let origin = request_origin(req.headers(), state.public_url.as_deref());
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| PostboardError::validation(e.body_text()))?;
            return read_multipart(multipart, state.limits.max_image_bytes, origin).await;
        }

        let Json(body) = Json::<UpdatePostRequest>::from_request(req, state)
            .await
            .map_err(|e| PostboardError::validation(e.body_text()))?;

        Ok(PostForm {
            title: body.title,
            content: body.content,
            image: None,
            image_path: Some(body.image_path),
            origin,
        })
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    max_image_bytes: usize,
    origin: String,
) -> Result<PostForm, PostboardError> {
    let mut form = PostForm {
        title: String::new(),
        content: String::new(),
        image: None,
        image_path: None,
        origin,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PostboardError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let ext = extension_for(&content_type)
                    .ok_or_else(|| PostboardError::validation("Invalid mime type"))?;
                let file_name = field.file_name().unwrap_or("image").to_string();

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PostboardError::validation(format!("Failed to read file: {e}")))?;
                if bytes.len() > max_image_bytes {
                    return Err(PostboardError::validation(format!(
                        "Image too large: {} bytes (max {max_image_bytes} bytes)",
                        bytes.len()
                    )));
                }

                form.image = Some(ImageUpload {
                    key: storage_key(&file_name, ext),
                    content_type,
                    data: bytes.to_vec(),
                });
            }
            "title" | "content" | "imagePath" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| PostboardError::validation(format!("Invalid field '{name}': {e}")))?;
                match name.as_str() {
                    "title" => form.title = value,
                    "content" => form.content = value,
                    _ => form.image_path = Some(value),
                }
            }
            _ => {} // `id` echoes the path parameter; anything else is ignored
        }
    }

    Ok(form)
}

/// Unique key for a new upload; the random suffix keeps uploads with the
/// same name in the same millisecond apart.
fn storage_key(file_name: &str, ext: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "images/{}-{}-{}.{ext}",
        storage_name(file_name),
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

/// Lowercase the client's file name, drop its extension, and keep only
/// characters that are safe in a storage key.
fn storage_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let name: String = stem
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_'))
        .take(100)
        .collect();
    if name.is_empty() { "image".to_string() } else { name }
}

/// `scheme://host` of this server as seen by the client.
fn request_origin(headers: &HeaderMap, public_url: Option<&str>) -> String {
    if let Some(url) = public_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_uploads_get_distinct_keys() {
        let a = storage_key("First post", "png");
        let b = storage_key("First post", "png");
        assert_ne!(a, b);
        assert!(a.starts_with("images/first-post-"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn only_png_and_jpeg_are_accepted() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
    }

    #[test]
    fn storage_names_are_lowercase_and_dashed() {
        assert_eq!(storage_name("My Holiday Photo.JPG"), "my-holiday-photo");
        assert_eq!(storage_name("Cat/../Dog.png"), "catdog");
        assert_eq!(storage_name("First post"), "first-post");
        assert_eq!(storage_name(""), "image");
    }

    #[test]
    fn origin_prefers_configured_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "example.com:3000".parse().unwrap());
        assert_eq!(request_origin(&headers, None), "http://example.com:3000");
        assert_eq!(
            request_origin(&headers, Some("https://posts.example.com/")),
            "https://posts.example.com"
        );
    }
}
