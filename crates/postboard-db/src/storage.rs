//! Image storage — local filesystem or an S3-compatible bucket.
//!
//! Local mode writes objects under `data_dir` and the API serves them back
//! from `/images/...`. When an endpoint is configured, objects go to the
//! bucket through `aws-sdk-s3` and links point at the bucket directly.

use anyhow::{Context, Result};
use aws_sdk_s3::{
    config::{Builder as S3Builder, Credentials, Region},
    primitives::ByteStream,
    Client,
};
use postboard_common::config::StorageConfig;
use std::path::{Component, Path, PathBuf};

#[derive(Clone)]
enum Backend {
    Local { root: PathBuf },
    S3 { inner: Client, bucket: String, endpoint: String },
}

/// Storage client shared by the upload and file-serving routes.
#[derive(Clone)]
pub struct StorageClient {
    backend: Backend,
}

impl StorageClient {
    /// Initialise client from config.
    pub fn new(cfg: &StorageConfig) -> Self {
        if cfg.is_local() {
            return Self::local(&cfg.data_dir);
        }

        let creds = Credentials::new(
            &cfg.access_key,
            &cfg.secret_key,
            None, // session token
            None, // expiry
            "postboard-storage",
        );

        let s3_cfg = S3Builder::new()
            .endpoint_url(&cfg.endpoint)
            .credentials_provider(creds)
            .region(Region::new(cfg.region.clone()))
            // Force path-style URLs (required for MinIO)
            .force_path_style(true)
            .build();

        Self {
            backend: Backend::S3 {
                inner: Client::from_conf(s3_cfg),
                bucket: cfg.bucket.clone(),
                endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            },
        }
    }

    /// Client rooted at a local directory.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Local { root: root.into() },
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.backend, Backend::Local { .. })
    }

    // ------------------------------------------------------------------
    // Core upload
    // ------------------------------------------------------------------

    /// Store bytes under the given key. Returns the key on success.
    pub async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        match &self.backend {
            Backend::Local { root } => {
                let path = resolve(root, key)?;
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                tokio::fs::write(&path, data)
                    .await
                    .with_context(|| format!("Failed to write {key} to local storage"))?;
            }
            Backend::S3 { inner, bucket, .. } => {
                inner
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .content_type(content_type)
                    .body(ByteStream::from(data))
                    .send()
                    .await
                    .with_context(|| format!("Failed to upload {key} to object storage"))?;
            }
        }

        tracing::debug!(key, "Stored object");
        Ok(key.to_string())
    }

    // ------------------------------------------------------------------
    // URL generation
    // ------------------------------------------------------------------

    /// Public link for a stored key. `base` is this server's own origin and
    /// is only used in local mode.
    pub fn public_url(&self, base: &str, key: &str) -> String {
        match &self.backend {
            Backend::Local { .. } => format!("{}/{}", base.trim_end_matches('/'), key),
            Backend::S3 { bucket, endpoint, .. } => format!("{endpoint}/{bucket}/{key}"),
        }
    }

    /// Recover the storage key from a link produced by [`Self::public_url`].
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let marker = match &self.backend {
            Backend::Local { .. } => "/images/".to_string(),
            Backend::S3 { bucket, .. } => format!("/{bucket}/"),
        };
        let idx = url.find(&marker)?;
        let key = match &self.backend {
            Backend::Local { .. } => &url[idx + 1..],
            Backend::S3 { .. } => &url[idx + marker.len()..],
        };
        (!key.is_empty()).then(|| key.to_string())
    }

    // ------------------------------------------------------------------
    // Reads (local mode only)
    // ------------------------------------------------------------------

    /// Read a locally stored object and guess its content type.
    ///
    /// Returns `Ok(None)` when the key does not exist or storage is remote.
    pub async fn read_local_file(&self, key: &str) -> Result<Option<(Vec<u8>, String)>> {
        let Backend::Local { root } = &self.backend else {
            return Ok(None);
        };
        let Ok(path) = resolve(root, key) else {
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string();
                Ok(Some((bytes, content_type)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {key}")),
        }
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Delete an object by its storage key.
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        match &self.backend {
            Backend::Local { root } => {
                let path = resolve(root, key)?;
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e).with_context(|| format!("Failed to delete {key}")),
                }
            }
            Backend::S3 { inner, bucket, .. } => {
                inner
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .with_context(|| format!("Failed to delete {key} from object storage"))?;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Bucket management (startup helper)
    // ------------------------------------------------------------------

    /// Ensure the bucket (or local directory) exists; create it if absent.
    pub async fn ensure_bucket(&self) -> Result<()> {
        match &self.backend {
            Backend::Local { root } => {
                tokio::fs::create_dir_all(root)
                    .await
                    .with_context(|| format!("Failed to create {}", root.display()))?;
                Ok(())
            }
            Backend::S3 { inner, bucket, .. } => {
                if inner.head_bucket().bucket(bucket).send().await.is_ok() {
                    tracing::debug!(%bucket, "Bucket already exists");
                    return Ok(());
                }
                tracing::info!(%bucket, "Bucket does not exist, creating");
                inner
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .context("Failed to create object storage bucket")?;
                Ok(())
            }
        }
    }
}

/// Join a key onto the storage root, refusing anything that escapes it.
fn resolve(root: &Path, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    if key.is_empty()
        || !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
    {
        anyhow::bail!("Invalid storage key: {key}");
    }
    Ok(root.join(relative))
}
