//! Blob backends for uploaded document bytes.
//!
//! `S3BlobStore` serves downloads as short-lived presigned URLs;
//! `FsBlobStore` reads the bytes back and the handler streams them.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

const PRESIGN_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 request failed: {0}")]
    S3(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),
}

/// How a caller gets at stored bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobAccess {
    Redirect(String),
    Inline(Bytes),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Removing a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn open(&self, key: &str) -> Result<BlobAccess, StorageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3 / MinIO
// ────────────────────────────────────────────────────────────────────────────

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload of {key} failed: {e}")))?;

        info!("Uploaded blob to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete of {key} failed: {e}")))?;
        Ok(())
    }

    async fn open(&self, key: &str) -> Result<BlobAccess, StorageError> {
        let presigning = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| StorageError::S3(format!("presigning config: {e}")))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::S3(format!("presigning {key} failed: {e}")))?;
        Ok(BlobAccess::Redirect(request.uri().to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local filesystem
// ────────────────────────────────────────────────────────────────────────────

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are relative paths of plain segments; anything that could
    /// climb out of `root` is refused.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !plain {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        info!("Wrote blob to {}", path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, key: &str) -> Result<BlobAccess, StorageError> {
        let path = self.resolve(key)?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(BlobAccess::Inline(Bytes::from(bytes)))
    }
}
