// src/services/images.rs

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use uuid::Uuid;

use crate::error::AppError;

/// Route under which stored images are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// One uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Stores an image and returns a stable URL for it.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn store(&self, upload: ImageUpload) -> Result<String, AppError>;
}

/// Maps an accepted image content type to the extension used on disk.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Writes images into a local directory that the router serves statically.
#[derive(Debug, Clone)]
pub struct LocalImageHost {
    dir: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalImageHost {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    async fn store(&self, upload: ImageUpload) -> Result<String, AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::Upload("uploaded file is empty".to_string()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "image exceeds the {} byte limit",
                self.max_bytes
            )));
        }
        let extension = extension_for(&upload.content_type).ok_or_else(|| {
            AppError::Upload(format!(
                "unsupported image type '{}'",
                upload.content_type
            ))
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory {:?}: {:?}", self.dir, e);
            AppError::Upload("image could not be stored".to_string())
        })?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.dir.join(&stored_name), &upload.bytes)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write image {}: {:?}", stored_name, e);
                AppError::Upload("image could not be stored".to_string())
            })?;

        tracing::info!(
            original = upload.file_name.as_deref().unwrap_or("<unnamed>"),
            stored = %stored_name,
            size = upload.bytes.len(),
            "Image stored"
        );

        Ok(format!(
            "{}{}/{}",
            self.public_base_url, UPLOADS_ROUTE, stored_name
        ))
    }
}
