//! Filesystem photo store.
//!
//! Photos land under a configurable root with generated names; the returned
//! reference is the public `/uploads/<name>` path a reverse proxy or static
//! file service serves from that root.

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::ports::{PhotoStore, PhotoStoreError, PhotoUpload};
use crate::domain::request::PhotoReference;

/// Stores photos under `root`, one file per upload.
pub struct FsPhotoStore {
    root: PathBuf,
}

impl FsPhotoStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn extension(upload: &PhotoUpload) -> &'static str {
        match upload.content_type.as_deref() {
            Some("image/jpeg" | "image/jpg") => "jpg",
            Some("image/png") => "png",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            _ => "bin",
        }
    }
}

#[async_trait]
impl PhotoStore for FsPhotoStore {
    async fn save(&self, upload: PhotoUpload) -> Result<PhotoReference, PhotoStoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|error| PhotoStoreError::io(format!("create upload dir: {error}")))?;

        let name = format!("{}.{}", Uuid::new_v4(), Self::extension(&upload));
        let path = self.root.join(&name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|error| PhotoStoreError::io(format!("write photo: {error}")))?;
        Ok(PhotoReference::new(format!("/uploads/{name}")))
    }
}
