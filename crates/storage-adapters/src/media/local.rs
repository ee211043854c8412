//! # Local media store
//! Filesystem implementation of `MediaStore`.
//! Files land flat in one directory that the web layer serves statically;
//! the delete handle is the file name relative to that directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domains::{AppError, BlobHandle, MediaStore, Result, StoredFile, Upload};
use tokio::fs;
use tracing::debug;

use super::unique_file_name;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root_path: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root_path).await.map_err(AppError::storage)
    }

    /// Resolves a handle inside the root, refusing anything that could
    /// escape it.
    fn resolve(&self, handle: &BlobHandle) -> Result<PathBuf> {
        let id = handle.id.as_str();
        let unsafe_id = id.is_empty() || id.contains(['/', '\\']) || id.contains("..");
        if unsafe_id {
            return Err(AppError::Storage(format!("refusing to delete '{id}' outside the uploads directory")));
        }
        Ok(self.root_path.join(id))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, upload: Upload) -> Result<StoredFile> {
        upload.check()?;
        self.ensure_root().await?;

        let name = unique_file_name(&upload);
        fs::write(self.root_path.join(&name), &upload.bytes)
            .await
            .map_err(AppError::storage)?;
        debug!(file = %name, bytes = upload.bytes.len(), "upload written");

        Ok(StoredFile {
            url: format!("{}/{}", self.url_prefix, name),
            handle: BlobHandle::new(name, upload.kind()),
            name: upload.original_name,
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        let path = self.resolve(handle)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(e)),
        }
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
