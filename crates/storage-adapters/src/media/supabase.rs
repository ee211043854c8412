//! # Supabase Storage media store
//!
//! Objects go to a public bucket through the Storage REST API using the
//! service-role key. The delete handle is the object path inside the bucket.

use async_trait::async_trait;
use domains::{AppError, BlobHandle, MediaStore, Result, StoredFile, Upload};
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use super::unique_file_name;

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    pub service_key: SecretString,
    pub bucket: String,
}

pub struct SupabaseMediaStore {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseMediaStore {
    pub fn new(mut config: SupabaseConfig) -> Self {
        config.url = config.url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.config.url, self.config.bucket, path)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.config.url, self.config.bucket, path)
    }

    fn object_path(upload: &Upload) -> String {
        let name = unique_file_name(upload);
        let destination = upload.destination.trim_matches('/');
        if destination.is_empty() {
            name
        } else {
            format!("{destination}/{name}")
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.service_key.expose_secret();
        request.bearer_auth(key).header("apikey", key)
    }
}

#[async_trait]
impl MediaStore for SupabaseMediaStore {
    async fn store(&self, upload: Upload) -> Result<StoredFile> {
        upload.check()?;

        let path = Self::object_path(&upload);
        let response = self
            .authorized(self.http.post(self.object_url(&path)))
            .header(CONTENT_TYPE, upload.content_type.as_str())
            .header("x-upsert", "false")
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(AppError::storage)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("supabase upload failed with {status}: {body}")));
        }
        debug!(path = %path, "supabase object stored");

        Ok(StoredFile {
            url: self.public_url(&path),
            handle: BlobHandle::new(path, upload.kind()),
            name: upload.original_name,
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        let url = format!("{}/storage/v1/object/{}", self.config.url, self.config.bucket);
        let response = self
            .authorized(self.http.delete(url))
            .json(&json!({ "prefixes": [handle.id] }))
            .send()
            .await
            .map_err(AppError::storage)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("supabase delete failed with {status}: {body}")));
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::UploadLimit;

    fn store() -> SupabaseMediaStore {
        SupabaseMediaStore::new(SupabaseConfig {
            url: "https://proj.supabase.co/".into(),
            service_key: SecretString::from("service-key".to_string()),
            bucket: "media".into(),
        })
    }

    #[test]
    fn builds_object_and_public_urls() {
        let store = store();
        assert_eq!(
            store.object_url("events/1-a.png"),
            "https://proj.supabase.co/storage/v1/object/media/events/1-a.png"
        );
        assert_eq!(
            store.public_url("events/1-a.png"),
            "https://proj.supabase.co/storage/v1/object/public/media/events/1-a.png"
        );
    }

    #[test]
    fn object_paths_live_under_the_destination() {
        let mut upload = Upload::new("a.png", "image/png", vec![1u8], UploadLimit::EVENT_IMAGE);
        upload.destination = "events".into();
        let path = SupabaseMediaStore::object_path(&upload);
        assert!(path.starts_with("events/"));
        assert!(path.ends_with(".png"));

        upload.destination.clear();
        assert!(!SupabaseMediaStore::object_path(&upload).contains('/'));
    }
}
