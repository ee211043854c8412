//! # Cloudinary media store
//!
//! Signed uploads to Cloudinary's REST API. The delete handle is the
//! provider's `public_id` plus the resource type it was uploaded under;
//! destroying with the wrong resource type silently misses the asset.
//!
//! Signatures use SHA-256, so the product environment must be set to
//! SHA-256 signing.

use async_trait::async_trait;
use domains::{AppError, BlobHandle, MediaStore, Result, StoredFile, Upload};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    /// Top-level folder; uploads go to `<folder>/<destination>`.
    pub folder: String,
}

pub struct CloudinaryMediaStore {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Cloudinary request signature: non-empty params sorted by name, joined as
/// `k=v&k=v`, secret appended, SHA-256 hex digest.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{joined}{api_secret}").as_bytes()))
}

/// Best human-readable message out of a failed API response.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!("{}/{}/{}/{}", API_BASE, self.config.cloud_name, resource_type, action)
    }

    fn folder_for(&self, destination: &str) -> String {
        match (self.config.folder.as_str(), destination) {
            ("", d) => d.to_string(),
            (f, "") => f.to_string(),
            (f, d) => format!("{f}/{d}"),
        }
    }

    async fn failure(context: &str, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        AppError::Storage(format!("cloudinary {context} failed with {status}: {}", error_message(&body)))
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn store(&self, upload: Upload) -> Result<StoredFile> {
        upload.check()?;

        let kind = upload.kind();
        let folder = self.folder_for(&upload.destination);
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", folder.as_str()), ("timestamp", timestamp.as_str())],
            self.config.api_secret.expose_secret(),
        );

        let part = Part::bytes(upload.bytes.to_vec()).file_name(upload.original_name.clone());
        let part = match part.mime_str(&upload.content_type) {
            Ok(part) => part,
            Err(_) => Part::bytes(upload.bytes.to_vec()).file_name(upload.original_name.clone()),
        };
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder)
            .text("signature", signature);

        let response = self
            .http
            .post(self.endpoint(kind.as_str(), "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(AppError::storage)?;
        if !response.status().is_success() {
            return Err(Self::failure("upload", response).await);
        }
        let body: UploadResponse = response.json().await.map_err(AppError::storage)?;
        debug!(public_id = %body.public_id, "cloudinary upload stored");

        Ok(StoredFile {
            url: body.secure_url,
            name: upload.original_name,
            handle: BlobHandle::new(body.public_id, kind),
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", handle.id.as_str()), ("timestamp", timestamp.as_str())],
            self.config.api_secret.expose_secret(),
        );
        let params = [
            ("public_id", handle.id.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint(handle.kind.as_str(), "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(AppError::storage)?;
        if !response.status().is_success() {
            return Err(Self::failure("destroy", response).await);
        }
        let body: DestroyResponse = response.json().await.map_err(AppError::storage)?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(AppError::Storage(format!("cloudinary destroy returned '{other}'"))),
        }
    }

    fn backend(&self) -> &'static str {
        "cloudinary"
    }
}
