//! Multipart form reading with per-field file caps.
//!
//! Caps are enforced while the body streams in, so an oversized file is
//! rejected without being buffered whole.

use std::collections::HashMap;

use axum::extract::multipart::{Field, Multipart, MultipartError};
use bytes::{Bytes, BytesMut};
use domains::{Upload, UploadLimit, MIB};

use crate::error::ApiError;

/// Which form field carries files, how large each may be and how many.
#[derive(Debug, Clone, Copy)]
pub struct FilePolicy {
    pub field: &'static str,
    pub limit: UploadLimit,
    pub max_count: usize,
}

#[derive(Debug, Default)]
pub struct ParsedForm {
    text: HashMap<String, String>,
    files: HashMap<&'static str, Vec<Upload>>,
}

impl ParsedForm {
    /// A text field's value, empty when absent.
    pub fn text(&self, name: &str) -> String {
        self.text.get(name).cloned().unwrap_or_default()
    }

    pub fn take_files(&mut self, field: &str) -> Vec<Upload> {
        self.files.remove(field).unwrap_or_default()
    }
}

pub async fn read_form(mut multipart: Multipart, policies: &[FilePolicy]) -> Result<ParsedForm, ApiError> {
    let mut form = ParsedForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(policy) = policies.iter().find(|p| p.field == name) else {
            let value = field.text().await.map_err(malformed)?;
            form.text.insert(name, value);
            continue;
        };

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let received = form.files.get(policy.field).map_or(0, Vec::len);
        if !file_name.is_empty() && received >= policy.max_count {
            return Err(ApiError::invalid(format!(
                "at most {} file(s) are allowed in '{}'",
                policy.max_count, policy.field
            )));
        }

        let bytes = read_capped(&mut field, policy.limit.max_bytes, &file_name).await?;
        // Browsers submit an empty part for a file input left blank.
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }

        form.files
            .entry(policy.field)
            .or_default()
            .push(Upload::new(file_name, content_type, bytes, policy.limit));
    }

    Ok(form)
}

async fn read_capped(field: &mut Field<'_>, max_bytes: usize, file_name: &str) -> Result<Bytes, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(ApiError::invalid(format!(
                "file '{}' exceeds the {} MiB limit",
                file_name,
                max_bytes / MIB
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn malformed(err: MultipartError) -> ApiError {
    ApiError::invalid(format!("malformed form data: {}", err.body_text()))
}
