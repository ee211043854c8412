//! Shared harness: the real router over a temp-dir JSON store, an in-memory
//! media store that records every call, and a clock the test controls.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use api_adapters::{build_router, ApiState, RouterOptions, StaticUploads};
use async_trait::async_trait;
use auth_adapters::{RandomTokenSource, StaticCredentials};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use domains::{
    Announcement, BlobHandle, Clock, Event, Mailer, MediaStore, Result, StoredFile, Upload,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use services::{
    AdminAuth, AnnouncementService, ContactService, EventService, LoginRateLimiter, ManualClock,
    SessionStore,
};
use storage_adapters::{JsonFileRepo, LocalMediaStore};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASS: &str = "s3cret";

const BOUNDARY: &str = "dorm-site-test-boundary";

/// Media store that keeps nothing but the call log.
#[derive(Default)]
pub struct RecordingMediaStore {
    counter: AtomicUsize,
    stored: Mutex<Vec<StoredFile>>,
    deleted: Mutex<Vec<BlobHandle>>,
}

impl RecordingMediaStore {
    pub fn stored(&self) -> Vec<StoredFile> {
        self.stored.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<BlobHandle> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn store(&self, upload: Upload) -> Result<StoredFile> {
        upload.check()?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("{}/{n}-{}", upload.destination, upload.original_name);
        let file = StoredFile {
            url: format!("https://media.test/{id}"),
            name: upload.original_name.clone(),
            handle: BlobHandle::new(id, upload.kind()),
        };
        self.stored.lock().unwrap().push(file.clone());
        Ok(file)
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        self.deleted.lock().unwrap().push(handle.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "recording"
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub media: Arc<RecordingMediaStore>,
    pub dir: TempDir,
}

pub struct TestAppBuilder {
    mailer: Option<Arc<dyn Mailer>>,
    local_media: bool,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            mailer: None,
            local_media: false,
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn login_from(&self, client: &str, username: &str, password: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", client)
            .body(Body::from(json!({ "username": username, "password": password }).to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Logs in as the admin and returns the bearer token.
    pub async fn login(&self) -> String {
        let (status, body) = self.login_from("10.0.0.1", ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(Method::DELETE).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, token: Option<&str>, parts: &[Part]) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::from(multipart_body(parts))).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

impl TestAppBuilder {
    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Use the real filesystem media store, served under `/uploads`.
    pub fn local_media(mut self) -> Self {
        self.local_media = true;
        self
    }

    pub fn build(self) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()));
        let shared_clock: Arc<dyn Clock> = clock.clone();
        let recording = Arc::new(RecordingMediaStore::default());

        let uploads_dir = dir.path().join("uploads");
        let mut uploads = None;
        let media: Arc<dyn MediaStore> = if self.local_media {
            std::fs::create_dir_all(&uploads_dir).unwrap();
            uploads = Some(StaticUploads {
                dir: uploads_dir.clone(),
                url_prefix: "/uploads".into(),
            });
            Arc::new(LocalMediaStore::new(uploads_dir, "/uploads"))
        } else {
            recording.clone()
        };

        let credentials = StaticCredentials::new(ADMIN_USER, SecretString::from(ADMIN_PASS.to_string()));
        let auth = AdminAuth::new(
            Arc::new(credentials),
            SessionStore::with_defaults(shared_clock.clone(), Arc::new(RandomTokenSource)),
            LoginRateLimiter::with_defaults(shared_clock.clone()),
        );

        let data_dir = dir.path().join("data");
        let state = ApiState {
            auth: Arc::new(auth),
            events: Arc::new(EventService::new(
                Arc::new(JsonFileRepo::<Event>::in_dir(&data_dir)),
                media.clone(),
                shared_clock.clone(),
            )),
            announcements: Arc::new(AnnouncementService::new(
                Arc::new(JsonFileRepo::<Announcement>::in_dir(&data_dir)),
                media,
                shared_clock,
            )),
            contact: Arc::new(ContactService::new(self.mailer)),
        };

        let options = RouterOptions {
            cors_origins: Vec::new(),
            uploads,
        };

        TestApp {
            router: build_router(state, &options),
            clock,
            media: recording,
            dir,
        }
    }
}

pub enum Part {
    Text(&'static str, String),
    File {
        field: &'static str,
        file_name: String,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl Part {
    pub fn text(name: &'static str, value: impl Into<String>) -> Self {
        Part::Text(name, value.into())
    }

    pub fn image(field: &'static str, file_name: &str) -> Self {
        Part::File {
            field,
            file_name: file_name.to_string(),
            content_type: "image/png",
            bytes: b"\x89PNG\r\n\x1a\nfake".to_vec(),
        }
    }

    pub fn file(field: &'static str, file_name: &str, content_type: &'static str, bytes: Vec<u8>) -> Self {
        Part::File {
            field,
            file_name: file_name.to_string(),
            content_type,
            bytes,
        }
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                field,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
