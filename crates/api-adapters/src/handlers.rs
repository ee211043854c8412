//! # Handlers
//!
//! One function per route. Each handler extracts, calls a single service
//! operation and shapes the response.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use domains::{Announcement, AnnouncementDraft, ContactMessage, Event, EventDraft, UploadLimit};
use serde::Deserialize;
use serde_json::{json, Value};
use services::MAX_IMAGES;

use crate::error::{ApiError, OrReport};
use crate::extract::{authorization, AdminSession, ClientIp};
use crate::multipart::{read_form, FilePolicy};
use crate::state::ApiState;

const EVENT_FILES: &[FilePolicy] = &[FilePolicy {
    field: "images",
    limit: UploadLimit::EVENT_IMAGE,
    max_count: MAX_IMAGES,
}];

const ANNOUNCEMENT_FILES: &[FilePolicy] = &[
    FilePolicy {
        field: "images",
        limit: UploadLimit::ANNOUNCEMENT_IMAGE,
        max_count: MAX_IMAGES,
    },
    FilePolicy {
        field: "file",
        limit: UploadLimit::ANNOUNCEMENT_FILE,
        max_count: 1,
    },
];

fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid(rejection.body_text()))
}

fn multipart_body(body: Result<Multipart, MultipartRejection>) -> Result<Multipart, ApiError> {
    body.map_err(|rejection| ApiError::invalid(rejection.body_text()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<ApiState>,
    ClientIp(client): ClientIp,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let request = json_body(body)?;
    let token = state
        .auth
        .login(&client, &request.username, &request.password)
        .or_report("Login failed")?;
    Ok(Json(json!({ "token": token })))
}

pub async fn logout(State(state): State<ApiState>, headers: HeaderMap) -> Json<Value> {
    state.auth.logout(authorization(&headers));
    ok()
}

pub async fn list_events(State(state): State<ApiState>) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.events.list().await.or_report("Failed to load events")?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<ApiState>,
    _admin: AdminSession,
    body: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let mut form = read_form(multipart_body(body)?, EVENT_FILES).await?;
    let draft = EventDraft {
        title: form.text("title"),
        date: form.text("date"),
        description: form.text("description"),
        images: form.take_files("images"),
    };
    let event = state.events.create(draft).await.or_report("Failed to create event")?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Always `{ok:true}`: unknown or non-numeric ids are already gone.
pub async fn delete_event(
    State(state): State<ApiState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Ok(id) = id.parse::<i64>() {
        state.events.delete(id).await.or_report("Failed to delete event")?;
    }
    Ok(ok())
}

pub async fn list_announcements(
    State(state): State<ApiState>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    let announcements = state
        .announcements
        .list()
        .await
        .or_report("Failed to load announcements")?;
    Ok(Json(announcements))
}

pub async fn create_announcement(
    State(state): State<ApiState>,
    _admin: AdminSession,
    body: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Announcement>), ApiError> {
    let mut form = read_form(multipart_body(body)?, ANNOUNCEMENT_FILES).await?;
    let draft = AnnouncementDraft {
        title: form.text("title"),
        text: form.text("text"),
        images: form.take_files("images"),
        file: form.take_files("file").pop(),
    };
    let announcement = state
        .announcements
        .create(draft)
        .await
        .or_report("Failed to create announcement")?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn delete_announcement(
    State(state): State<ApiState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Ok(id) = id.parse::<i64>() {
        state
            .announcements
            .delete(id)
            .await
            .or_report("Failed to delete announcement")?;
    }
    Ok(ok())
}

pub async fn contact(
    State(state): State<ApiState>,
    body: Result<Json<ContactMessage>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let message = json_body(body)?;
    state.contact.send(message).await.or_report("Failed to send message")?;
    Ok(ok())
}

pub async fn health() -> &'static str {
    "ok"
}
