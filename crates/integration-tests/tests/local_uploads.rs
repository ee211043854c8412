//! The filesystem media store behind the real router: files land on disk,
//! are served under `/uploads` and disappear with their record.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{Part, TestApp};

#[tokio::test]
async fn uploaded_image_is_served_and_removed_with_its_event() {
    let app = TestApp::builder().local_media().build();
    let token = app.login().await;

    let (status, event) = app
        .post_form(
            "/api/events",
            Some(&token),
            &[
                Part::text("title", "Kermes"),
                Part::text("date", "2025-05-01"),
                Part::image("images", "Stand.PNG"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{event}");

    let url = event["imageUrl"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    let (status, bytes) = app
        .send_raw(Request::get(url.as_str()).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(bytes.starts_with(b"\x89PNG"));

    let on_disk = app.dir.path().join("uploads").join(url.trim_start_matches("/uploads/"));
    assert!(on_disk.exists());

    let id = event["id"].as_i64().unwrap();
    let (status, _) = app.delete(&format!("/api/events/{id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!on_disk.exists());

    let (status, _) = app
        .send_raw(Request::get(url.as_str()).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_persist_as_a_json_array_on_disk() {
    let app = TestApp::new();
    let token = app.login().await;

    let (status, _) = app
        .post_form(
            "/api/events",
            Some(&token),
            &[Part::text("title", "Movie night"), Part::text("date", "2025-05-09")],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let raw = std::fs::read_to_string(app.dir.path().join("data").join("events.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["title"], "Movie night");
}
