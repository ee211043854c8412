use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use domains::{UploadLimit, MIB};
use services::MAX_IMAGES;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::middleware::{cors_policy, trace_layer};
use crate::state::ApiState;

/// Largest accepted request: a full announcement gallery, its attachment
/// and form overhead.
pub const BODY_LIMIT: usize = MAX_IMAGES * UploadLimit::ANNOUNCEMENT_IMAGE.max_bytes
    + UploadLimit::ANNOUNCEMENT_FILE.max_bytes
    + MIB;

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub cors_origins: Vec<String>,
    /// Serve locally stored uploads read-only under this URL prefix.
    pub uploads: Option<StaticUploads>,
}

#[derive(Debug, Clone)]
pub struct StaticUploads {
    pub dir: PathBuf,
    pub url_prefix: String,
}

pub fn build_router(state: ApiState, options: &RouterOptions) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/admin/login", post(handlers::login))
        .route("/api/admin/logout", post(handlers::logout))
        .route("/api/events", get(handlers::list_events).post(handlers::create_event))
        .route("/api/events/{id}", delete(handlers::delete_event))
        .route(
            "/api/announcements",
            get(handlers::list_announcements).post(handlers::create_announcement),
        )
        .route("/api/announcements/{id}", delete(handlers::delete_announcement))
        .route("/api/contact", post(handlers::contact))
        .with_state(state);

    if let Some(uploads) = &options.uploads {
        app = app.nest_service(&uploads.url_prefix, ServeDir::new(&uploads.dir));
    }

    app.layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors_policy(&options.cors_origins))
        .layer(trace_layer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_fits_the_largest_valid_announcement() {
        let largest = MAX_IMAGES * UploadLimit::ANNOUNCEMENT_IMAGE.max_bytes
            + UploadLimit::ANNOUNCEMENT_FILE.max_bytes;
        assert!(BODY_LIMIT > largest);
        assert_eq!(BODY_LIMIT, 326 * MIB);
    }
}
