//! # api-adapters
//!
//! The HTTP surface of the dorm site. Handlers translate requests into
//! service calls and `AppError`s into JSON error bodies; they never pick a
//! storage backend themselves.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod multipart;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use router::{build_router, RouterOptions, StaticUploads, BODY_LIMIT};
#[cfg(feature = "web-axum")]
pub use state::ApiState;
