//! dorm-site/crates/domains/src/lib.rs
//!
//! The central domain model and port definitions for the dorm site.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
