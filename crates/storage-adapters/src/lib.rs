//! # storage-adapters
//!
//! Content repositories and blob stores behind the `domains` ports.
//! Which ones exist is decided by cargo features; which one runs is decided
//! by configuration at startup.

pub mod db;
pub mod media;

pub use db::json_file::JsonFileRepo;
pub use media::local::LocalMediaStore;

#[cfg(feature = "db-postgres")]
pub use db::postgres::PgContentRepo;

#[cfg(feature = "media-cloudinary")]
pub use media::cloudinary::{CloudinaryConfig, CloudinaryMediaStore};

#[cfg(feature = "media-supabase")]
pub use media::supabase::{SupabaseConfig, SupabaseMediaStore};
