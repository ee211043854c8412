//! `ContentRepo` implementations.

pub mod json_file;

#[cfg(feature = "db-postgres")]
pub mod postgres;
