//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired in by the binary.
//! Services depend only on these, never on a concrete backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{BlobHandle, ContactMessage, Record, StoredFile, Upload};

/// Persistence contract for one collection (events or announcements).
#[async_trait]
pub trait ContentRepo<T: Record>: Send + Sync {
    /// Creates the backing store empty if it does not exist yet.
    async fn ensure_initialized(&self) -> Result<()>;

    /// All records, in the collection's listing order.
    async fn list(&self) -> Result<Vec<T>>;

    /// Appends a record, assigning an id when it has none (`0`).
    async fn insert(&self, record: T) -> Result<T>;

    /// Removes by id and returns the removed record so its blobs can be
    /// cleaned up. A missing id is not an error.
    async fn delete(&self, id: i64) -> Result<Option<T>>;
}

/// Blob storage contract: store bytes, get back a URL and a deletable handle.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, upload: Upload) -> Result<StoredFile>;

    /// Best-effort removal. Callers log failures and never surface them.
    async fn delete(&self, handle: &BlobHandle) -> Result<()>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Outbound email provider for the contact form.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &ContactMessage) -> Result<()>;
}

/// Verifies admin credentials.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of opaque session tokens.
pub trait TokenSource: Send + Sync {
    fn generate(&self) -> Result<String>;
}
