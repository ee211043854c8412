//! # Domain Models
//!
//! These structs represent the core entities of the dorm site.
//! Record ids are creation timestamps in milliseconds.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const MIB: usize = 1024 * 1024;

/// Public path under which the local backend serves uploads.
pub const LOCAL_UPLOADS_PREFIX: &str = "/uploads/";

/// Resource type of a stored blob. Remote providers need it to delete correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    Image,
    Raw,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
        }
    }
}

/// Backend-specific identifier sufficient to delete a stored blob:
/// a path relative to the uploads directory, or a provider object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobHandle {
    pub id: String,
    pub kind: BlobKind,
}

impl BlobHandle {
    pub fn new(id: impl Into<String>, kind: BlobKind) -> Self {
        Self { id: id.into(), kind }
    }

    /// Recovers a handle from a URL written before handles were persisted.
    /// Only local uploads can be recovered this way; anything else keeps the
    /// URL as its id and will fail to delete harmlessly.
    pub fn from_legacy_url(url: &str, kind: BlobKind) -> Self {
        let id = url.strip_prefix(LOCAL_UPLOADS_PREFIX).unwrap_or(url);
        Self::new(id, kind)
    }
}

/// A blob that has been stored: where to fetch it and how to delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredFileDocument")]
pub struct StoredFile {
    pub url: String,
    /// Original client-side file name, kept for display.
    pub name: String,
    pub handle: BlobHandle,
}

#[derive(Deserialize)]
struct StoredFileDocument {
    url: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    handle: Option<BlobHandle>,
}

impl From<StoredFileDocument> for StoredFile {
    fn from(doc: StoredFileDocument) -> Self {
        let handle = doc
            .handle
            .unwrap_or_else(|| BlobHandle::from_legacy_url(&doc.url, BlobKind::Image));
        Self { url: doc.url, name: doc.name, handle }
    }
}

impl StoredFile {
    fn from_legacy_url(url: String) -> Self {
        let handle = BlobHandle::from_legacy_url(&url, BlobKind::Image);
        Self { url, name: String::new(), handle }
    }
}

/// Behaviour shared by the persisted collections.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Collection name, used for storage file names and log fields.
    const COLLECTION: &'static str;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Every blob owned by the record.
    fn files(&self) -> Vec<&StoredFile>;

    /// Reorders a freshly loaded collection for presentation.
    /// The default keeps storage order.
    fn order_for_listing(_records: &mut [Self]) {}
}

/// A dated dormitory event with an image gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EventDocument", from = "EventDocument")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub description: String,
    pub images: Vec<StoredFile>,
}

impl Event {
    /// URL of the cover image, or empty when the event has no images.
    pub fn primary_image_url(&self) -> &str {
        self.images.first().map(|f| f.url.as_str()).unwrap_or_default()
    }
}

/// Wire shape of an event. `images` stays a list of URLs for existing
/// clients; the deletable handles travel alongside in `assets`. The cover
/// is written under both `imageUrl` and `primaryImageUrl`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDocument {
    id: i64,
    title: String,
    date: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    primary_image_url: String,
    #[serde(default)]
    assets: Vec<StoredFile>,
}

impl From<Event> for EventDocument {
    fn from(event: Event) -> Self {
        let image_url = event.primary_image_url().to_string();
        Self {
            id: event.id,
            title: event.title,
            date: event.date,
            description: event.description,
            images: event.images.iter().map(|f| f.url.clone()).collect(),
            primary_image_url: image_url.clone(),
            image_url,
            assets: event.images,
        }
    }
}

impl From<EventDocument> for Event {
    fn from(doc: EventDocument) -> Self {
        let images = if !doc.assets.is_empty() {
            doc.assets
        } else if !doc.images.is_empty() {
            doc.images.into_iter().map(StoredFile::from_legacy_url).collect()
        } else if !doc.image_url.is_empty() {
            vec![StoredFile::from_legacy_url(doc.image_url)]
        } else if !doc.primary_image_url.is_empty() {
            vec![StoredFile::from_legacy_url(doc.primary_image_url)]
        } else {
            Vec::new()
        };
        Self {
            id: doc.id,
            title: doc.title,
            date: doc.date,
            description: doc.description,
            images,
        }
    }
}

impl Record for Event {
    const COLLECTION: &'static str = "events";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn files(&self) -> Vec<&StoredFile> {
        self.images.iter().collect()
    }
}

/// A notice board entry with optional images and one optional attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<StoredFile>,
    #[serde(default)]
    pub file: Option<StoredFile>,
}

impl Record for Announcement {
    const COLLECTION: &'static str = "announcements";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn files(&self) -> Vec<&StoredFile> {
        self.images.iter().chain(self.file.iter()).collect()
    }

    /// Newest first, whatever order the store kept.
    fn order_for_listing(records: &mut [Self]) {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

/// Per-field upload restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimit {
    pub max_bytes: usize,
    pub images_only: bool,
}

impl UploadLimit {
    pub const EVENT_IMAGE: Self = Self { max_bytes: 8 * MIB, images_only: true };
    pub const ANNOUNCEMENT_IMAGE: Self = Self { max_bytes: 25 * MIB, images_only: true };
    pub const ANNOUNCEMENT_FILE: Self = Self { max_bytes: 25 * MIB, images_only: false };
}

/// A file received from a client, not yet stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    /// Content type as declared by the client.
    pub content_type: String,
    pub bytes: Bytes,
    pub limit: UploadLimit,
    /// Destination hint (folder or key prefix) for the storage backend.
    pub destination: String,
}

impl Upload {
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
        limit: UploadLimit,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
            limit,
            destination: String::new(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false)
    }

    pub fn kind(&self) -> BlobKind {
        if self.is_image() {
            BlobKind::Image
        } else {
            BlobKind::Raw
        }
    }

    /// Enforces the size cap and, for image-only fields, the declared type.
    pub fn check(&self) -> Result<()> {
        if self.bytes.len() > self.limit.max_bytes {
            return Err(AppError::InvalidInput(format!(
                "file '{}' exceeds the {} MiB limit",
                self.original_name,
                self.limit.max_bytes / MIB
            )));
        }
        if self.limit.images_only && !self.is_image() {
            return Err(AppError::InvalidInput(
                "only image files are accepted in the images field".into(),
            ));
        }
        Ok(())
    }
}

/// Input for creating an event.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub title: String,
    pub date: String,
    pub description: String,
    pub images: Vec<Upload>,
}

/// Input for creating an announcement.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementDraft {
    pub title: String,
    pub text: String,
    pub images: Vec<Upload>,
    pub file: Option<Upload>,
}

/// An admin session. The token it belongs to is the map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub created_at: DateTime<Utc>,
}

/// A contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<()> {
        let missing = [&self.name, &self.email, &self.message]
            .iter()
            .any(|field| field.is_empty());
        if missing {
            return Err(AppError::InvalidInput("name, email and message are required".into()));
        }
        Ok(())
    }
}
