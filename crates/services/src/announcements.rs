//! Announcement use cases.

use std::sync::Arc;

use domains::{
    Announcement, AnnouncementDraft, AppError, Clock, ContentRepo, MediaStore, Record, Result,
};

use crate::content::{self, MAX_IMAGES};

pub struct AnnouncementService {
    repo: Arc<dyn ContentRepo<Announcement>>,
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
}

impl AnnouncementService {
    pub fn new(
        repo: Arc<dyn ContentRepo<Announcement>>,
        media: Arc<dyn MediaStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, media, clock }
    }

    /// Newest first by `created_at`, regardless of stored order.
    pub async fn list(&self) -> Result<Vec<Announcement>> {
        let mut list = self.repo.list().await?;
        Announcement::order_for_listing(&mut list);
        Ok(list)
    }

    pub async fn create(&self, draft: AnnouncementDraft) -> Result<Announcement> {
        let title = draft.title.trim();
        let text = draft.text.trim();
        if title.is_empty() || text.is_empty() {
            return Err(AppError::InvalidInput("title and text are required".into()));
        }
        if draft.images.len() > MAX_IMAGES {
            return Err(AppError::InvalidInput(format!("at most {MAX_IMAGES} images are allowed")));
        }

        // Images and the attachment go up as one batch; the attachment, if
        // any, is the last entry.
        let has_file = draft.file.is_some();
        let mut uploads = draft.images;
        uploads.extend(draft.file);
        let uploads = content::prepare(uploads, Announcement::COLLECTION)?;
        let mut images = content::store_all(self.media.as_ref(), uploads).await?;
        let file = if has_file { images.pop() } else { None };

        let now = self.clock.now();
        let announcement = Announcement {
            id: now.timestamp_millis(),
            title: title.to_string(),
            text: text.to_string(),
            created_at: now,
            images,
            file,
        };
        content::persist(self.repo.as_ref(), self.media.as_ref(), announcement).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        content::remove(self.repo.as_ref(), self.media.as_ref(), id).await
    }
}
