//! Event use cases.

use std::sync::Arc;

use domains::{AppError, Clock, ContentRepo, Event, EventDraft, MediaStore, Record, Result};

use crate::content::{self, MAX_IMAGES};

pub struct EventService {
    repo: Arc<dyn ContentRepo<Event>>,
    media: Arc<dyn MediaStore>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    pub fn new(repo: Arc<dyn ContentRepo<Event>>, media: Arc<dyn MediaStore>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, media, clock }
    }

    /// Insertion order; events are never re-sorted.
    pub async fn list(&self) -> Result<Vec<Event>> {
        self.repo.list().await
    }

    pub async fn create(&self, draft: EventDraft) -> Result<Event> {
        // Only announcements are trimmed; a whitespace title is still a title.
        if draft.title.is_empty() || draft.date.is_empty() {
            return Err(AppError::InvalidInput("title and date are required".into()));
        }
        if draft.images.len() > MAX_IMAGES {
            return Err(AppError::InvalidInput(format!("at most {MAX_IMAGES} images are allowed")));
        }

        let uploads = content::prepare(draft.images, Event::COLLECTION)?;
        let images = content::store_all(self.media.as_ref(), uploads).await?;

        let event = Event {
            id: self.clock.now().timestamp_millis(),
            title: draft.title,
            date: draft.date,
            description: draft.description,
            images,
        };
        content::persist(self.repo.as_ref(), self.media.as_ref(), event).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        content::remove(self.repo.as_ref(), self.media.as_ref(), id).await
    }
}
