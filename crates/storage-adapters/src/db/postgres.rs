//! # Postgres content repository
//!
//! Maps events and announcements onto relational tables. Image lists are
//! JSONB columns of `{url, name, handle}`; the announcement attachment is
//! spread over `file_*` columns so its provider id is queryable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{
    Announcement, AppError, BlobHandle, BlobKind, ContentRepo, Event, Result, StoredFile,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;

pub struct PgContentRepo {
    pool: PgPool,
}

impl PgContentRepo {
    /// Connects and applies the bundled migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(AppError::storage)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(AppError::storage)?;
        info!("postgres content store ready");
        Ok(Self { pool })
    }
}

fn parse_kind(raw: &str) -> BlobKind {
    match raw {
        "image" => BlobKind::Image,
        _ => BlobKind::Raw,
    }
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let images: Json<Vec<StoredFile>> = row.try_get("images").map_err(AppError::storage)?;
    Ok(Event {
        id: row.try_get("id").map_err(AppError::storage)?,
        title: row.try_get("title").map_err(AppError::storage)?,
        date: row.try_get("event_date").map_err(AppError::storage)?,
        description: row.try_get("description").map_err(AppError::storage)?,
        images: images.0,
    })
}

fn announcement_from_row(row: &PgRow) -> Result<Announcement> {
    let images: Json<Vec<StoredFile>> = row.try_get("images").map_err(AppError::storage)?;
    let file_url: Option<String> = row.try_get("file_url").map_err(AppError::storage)?;
    let file = match file_url {
        Some(url) => {
            let name: Option<String> = row.try_get("file_name").map_err(AppError::storage)?;
            let handle: Option<String> = row.try_get("file_handle").map_err(AppError::storage)?;
            let kind: Option<String> = row.try_get("file_kind").map_err(AppError::storage)?;
            let kind = kind.as_deref().map(parse_kind).unwrap_or(BlobKind::Raw);
            let handle = match handle {
                Some(id) => BlobHandle::new(id, kind),
                None => BlobHandle::from_legacy_url(&url, kind),
            };
            Some(StoredFile {
                url,
                name: name.unwrap_or_default(),
                handle,
            })
        }
        None => None,
    };
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(AppError::storage)?;

    Ok(Announcement {
        id: row.try_get("id").map_err(AppError::storage)?,
        title: row.try_get("title").map_err(AppError::storage)?,
        text: row.try_get("body").map_err(AppError::storage)?,
        created_at,
        images: images.0,
        file,
    })
}

const EVENT_COLUMNS: &str = "id, title, event_date, description, images";
const ANNOUNCEMENT_COLUMNS: &str =
    "id, title, body, created_at, images, file_url, file_name, file_handle, file_kind";

#[async_trait]
impl ContentRepo<Event> for PgContentRepo {
    /// The schema is owned by the migrations run in `connect`.
    async fn ensure_initialized(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY seq"))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::storage)?;
        rows.iter().map(event_from_row).collect()
    }

    async fn insert(&self, mut event: Event) -> Result<Event> {
        if event.id == 0 {
            event.id = Utc::now().timestamp_millis();
        }
        sqlx::query(
            "INSERT INTO events (id, title, event_date, description, images) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.date)
        .bind(&event.description)
        .bind(Json(&event.images))
        .execute(&self.pool)
        .await
        .map_err(AppError::storage)?;
        Ok(event)
    }

    async fn delete(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("DELETE FROM events WHERE id = $1 RETURNING {EVENT_COLUMNS}"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::storage)?;
        row.as_ref().map(event_from_row).transpose()
    }
}

#[async_trait]
impl ContentRepo<Announcement> for PgContentRepo {
    async fn ensure_initialized(&self) -> Result<()> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Announcement>> {
        let rows = sqlx::query(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::storage)?;
        rows.iter().map(announcement_from_row).collect()
    }

    async fn insert(&self, mut ann: Announcement) -> Result<Announcement> {
        if ann.id == 0 {
            ann.id = Utc::now().timestamp_millis();
        }
        let file = ann.file.as_ref();
        sqlx::query(
            "INSERT INTO announcements \
             (id, title, body, created_at, images, file_url, file_name, file_handle, file_kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(ann.id)
        .bind(&ann.title)
        .bind(&ann.text)
        .bind(ann.created_at)
        .bind(Json(&ann.images))
        .bind(file.map(|f| f.url.as_str()))
        .bind(file.map(|f| f.name.as_str()))
        .bind(file.map(|f| f.handle.id.as_str()))
        .bind(file.map(|f| f.handle.kind.as_str()))
        .execute(&self.pool)
        .await
        .map_err(AppError::storage)?;
        Ok(ann)
    }

    async fn delete(&self, id: i64) -> Result<Option<Announcement>> {
        let row = sqlx::query(&format!(
            "DELETE FROM announcements WHERE id = $1 RETURNING {ANNOUNCEMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::storage)?;
        row.as_ref().map(announcement_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_fall_back_to_raw() {
        assert_eq!(parse_kind("image"), BlobKind::Image);
        assert_eq!(parse_kind("raw"), BlobKind::Raw);
        assert_eq!(parse_kind("video"), BlobKind::Raw);
    }

    /// Needs a disposable database: `DORM_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn round_trips_an_announcement_with_attachment() {
        let url = std::env::var("DORM_TEST_DATABASE_URL").expect("DORM_TEST_DATABASE_URL");
        let repo = PgContentRepo::connect(&url).await.unwrap();

        let ann = Announcement {
            id: 0,
            title: "Test".into(),
            text: "Body".into(),
            created_at: Utc::now(),
            images: vec![],
            file: Some(StoredFile {
                url: "https://cdn.example/raw/plan.pdf".into(),
                name: "plan.pdf".into(),
                handle: BlobHandle::new("dorm-site/plan", BlobKind::Raw),
            }),
        };
        let saved = ContentRepo::<Announcement>::insert(&repo, ann).await.unwrap();
        let removed = ContentRepo::<Announcement>::delete(&repo, saved.id).await.unwrap().unwrap();
        assert_eq!(removed.file, saved.file);
    }
}
