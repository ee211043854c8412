//! Flat-file content repository: one pretty-printed JSON array per collection.
//!
//! Every write, including the heal of a missing file, runs under an
//! in-process mutex. Files are replaced via rename from a unique temp file,
//! so a reader never sees a half-written array.
//! Two processes sharing one data directory still race last-writer-wins.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domains::{AppError, ContentRepo, Record, Result};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

pub struct JsonFileRepo<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T: Record> JsonFileRepo<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    /// `<dir>/<collection>.json`, e.g. `data/events.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", T::COLLECTION)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file does not exist yet.
    async fn read(&self) -> Result<Option<Vec<T>>> {
        match fs::read(&self.path).await {
            Ok(data) => serde_json::from_slice(&data).map(Some).map_err(|e| {
                AppError::Storage(format!("{} is not a valid {} array: {e}", self.path.display(), T::COLLECTION))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(e)),
        }
    }

    /// A missing file heals itself: it is created empty and read as empty.
    /// Callers must hold `write_lock`.
    async fn load_or_heal(&self) -> Result<Vec<T>> {
        match self.read().await? {
            Some(records) => Ok(records),
            None => {
                debug!(path = %self.path.display(), "collection file missing, creating it");
                self.save(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    /// Callers must hold `write_lock`. Each save gets its own temp file.
    async fn save(&self, records: &[T]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(AppError::storage)?;
        }
        let data = serde_json::to_vec_pretty(records).map_err(AppError::storage)?;
        let tmp = self.path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AppError::storage(e));
        }
        fs::rename(&tmp, &self.path).await.map_err(AppError::storage)
    }
}

#[async_trait]
impl<T: Record> ContentRepo<T> for JsonFileRepo<T> {
    async fn ensure_initialized(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if fs::try_exists(&self.path).await.map_err(AppError::storage)? {
            return Ok(());
        }
        self.save(&[]).await?;
        info!(path = %self.path.display(), "initialised empty collection");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<T>> {
        // Renames are atomic, so only the heal needs the lock.
        let mut records = match self.read().await? {
            Some(records) => records,
            None => {
                let _guard = self.write_lock.lock().await;
                self.load_or_heal().await?
            }
        };
        T::order_for_listing(&mut records);
        Ok(records)
    }

    async fn insert(&self, mut record: T) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_or_heal().await?;
        if record.id() == 0 {
            record.set_id(chrono::Utc::now().timestamp_millis());
        }
        records.push(record.clone());
        self.save(&records).await?;
        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<Option<T>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_or_heal().await?;
        let Some(pos) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let removed = records.remove(pos);
        self.save(&records).await?;
        Ok(Some(removed))
    }
}
