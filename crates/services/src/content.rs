//! Upload-then-persist and remove-then-cleanup sequences shared by the
//! event and announcement services.
//!
//! One policy for every backend: inputs are validated before the first
//! upload, and blobs stored for a request that then fails are deleted
//! best-effort before the error is returned.

use domains::{ContentRepo, MediaStore, Record, Result, StoredFile, Upload};
use futures_util::future::join_all;
use tracing::{debug, info, warn};

/// Maximum number of files accepted in one `images` field.
pub const MAX_IMAGES: usize = 12;

/// Tags each upload with its destination and checks it. Nothing is stored
/// until every upload of the request has passed.
pub(crate) fn prepare(uploads: Vec<Upload>, destination: &str) -> Result<Vec<Upload>> {
    uploads
        .into_iter()
        .map(|mut upload| {
            upload.check()?;
            upload.destination = destination.to_string();
            Ok(upload)
        })
        .collect()
}

/// Stores all uploads concurrently. All-or-nothing: on any failure the
/// siblings that did succeed are discarded.
pub(crate) async fn store_all(media: &dyn MediaStore, uploads: Vec<Upload>) -> Result<Vec<StoredFile>> {
    let results = join_all(uploads.into_iter().map(|upload| media.store(upload))).await;

    let mut stored = Vec::with_capacity(results.len());
    let mut failure = None;
    for result in results {
        match result {
            Ok(file) => stored.push(file),
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }

    match failure {
        None => Ok(stored),
        Some(err) => {
            warn!(backend = media.backend(), error = %err, "upload failed, discarding siblings");
            discard(media, stored.iter()).await;
            Err(err)
        }
    }
}

/// Best-effort blob removal. Failures are logged, never returned.
pub(crate) async fn discard<'a>(media: &dyn MediaStore, files: impl IntoIterator<Item = &'a StoredFile>) {
    let deletions = files.into_iter().map(|file| async move {
        if let Err(err) = media.delete(&file.handle).await {
            warn!(
                backend = media.backend(),
                handle = %file.handle.id,
                error = %err,
                "blob cleanup failed"
            );
        }
    });
    join_all(deletions).await;
}

/// Inserts a record whose blobs are already stored, discarding the blobs if
/// the write fails.
pub(crate) async fn persist<T: Record>(
    repo: &dyn ContentRepo<T>,
    media: &dyn MediaStore,
    record: T,
) -> Result<T> {
    let files: Vec<StoredFile> = record.files().into_iter().cloned().collect();
    match repo.insert(record).await {
        Ok(saved) => {
            info!(collection = T::COLLECTION, id = saved.id(), files = files.len(), "record created");
            Ok(saved)
        }
        Err(err) => {
            warn!(collection = T::COLLECTION, error = %err, "record write failed, discarding uploads");
            discard(media, files.iter()).await;
            Err(err)
        }
    }
}

/// Removes a record, then its blobs. A missing id is a successful no-op.
pub(crate) async fn remove<T: Record>(
    repo: &dyn ContentRepo<T>,
    media: &dyn MediaStore,
    id: i64,
) -> Result<()> {
    let Some(removed) = repo.delete(id).await? else {
        debug!(collection = T::COLLECTION, id, "delete of unknown id");
        return Ok(());
    };
    discard(media, removed.files()).await;
    info!(collection = T::COLLECTION, id, "record deleted");
    Ok(())
}
