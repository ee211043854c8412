//! `MediaStore` implementations, one per storage generation.

use std::path::Path;

use domains::Upload;
use uuid::Uuid;

pub mod local;

#[cfg(feature = "media-cloudinary")]
pub mod cloudinary;

#[cfg(feature = "media-supabase")]
pub mod supabase;

/// `<unix-millis>-<random><.ext>`. The extension comes from the client file
/// name, or from the declared content type when the name has none.
pub(crate) fn unique_file_name(upload: &Upload) -> String {
    let ext = Path::new(&upload.original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&upload.content_type)
                .and_then(|exts| exts.first())
                .map(|e| e.to_string())
        });

    let stem = format!(
        "{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &Uuid::new_v4().simple().to_string()[..12]
    );
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::UploadLimit;

    #[test]
    fn names_are_unique_and_keep_a_safe_extension() {
        let upload = Upload::new("../../etc/passwd.JPG", "image/jpeg", vec![1u8], UploadLimit::EVENT_IMAGE);
        let a = unique_file_name(&upload);
        let b = unique_file_name(&upload);
        assert_ne!(a, b);
        assert!(a.ends_with(".jpg"));
        assert!(!a.contains('/'));
    }

    #[test]
    fn odd_extensions_are_dropped() {
        let upload = Upload::new("x.p$p", "application/x-unknown-thing", vec![1u8], UploadLimit::ANNOUNCEMENT_FILE);
        assert!(!unique_file_name(&upload).contains('.'));
    }
}
