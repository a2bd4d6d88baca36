//! Blob store seam for uploaded job images.
//!
//! A [`BlobStore`] takes a batch of named payloads and returns one stable URI
//! per payload, in input order. Implementations live in the API crate.

use async_trait::async_trait;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of images in one job submission.
pub const MAX_UPLOAD_FILES: usize = 2_000;

/// Maximum size of a single uploaded image (20 MiB).
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// File extensions accepted as job images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One named payload to upload.
#[derive(Debug, Clone)]
pub struct BlobUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob backend error: {0}")]
    Backend(String),
}

/// Batch upload to external storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store every upload and return their URIs in the same order.
    async fn put_batch(&self, uploads: Vec<BlobUpload>) -> Result<Vec<String>, BlobError>;

    /// Backend name for logs (e.g. `"local"`, `"s3"`).
    fn backend_name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reduce a client-supplied file name to a safe object-key suffix.
///
/// Drops any directory components and replaces everything outside
/// `[A-Za-z0-9._-]` with `_`. Empty results become `"image"`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Validate that an upload looks like an image we accept.
pub fn validate_image_upload(upload: &BlobUpload) -> Result<(), CoreError> {
    if upload.bytes.is_empty() {
        return Err(CoreError::Validation(format!(
            "File '{}' is empty",
            upload.file_name
        )));
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "File '{}' exceeds {MAX_UPLOAD_BYTES} bytes",
            upload.file_name
        )));
    }
    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(CoreError::Validation(format!(
            "File '{}' is not a supported image. Must be one of: {IMAGE_EXTENSIONS:?}",
            upload.file_name
        )));
    }
    Ok(())
}

/// Validate a whole submission batch.
pub fn validate_image_batch(uploads: &[BlobUpload]) -> Result<(), CoreError> {
    if uploads.len() > MAX_UPLOAD_FILES {
        return Err(CoreError::Validation(format!(
            "A job may have at most {MAX_UPLOAD_FILES} images"
        )));
    }
    uploads.iter().try_for_each(validate_image_upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn upload(name: &str, len: usize) -> BlobUpload {
        BlobUpload {
            file_name: name.to_string(),
            content_type: None,
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\pics\\my cat.png"), "my_cat.png");
        assert_eq!(sanitize_file_name(".hidden.jpg"), "hidden.jpg");
        assert_eq!(sanitize_file_name(""), "image");
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(validate_image_upload(&upload("photo.JPG", 10)).is_ok());
    }

    #[test]
    fn non_image_rejected() {
        assert_matches!(
            validate_image_upload(&upload("notes.txt", 10)),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_image_upload(&upload("noextension", 10)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn empty_file_rejected() {
        assert_matches!(
            validate_image_upload(&upload("a.png", 0)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn batch_reports_first_bad_file() {
        let batch = vec![upload("a.png", 1), upload("b.exe", 1)];
        assert_matches!(
            validate_image_batch(&batch),
            Err(CoreError::Validation(msg)) if msg.contains("b.exe")
        );
    }
}
