//! [`BlobStore`] implementations for uploaded job images.
//!
//! - [`local::LocalBlobStore`] -- files under a directory, served at `/blobs`.
//! - [`s3::S3BlobStore`] -- objects in an S3 bucket.

pub mod local;
pub mod s3;

use std::sync::Arc;

use labelpool_core::blob::{BlobError, BlobStore};

use crate::config::{BlobBackend, BlobConfig};

/// Build the blob store selected by configuration.
pub async fn build_blob_store(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, BlobError> {
    let store: Arc<dyn BlobStore> = match config.backend {
        BlobBackend::Local => Arc::new(
            local::LocalBlobStore::new(&config.local_dir, &config.public_base_url).await?,
        ),
        BlobBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| BlobError::Backend("S3_BUCKET is not configured".into()))?;
            Arc::new(s3::S3BlobStore::from_env(bucket, &config.public_base_url).await)
        }
    };
    tracing::info!(backend = store.backend_name(), "Blob store ready");
    Ok(store)
}

/// A unique object key that keeps the sanitized original name as a suffix.
pub(crate) fn object_key(file_name: &str) -> String {
    format!(
        "{}-{}",
        uuid::Uuid::now_v7(),
        labelpool_core::blob::sanitize_file_name(file_name)
    )
}

/// Join a base URL and an object key with exactly one slash.
pub(crate) fn public_uri(base_url: &str, key: &str) -> String {
    format!("{}/{key}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_are_unique_and_keep_the_name() {
        let a = object_key("cat.png");
        let b = object_key("cat.png");
        assert_ne!(a, b);
        assert!(a.ends_with("-cat.png"));
    }

    #[test]
    fn object_key_drops_directories() {
        assert!(object_key("../../etc/passwd.png").ends_with("-passwd.png"));
    }

    #[test]
    fn public_uri_has_single_slash() {
        assert_eq!(public_uri("http://h/blobs/", "k.png"), "http://h/blobs/k.png");
        assert_eq!(public_uri("http://h/blobs", "k.png"), "http://h/blobs/k.png");
    }
}
