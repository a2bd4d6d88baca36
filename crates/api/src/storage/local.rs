//! Filesystem blob store for development and tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use labelpool_core::blob::{BlobError, BlobStore, BlobUpload};

use super::{object_key, public_uri};

/// Writes each upload to `root/<key>` and returns `{base_url}/<key>`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Create the store, making `root` if it does not exist.
    pub async fn new(root: impl AsRef<Path>, base_url: &str) -> Result<Self, BlobError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            base_url: base_url.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_batch(&self, uploads: Vec<BlobUpload>) -> Result<Vec<String>, BlobError> {
        let mut uris = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let key = object_key(&upload.file_name);
            tokio::fs::write(self.root.join(&key), &upload.bytes).await?;
            uris.push(public_uri(&self.base_url, &key));
        }
        tracing::debug!(count = uris.len(), root = %self.root.display(), "Stored image batch");
        Ok(uris)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
