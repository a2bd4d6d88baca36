//! S3 blob store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use futures::future::try_join_all;
use labelpool_core::blob::{BlobError, BlobStore, BlobUpload};

use super::{object_key, public_uri};

/// Uploads each image as its own object and returns `{base_url}/<key>`.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String, base_url: &str) -> Self {
        Self {
            client,
            bucket,
            base_url: base_url.to_string(),
        }
    }

    /// Build a client from the standard AWS environment (credentials chain,
    /// `AWS_REGION`, optional `AWS_ENDPOINT_URL`).
    pub async fn from_env(bucket: String, base_url: &str) -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self::new(Client::new(&sdk_config), bucket, base_url)
    }

    async fn put_one(&self, upload: BlobUpload) -> Result<String, BlobError> {
        let key = object_key(&upload.file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .set_content_type(upload.content_type)
            .body(ByteStream::from(upload.bytes))
            .send()
            .await
            .map_err(|e| {
                BlobError::Backend(format!("Failed to upload s3://{}/{key}: {e}", self.bucket))
            })?;
        Ok(public_uri(&self.base_url, &key))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_batch(&self, uploads: Vec<BlobUpload>) -> Result<Vec<String>, BlobError> {
        let count = uploads.len();
        // try_join_all keeps input order in its output.
        let uris = try_join_all(uploads.into_iter().map(|upload| self.put_one(upload))).await?;
        tracing::debug!(count, bucket = %self.bucket, "Stored image batch");
        Ok(uris)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
