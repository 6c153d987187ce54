//! AWS S3 storage implementation.
//!
//! Stores the snapshot as a single JSON object at
//! `s3://{bucket}/{prefix}/{snapshot_id}.json`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use log::info;

use crate::error::{AppError, Result};
use crate::models::{Snapshot, StorageConfig};
use crate::storage::SnapshotStorage;

/// S3-based snapshot storage.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
    snapshot_id: String,
}

impl S3Storage {
    /// Create a new S3 storage instance.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        snapshot_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    /// Create S3 storage from the storage configuration and the ambient
    /// AWS environment.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(
            Client::new(&aws),
            &config.s3_bucket,
            &config.s3_prefix,
            &config.snapshot_key,
        )
    }

    /// Object key of the snapshot.
    fn key(&self) -> String {
        snapshot_key(&self.prefix, &self.snapshot_id)
    }
}

fn snapshot_key(prefix: &str, snapshot_id: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{snapshot_id}.json")
    } else {
        format!("{prefix}/{snapshot_id}.json")
    }
}

#[async_trait]
impl SnapshotStorage for S3Storage {
    fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key())
    }

    async fn read_snapshot(&self) -> Result<Option<Snapshot>> {
        let key = self.key();
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(AppError::persistence_read)?;
                Ok(Some(serde_json::from_slice(&bytes.into_bytes())?))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    info!("No existing snapshot at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::persistence_read(service_err))
                }
            }
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let key = self.key();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(json))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| {
                AppError::persistence_write(aws_sdk_s3::error::DisplayErrorContext(e))
            })?;

        info!("Wrote snapshot to s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
