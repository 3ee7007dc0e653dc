//! S3 conversation store
//!
//! Records are objects in one bucket under the `conversations/` prefix.

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use musing_application::ports::conversation_store::{ConversationStore, StorageError};
use tracing::{debug, info};

pub struct S3ConversationStore {
    client: S3Client,
    bucket: String,
}

impl S3ConversationStore {
    /// Create a store for `bucket`, resolving credentials the standard AWS way.
    pub async fn new(bucket: impl Into<String>, region: &str) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        let bucket = bucket.into();
        info!(bucket = %bucket, region, "S3 conversation store initialized");

        Self {
            client: S3Client::new(&aws_config),
            bucket,
        }
    }
}

/// Classify an S3 SDK failure. Throttling, dispatch and 5xx failures are transient.
fn convert_sdk_error<E, R>(action: &str, key: &str, err: &SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StorageError::Unavailable(format!("{action} {key}: {err}"))
        }
        SdkError::ConstructionFailure(_) => {
            StorageError::Backend(format!("{action} {key}: could not build request: {err:?}"))
        }
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let code = inner.code().unwrap_or("Unknown");
            let message = format!(
                "{action} {key}: {code}: {}",
                inner.message().unwrap_or_default()
            );
            if is_transient_code(code) {
                StorageError::Unavailable(message)
            } else {
                StorageError::Backend(message)
            }
        }
        other => StorageError::Backend(format!("{action} {key}: {other}")),
    }
}

fn is_transient_code(code: &str) -> bool {
    matches!(
        code,
        "SlowDown"
            | "Throttling"
            | "ThrottlingException"
            | "RequestTimeout"
            | "InternalError"
            | "ServiceUnavailable"
    )
}

#[async_trait]
impl ConversationStore for S3ConversationStore {
    fn backend(&self) -> &str {
        "s3"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| convert_sdk_error("PutObject", key, &e))?;

        debug!(bucket = %self.bucket, key, bytes = size, "Stored conversation record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(SdkError::ServiceError(service)) if service.err().is_no_such_key() => {
                return Ok(None);
            }
            Err(e) => return Err(convert_sdk_error("GetObject", key, &e)),
        };

        let data = output.body.collect().await.map_err(|e| {
            StorageError::Unavailable(format!("GetObject {key}: body read failed: {e}"))
        })?;
        Ok(Some(data.into_bytes().to_vec()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| convert_sdk_error("ListObjectsV2", prefix, &e))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
        }
        Ok(keys)
    }
}
