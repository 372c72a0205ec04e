//! S3 inventory and actions
//!
//! Buckets are global: listed once per run, not per region. Deletion always
//! goes through the object-count bound enforced by the executor.

use anyhow::{Context, Result};
use aws_sdk_s3::types::Tag;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::context::AwsContext;
use super::extract_tags;
use crate::cloud::GLOBAL_REGION;
use crate::executor::OBJECT_STORE_DELETE_LIMIT;
use crate::resource::{ResourceDescriptor, ResourceDetail};

/// S3 client for bucket lifecycle
pub struct S3Client {
    client: Client,
}

impl S3Client {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// List all buckets as normalized descriptors, annotated with an object
    /// count observed up to the delete bound.
    pub async fn list_buckets(&self) -> Result<Vec<ResourceDescriptor>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .context("Failed to list buckets")?;

        let mut resources = Vec::new();
        for bucket in response.buckets() {
            let Some(bucket_name) = bucket.name() else {
                continue;
            };
            let Some(creation_date) = bucket.creation_date() else {
                warn!(bucket = %bucket_name, "Bucket has no creation date, skipping");
                continue;
            };
            let created_at = DateTime::<Utc>::from_timestamp(
                creation_date.secs(),
                creation_date.subsec_nanos(),
            );

            // Untagged buckets are common; treat a tagging error as empty.
            let tags = match self
                .client
                .get_bucket_tagging()
                .bucket(bucket_name)
                .send()
                .await
            {
                Ok(resp) => extract_tags(resp.tag_set(), |t: &Tag| Some(t.key()), |t| Some(t.value())),
                Err(_) => Default::default(),
            };

            let object_count = match self
                .count_objects(bucket_name, OBJECT_STORE_DELETE_LIMIT)
                .await
            {
                Ok(count) => Some(count),
                Err(error) => {
                    debug!(bucket = %bucket_name, error = ?error, "Could not count objects");
                    None
                }
            };

            resources.push(ResourceDescriptor {
                id: bucket_name.to_string(),
                name: bucket_name.to_string(),
                region: GLOBAL_REGION.to_string(),
                created_at,
                tags,
                type_class: "standard".to_string(),
                detail: ResourceDetail::ObjectStore {
                    object_count,
                    size_gb: None,
                },
            });
        }

        debug!(count = resources.len(), "Found S3 buckets");
        Ok(resources)
    }

    /// Count objects in a bucket, up to `limit`.
    pub async fn count_objects(&self, bucket: &str, limit: usize) -> Result<usize> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(limit as i32)
            .send()
            .await
            .context("Failed to list objects")?;
        Ok(response.key_count().unwrap_or(0) as usize)
    }

    /// Fetch a small text object, for the external config store.
    pub async fn get_object_string(&self, bucket: &str, key: &str) -> Result<String> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .context("Failed to fetch config object")?;
        let bytes = response
            .body
            .collect()
            .await
            .context("Failed to read config object body")?
            .into_bytes();
        String::from_utf8(bytes.to_vec()).context("Config object is not valid UTF-8")
    }

    /// Delete every object, then the bucket itself. Callers are responsible
    /// for the not-empty bound; this empties whatever remains.
    pub async fn empty_and_delete(&self, bucket: &str) -> Result<()> {
        let mut continuation_token = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.context("Failed to list objects")?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    debug!(bucket = %bucket, key = %key, "Deleting object");
                    self.client
                        .delete_object()
                        .bucket(bucket)
                        .key(key)
                        .send()
                        .await
                        .context("Failed to delete object")?;
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .context("Failed to delete bucket")?;

        Ok(())
    }
}
