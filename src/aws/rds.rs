//! RDS inventory and actions

use anyhow::{Context, Result};
use aws_sdk_rds::types::Tag;
use aws_sdk_rds::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::context::AwsContext;
use super::extract_tags;
use crate::resource::{ResourceDescriptor, ResourceDetail};

/// RDS client for database instance lifecycle
pub struct RdsClient {
    client: Client,
    region: String,
}

impl RdsClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
            region: ctx.region().to_string(),
        }
    }

    /// List instances in `available` status as normalized descriptors.
    pub async fn list_available_instances(&self) -> Result<Vec<ResourceDescriptor>> {
        let response = self
            .client
            .describe_db_instances()
            .send()
            .await
            .context("Failed to describe RDS instances")?;

        let mut resources = Vec::new();
        for db in response.db_instances() {
            if db.db_instance_status() != Some("available") {
                continue;
            }
            let Some(db_id) = db.db_instance_identifier() else {
                continue;
            };
            let Some(arn) = db.db_instance_arn() else {
                warn!(db_id = %db_id, "RDS instance has no ARN, skipping");
                continue;
            };
            let Some(create_time) = db.instance_create_time() else {
                warn!(db_id = %db_id, "RDS instance has no creation time, skipping");
                continue;
            };
            let created_at =
                DateTime::<Utc>::from_timestamp(create_time.secs(), create_time.subsec_nanos());
            let tags = extract_tags(db.tag_list(), |t: &Tag| t.key(), |t| t.value());

            resources.push(ResourceDescriptor {
                id: db_id.to_string(),
                name: db_id.to_string(),
                region: self.region.clone(),
                created_at,
                tags,
                type_class: db.db_instance_class().unwrap_or_default().to_string(),
                detail: ResourceDetail::DatabaseInstance {
                    arn: arn.to_string(),
                },
            });
        }

        debug!(count = resources.len(), region = %self.region, "Found available RDS instances");
        Ok(resources)
    }

    pub async fn stop_instance(&self, db_id: &str) -> Result<()> {
        self.client
            .stop_db_instance()
            .db_instance_identifier(db_id)
            .send()
            .await
            .context("Failed to stop RDS instance")?;
        Ok(())
    }

    /// Apply tags to an RDS resource by ARN.
    pub async fn add_tags(&self, arn: &str, tags: &[(String, String)]) -> Result<()> {
        let mut request = self.client.add_tags_to_resource().resource_name(arn);
        for (key, value) in tags {
            request = request.tags(Tag::builder().key(key).value(value).build());
        }
        request
            .send()
            .await
            .context("Failed to tag RDS instance")?;
        Ok(())
    }
}
