//! EC2 inventory and actions: instances and NAT gateways

use anyhow::{Context, Result};
use aws_sdk_ec2::types::{Filter, Tag};
use aws_sdk_ec2::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::context::AwsContext;
use super::extract_tags;
use crate::resource::{ResourceDescriptor, ResourceDetail};
use crate::tags::TAG_NAME;

/// EC2 client for instance and NAT gateway lifecycle
pub struct Ec2Client {
    client: Client,
    region: String,
}

impl Ec2Client {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
            region: ctx.region().to_string(),
        }
    }

    /// List running instances as normalized descriptors.
    ///
    /// Instances missing an id or launch time are skipped at this boundary
    /// with a warning; nothing downstream re-validates.
    pub async fn list_running_instances(&self) -> Result<Vec<ResourceDescriptor>> {
        let response = self
            .client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values("running")
                    .build(),
            )
            .send()
            .await
            .context("Failed to describe EC2 instances")?;

        let mut resources = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                let Some(launch_time) = instance.launch_time() else {
                    warn!(instance_id = %instance_id, "Instance has no launch time, skipping");
                    continue;
                };
                let created_at =
                    DateTime::<Utc>::from_timestamp(launch_time.secs(), launch_time.subsec_nanos());
                let tags = extract_tags(instance.tags(), |t: &Tag| t.key(), |t| t.value());
                let name = tags
                    .get(TAG_NAME)
                    .cloned()
                    .unwrap_or_else(|| "Unnamed".to_string());
                let type_class = instance
                    .instance_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default();

                resources.push(ResourceDescriptor {
                    id: instance_id.to_string(),
                    name,
                    region: self.region.clone(),
                    created_at,
                    tags,
                    type_class,
                    detail: ResourceDetail::ComputeInstance,
                });
            }
        }

        debug!(count = resources.len(), region = %self.region, "Found running EC2 instances");
        Ok(resources)
    }

    /// List available NAT gateways as normalized descriptors.
    pub async fn list_nat_gateways(&self) -> Result<Vec<ResourceDescriptor>> {
        let response = self
            .client
            .describe_nat_gateways()
            .filter(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .context("Failed to describe NAT gateways")?;

        let mut resources = Vec::new();
        for nat in response.nat_gateways() {
            let Some(nat_id) = nat.nat_gateway_id() else {
                continue;
            };
            let Some(create_time) = nat.create_time() else {
                warn!(nat_id = %nat_id, "NAT gateway has no creation time, skipping");
                continue;
            };
            let created_at =
                DateTime::<Utc>::from_timestamp(create_time.secs(), create_time.subsec_nanos());
            let tags = extract_tags(nat.tags(), |t: &Tag| t.key(), |t| t.value());
            let name = tags.get(TAG_NAME).cloned().unwrap_or_else(|| nat_id.to_string());

            resources.push(ResourceDescriptor {
                id: nat_id.to_string(),
                name,
                region: self.region.clone(),
                created_at,
                tags,
                type_class: "nat-gateway".to_string(),
                detail: ResourceDetail::NatGateway,
            });
        }

        debug!(count = resources.len(), region = %self.region, "Found NAT gateways");
        Ok(resources)
    }

    pub async fn stop_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .context("Failed to stop instance")?;
        Ok(())
    }

    pub async fn delete_nat_gateway(&self, nat_id: &str) -> Result<()> {
        self.client
            .delete_nat_gateway()
            .nat_gateway_id(nat_id)
            .send()
            .await
            .context("Failed to delete NAT gateway")?;
        Ok(())
    }

    /// Apply tags to an EC2 resource.
    pub async fn create_tags(&self, resource_id: &str, tags: &[(String, String)]) -> Result<()> {
        let mut request = self.client.create_tags().resources(resource_id);
        for (key, value) in tags {
            request = request.tags(Tag::builder().key(key).value(value).build());
        }
        request.send().await.context("Failed to create tags")?;
        Ok(())
    }
}
