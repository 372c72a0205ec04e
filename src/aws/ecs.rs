//! ECS inventory and actions

use anyhow::{Context, Result};
use aws_sdk_ecs::types::{ServiceField, Tag};
use aws_sdk_ecs::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::context::AwsContext;
use super::extract_tags;
use crate::resource::{ResourceDescriptor, ResourceDetail};

/// ECS client for service lifecycle
pub struct EcsClient {
    client: Client,
    region: String,
}

impl EcsClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecs_client(),
            region: ctx.region().to_string(),
        }
    }

    /// List services with running tasks across all clusters.
    pub async fn list_active_services(&self) -> Result<Vec<ResourceDescriptor>> {
        let clusters = self
            .client
            .list_clusters()
            .send()
            .await
            .context("Failed to list ECS clusters")?;

        let mut resources = Vec::new();
        for cluster_arn in clusters.cluster_arns() {
            let services = self
                .client
                .list_services()
                .cluster(cluster_arn)
                .send()
                .await
                .context("Failed to list ECS services")?;

            let service_arns = services.service_arns().to_vec();
            if service_arns.is_empty() {
                continue;
            }

            let details = self
                .client
                .describe_services()
                .cluster(cluster_arn)
                .set_services(Some(service_arns))
                .include(ServiceField::Tags)
                .send()
                .await
                .context("Failed to describe ECS services")?;

            for service in details.services() {
                let desired_count = service.desired_count();
                if desired_count <= 0 {
                    continue;
                }
                let Some(service_arn) = service.service_arn() else {
                    continue;
                };
                let Some(service_name) = service.service_name() else {
                    continue;
                };
                let Some(created) = service.created_at() else {
                    warn!(service = %service_name, "ECS service has no creation time, skipping");
                    continue;
                };
                let created_at =
                    DateTime::<Utc>::from_timestamp(created.secs(), created.subsec_nanos());
                let tags = extract_tags(service.tags(), |t: &Tag| t.key(), |t| t.value());
                let type_class = service
                    .launch_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| "FARGATE".to_string());

                resources.push(ResourceDescriptor {
                    id: service_arn.to_string(),
                    name: service_name.to_string(),
                    region: self.region.clone(),
                    created_at,
                    tags,
                    type_class,
                    detail: ResourceDetail::ContainerService {
                        cluster: cluster_arn.to_string(),
                        desired_count,
                    },
                });
            }
        }

        debug!(count = resources.len(), region = %self.region, "Found active ECS services");
        Ok(resources)
    }

    /// Scale a service to zero desired tasks.
    pub async fn scale_to_zero(&self, cluster: &str, service_arn: &str) -> Result<()> {
        self.client
            .update_service()
            .cluster(cluster)
            .service(service_arn)
            .desired_count(0)
            .send()
            .await
            .context("Failed to scale down ECS service")?;
        Ok(())
    }
}
