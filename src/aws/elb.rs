//! ELBv2 inventory and actions

use anyhow::{Context, Result};
use aws_sdk_elasticloadbalancingv2::types::Tag;
use aws_sdk_elasticloadbalancingv2::Client;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::context::AwsContext;
use super::extract_tags;
use crate::resource::{ResourceDescriptor, ResourceDetail};

/// ELBv2 client for load balancer lifecycle
pub struct ElbClient {
    client: Client,
    region: String,
}

impl ElbClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.elb_client(),
            region: ctx.region().to_string(),
        }
    }

    pub async fn list_load_balancers(&self) -> Result<Vec<ResourceDescriptor>> {
        let response = self
            .client
            .describe_load_balancers()
            .send()
            .await
            .context("Failed to describe load balancers")?;

        let mut resources = Vec::new();
        for lb in response.load_balancers() {
            let Some(arn) = lb.load_balancer_arn() else {
                continue;
            };
            let Some(name) = lb.load_balancer_name() else {
                continue;
            };
            let Some(created_time) = lb.created_time() else {
                warn!(name = %name, "Load balancer has no creation time, skipping");
                continue;
            };
            let created_at =
                DateTime::<Utc>::from_timestamp(created_time.secs(), created_time.subsec_nanos());
            let type_class = lb
                .r#type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| "application".to_string());

            resources.push(ResourceDescriptor {
                id: name.to_string(),
                name: name.to_string(),
                region: self.region.clone(),
                created_at,
                tags: self.load_balancer_tags(arn).await,
                type_class,
                detail: ResourceDetail::LoadBalancer {
                    arn: arn.to_string(),
                },
            });
        }

        debug!(count = resources.len(), region = %self.region, "Found load balancers");
        Ok(resources)
    }

    /// Fetch tags for one load balancer; a tag lookup failure degrades to
    /// an empty set rather than failing the scan.
    async fn load_balancer_tags(&self, arn: &str) -> HashMap<String, String> {
        match self
            .client
            .describe_tags()
            .resource_arns(arn)
            .send()
            .await
        {
            Ok(response) => response
                .tag_descriptions()
                .first()
                .map(|description| {
                    extract_tags(description.tags(), |t: &Tag| Some(t.key()), |t| t.value())
                })
                .unwrap_or_default(),
            Err(error) => {
                debug!(arn = %arn, error = ?error, "Could not fetch load balancer tags");
                HashMap::new()
            }
        }
    }

    pub async fn delete_load_balancer(&self, arn: &str) -> Result<()> {
        self.client
            .delete_load_balancer()
            .load_balancer_arn(arn)
            .send()
            .await
            .context("Failed to delete load balancer")?;
        Ok(())
    }
}
