//! OpenSearch inventory and actions
//!
//! Domains never report a creation time, so their descriptors carry none;
//! the engine applies its conservative age fallback. A domain mid-transition
//! surfaces as `processing` and is left alone by the eligibility guard.

use anyhow::{Context, Result};
use aws_sdk_opensearch::types::Tag;
use aws_sdk_opensearch::Client;
use std::collections::HashMap;
use tracing::debug;

use super::context::AwsContext;
use super::extract_tags;
use crate::resource::{ResourceDescriptor, ResourceDetail};

/// DescribeDomains accepts at most this many names per call
const DESCRIBE_BATCH: usize = 5;

/// OpenSearch client for domain lifecycle
pub struct SearchClient {
    client: Client,
    region: String,
}

impl SearchClient {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.opensearch_client(),
            region: ctx.region().to_string(),
        }
    }

    pub async fn list_domains(&self) -> Result<Vec<ResourceDescriptor>> {
        let names_response = self
            .client
            .list_domain_names()
            .send()
            .await
            .context("Failed to list search domains")?;

        let names: Vec<String> = names_response
            .domain_names()
            .iter()
            .filter_map(|d| d.domain_name().map(str::to_string))
            .collect();

        let mut resources = Vec::new();
        for batch in names.chunks(DESCRIBE_BATCH) {
            let response = self
                .client
                .describe_domains()
                .set_domain_names(Some(batch.to_vec()))
                .send()
                .await
                .context("Failed to describe search domains")?;

            for status in response.domain_status_list() {
                let name = status.domain_name();
                let arn = status.arn();
                let processing = status.processing().unwrap_or(false);
                let type_class = status
                    .cluster_config()
                    .and_then(|c| c.instance_type())
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default();

                resources.push(ResourceDescriptor {
                    id: name.to_string(),
                    name: name.to_string(),
                    region: self.region.clone(),
                    // The API does not report domain creation time
                    created_at: None,
                    tags: self.domain_tags(arn).await,
                    type_class,
                    detail: ResourceDetail::SearchDomain {
                        arn: arn.to_string(),
                        processing,
                    },
                });
            }
        }

        debug!(count = resources.len(), region = %self.region, "Found search domains");
        Ok(resources)
    }

    /// Fetch domain tags; lookup failure degrades to an empty set.
    async fn domain_tags(&self, arn: &str) -> HashMap<String, String> {
        match self.client.list_tags().arn(arn).send().await {
            Ok(response) => extract_tags(
                response.tag_list(),
                |t: &Tag| Some(t.key()),
                |t| Some(t.value()),
            ),
            Err(error) => {
                debug!(arn = %arn, error = ?error, "Could not fetch domain tags");
                HashMap::new()
            }
        }
    }

    pub async fn delete_domain(&self, domain_name: &str) -> Result<()> {
        self.client
            .delete_domain()
            .domain_name(domain_name)
            .send()
            .await
            .context("Failed to delete search domain")?;
        Ok(())
    }
}
