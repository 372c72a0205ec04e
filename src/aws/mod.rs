//! AWS adapters behind the engine's inventory and action seams
//!
//! One service client wrapper per API, plus [`AwsCloud`], which routes each
//! (kind, region) unit to the right client. Raw responses are validated and
//! normalized here; the engine never sees SDK types.

pub mod context;
pub mod ec2;
pub mod ecs;
pub mod elb;
pub mod rds;
pub mod s3;
pub mod search;
pub mod sns;

use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;

pub use context::AwsContext;
pub use ec2::Ec2Client;
pub use ecs::EcsClient;
pub use elb::ElbClient;
pub use rds::RdsClient;
pub use s3::S3Client;
pub use search::SearchClient;
pub use sns::SnsNotifier;

use crate::cloud::{CleanupBackend, InventoryProvider, GLOBAL_REGION};
use crate::error::ScanError;
use crate::resource::{ProviderKind, ResourceDescriptor, ResourceDetail};

/// Extract tags from any AWS tag type into a HashMap.
///
/// Different service SDKs use different tag types with different
/// optionality on key/value; the closures paper over that.
pub(crate) fn extract_tags<T>(
    tags: &[T],
    key: impl Fn(&T) -> Option<&str>,
    value: impl Fn(&T) -> Option<&str>,
) -> HashMap<String, String> {
    tags.iter()
        .filter_map(|t| match (key(t), value(t)) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

/// All service clients for one run, one SDK config per configured region.
///
/// Implements both engine seams: inventory listing and cleanup actions.
pub struct AwsCloud {
    contexts: HashMap<String, AwsContext>,
    /// Context used for globally-scoped services (S3, SNS)
    home: AwsContext,
}

impl AwsCloud {
    /// Load SDK configuration for every configured region up front.
    pub async fn connect(regions: &[String]) -> Self {
        let mut contexts = HashMap::new();
        for region in regions {
            contexts.insert(region.clone(), AwsContext::new(region).await);
        }
        let home = match regions.first() {
            Some(region) => contexts[region].clone(),
            None => AwsContext::new("us-east-1").await,
        };
        Self { contexts, home }
    }

    pub fn home_context(&self) -> &AwsContext {
        &self.home
    }

    fn context(&self, region: &str) -> Result<&AwsContext> {
        if region == GLOBAL_REGION {
            return Ok(&self.home);
        }
        self.contexts
            .get(region)
            .ok_or_else(|| anyhow!("No AWS context loaded for region '{region}'"))
    }
}

impl InventoryProvider for AwsCloud {
    async fn list(
        &self,
        kind: ProviderKind,
        region: &str,
    ) -> Result<Vec<ResourceDescriptor>, ScanError> {
        let result = match self.context(region) {
            Err(error) => Err(error),
            Ok(ctx) => match kind {
                ProviderKind::ComputeInstance => {
                    Ec2Client::from_context(ctx).list_running_instances().await
                }
                ProviderKind::DatabaseInstance => {
                    RdsClient::from_context(ctx).list_available_instances().await
                }
                ProviderKind::ContainerService => {
                    EcsClient::from_context(ctx).list_active_services().await
                }
                ProviderKind::NatGateway => {
                    Ec2Client::from_context(ctx).list_nat_gateways().await
                }
                ProviderKind::LoadBalancer => {
                    ElbClient::from_context(ctx).list_load_balancers().await
                }
                ProviderKind::ObjectStore => S3Client::from_context(ctx).list_buckets().await,
                ProviderKind::SearchDomain => {
                    SearchClient::from_context(ctx).list_domains().await
                }
            },
        };
        result.map_err(|source| ScanError::new(region, kind, source))
    }
}

impl CleanupBackend for AwsCloud {
    async fn stop_compute_instance(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ctx = self.context(&resource.region)?;
        Ec2Client::from_context(ctx).stop_instance(&resource.id).await
    }

    async fn stop_database_instance(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ctx = self.context(&resource.region)?;
        RdsClient::from_context(ctx).stop_instance(&resource.id).await
    }

    async fn scale_container_to_zero(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ResourceDetail::ContainerService { cluster, .. } = &resource.detail else {
            bail!("Resource '{}' is not a container service", resource.id);
        };
        let ctx = self.context(&resource.region)?;
        EcsClient::from_context(ctx)
            .scale_to_zero(cluster, &resource.id)
            .await
    }

    async fn delete_nat_gateway(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ctx = self.context(&resource.region)?;
        Ec2Client::from_context(ctx)
            .delete_nat_gateway(&resource.id)
            .await
    }

    async fn delete_load_balancer(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ResourceDetail::LoadBalancer { arn } = &resource.detail else {
            bail!("Resource '{}' is not a load balancer", resource.id);
        };
        let ctx = self.context(&resource.region)?;
        ElbClient::from_context(ctx).delete_load_balancer(arn).await
    }

    async fn delete_search_domain(&self, resource: &ResourceDescriptor) -> Result<()> {
        let ctx = self.context(&resource.region)?;
        SearchClient::from_context(ctx)
            .delete_domain(&resource.id)
            .await
    }

    async fn count_store_objects(
        &self,
        resource: &ResourceDescriptor,
        limit: usize,
    ) -> Result<usize> {
        S3Client::from_context(&self.home)
            .count_objects(&resource.id, limit)
            .await
    }

    async fn empty_and_delete_store(&self, resource: &ResourceDescriptor) -> Result<()> {
        S3Client::from_context(&self.home)
            .empty_and_delete(&resource.id)
            .await
    }

    async fn apply_audit_tags(
        &self,
        resource: &ResourceDescriptor,
        tags: &[(String, String)],
    ) -> Result<()> {
        let ctx = self.context(&resource.region)?;
        match &resource.detail {
            ResourceDetail::ComputeInstance => {
                Ec2Client::from_context(ctx)
                    .create_tags(&resource.id, tags)
                    .await
            }
            ResourceDetail::DatabaseInstance { arn } => {
                RdsClient::from_context(ctx).add_tags(arn, tags).await
            }
            // Other kinds do not survive their action; nothing to mark.
            _ => Ok(()),
        }
    }
}
