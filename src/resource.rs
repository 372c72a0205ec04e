//! Normalized resource descriptors shared by every engine component
//!
//! Inventory adapters validate raw provider responses at their boundary and
//! emit these typed descriptors; nothing downstream touches loose maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::protection::ProtectionDecision;

/// Fallback age for resource types that never report a creation time
/// (search domains). Conservative: old enough to be acted on.
pub const MISSING_CREATED_AT_FALLBACK_DAYS: i64 = 30;

/// Categories of cloud resources managed by idle-reaper
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// EC2 instance (stopped, then tagged with the audit marker)
    ComputeInstance,
    /// RDS instance (stopped, then tagged via its ARN)
    DatabaseInstance,
    /// ECS service (scaled to zero desired tasks)
    ContainerService,
    /// NAT gateway (deleted)
    NatGateway,
    /// ELBv2 load balancer (deleted)
    LoadBalancer,
    /// S3 bucket (emptied then deleted, subject to the object-count bound)
    ObjectStore,
    /// OpenSearch domain (deleted; never eligible while mid-transition)
    SearchDomain,
}

impl ProviderKind {
    /// Fixed per-region scan order. Object stores are global and scanned
    /// exactly once after all regions, so they are not listed here.
    pub const REGIONAL_SCAN_ORDER: [ProviderKind; 6] = [
        ProviderKind::ComputeInstance,
        ProviderKind::DatabaseInstance,
        ProviderKind::ContainerService,
        ProviderKind::NatGateway,
        ProviderKind::LoadBalancer,
        ProviderKind::SearchDomain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::ComputeInstance => "compute_instance",
            ProviderKind::DatabaseInstance => "database_instance",
            ProviderKind::ContainerService => "container_service",
            ProviderKind::NatGateway => "nat_gateway",
            ProviderKind::LoadBalancer => "load_balancer",
            ProviderKind::ObjectStore => "object_store",
            ProviderKind::SearchDomain => "search_domain",
        }
    }

    /// Human-readable label for logs and the notification report
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::ComputeInstance => "EC2 Instances",
            ProviderKind::DatabaseInstance => "RDS Instances",
            ProviderKind::ContainerService => "ECS Services",
            ProviderKind::NatGateway => "NAT Gateways",
            ProviderKind::LoadBalancer => "Load Balancers",
            ProviderKind::ObjectStore => "S3 Buckets",
            ProviderKind::SearchDomain => "Search Domains",
        }
    }

    /// True for kinds not bound to a region (scanned once per run)
    pub fn is_global(self) -> bool {
        matches!(self, ProviderKind::ObjectStore)
    }

    /// Kinds that survive their cleanup action and receive the audit marker.
    /// Stop-style actions leave the resource behind; delete-style actions
    /// leave nothing to tag.
    pub fn supports_audit_tag(self) -> bool {
        matches!(
            self,
            ProviderKind::ComputeInstance | ProviderKind::DatabaseInstance
        )
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider payload of a descriptor.
///
/// Each variant carries exactly the fields its executor action and liveness
/// guards need; inventory adapters populate them after validating the raw
/// response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ResourceDetail {
    ComputeInstance,
    DatabaseInstance {
        /// ARN required by the RDS tagging API
        arn: String,
    },
    ContainerService {
        cluster: String,
        desired_count: i32,
    },
    NatGateway,
    LoadBalancer {
        arn: String,
    },
    ObjectStore {
        /// Object count observed at scan time, capped at the delete bound
        object_count: Option<usize>,
        /// Total size when known; cost estimation falls back to a default
        size_gb: Option<f64>,
    },
    SearchDomain {
        arn: String,
        /// Domain is mid-transition (config change / deletion in flight)
        processing: bool,
    },
}

impl ResourceDetail {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ResourceDetail::ComputeInstance => ProviderKind::ComputeInstance,
            ResourceDetail::DatabaseInstance { .. } => ProviderKind::DatabaseInstance,
            ResourceDetail::ContainerService { .. } => ProviderKind::ContainerService,
            ResourceDetail::NatGateway => ProviderKind::NatGateway,
            ResourceDetail::LoadBalancer { .. } => ProviderKind::LoadBalancer,
            ResourceDetail::ObjectStore { .. } => ProviderKind::ObjectStore,
            ResourceDetail::SearchDomain { .. } => ProviderKind::SearchDomain,
        }
    }
}

/// A normalized resource as seen by the decision engine.
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub id: String,
    pub name: String,
    pub region: String,
    /// Creation time; `None` only for kinds that never report one
    pub created_at: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
    /// Size/shape class (instance type, DB class, LB type, ...)
    pub type_class: String,
    #[serde(flatten)]
    pub detail: ResourceDetail,
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ProviderKind {
        self.detail.kind()
    }

    /// Whole days elapsed since creation, never negative.
    ///
    /// A missing creation time (search domains) falls back to
    /// [`MISSING_CREATED_AT_FALLBACK_DAYS`] rather than failing the
    /// eligibility computation.
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        match self.created_at {
            Some(created_at) => (now - created_at).num_days().max(0),
            None => MISSING_CREATED_AT_FALLBACK_DAYS,
        }
    }
}

/// A resource old enough to act on, annotated with everything the
/// prioritizer and executor need.
///
/// Built once per scan and never mutated afterward; in particular the
/// protection decision is computed exactly once per run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupCandidate {
    pub resource: ResourceDescriptor,
    pub age_days: i64,
    pub estimated_cost: f64,
    pub protection: ProtectionDecision,
}
