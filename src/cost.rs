//! Monthly cost estimation
//!
//! Deterministic table lookups, rough on purpose: the numbers exist to rank
//! candidates and size the savings report, not to reconcile a bill. Unknown
//! type classes always fall back to a documented per-kind default — never
//! zero, never an error.

use crate::resource::{ProviderKind, ResourceDescriptor, ResourceDetail};

/// Monthly USD for known EC2 instance types
const COMPUTE_MONTHLY: &[(&str, f64)] = &[
    ("t2.micro", 8.40),
    ("t2.small", 16.50),
    ("t2.medium", 33.00),
    ("t3.micro", 7.50),
    ("t3.small", 15.00),
    ("t3.medium", 30.00),
    ("m5.large", 69.00),
    ("m5.xlarge", 138.00),
    ("c5.large", 61.20),
    ("c5.xlarge", 122.40),
];
/// Default for unknown instance types; unknown usually means big
const DEFAULT_COMPUTE_MONTHLY: f64 = 150.00;

/// Monthly USD for known RDS instance classes
const DATABASE_MONTHLY: &[(&str, f64)] = &[
    ("db.t2.micro", 12.90),
    ("db.t2.small", 25.80),
    ("db.t3.micro", 12.90),
    ("db.t3.small", 25.80),
    ("db.m5.large", 123.90),
    ("db.m5.xlarge", 247.80),
];
const DEFAULT_DATABASE_MONTHLY: f64 = 300.00;

/// Per running task, assuming a small Fargate footprint
const CONTAINER_TASK_MONTHLY: f64 = 22.50;

/// NAT gateways bill a flat hourly rate regardless of size
const NAT_GATEWAY_MONTHLY: f64 = 32.40;

const LOAD_BALANCER_MONTHLY: &[(&str, f64)] = &[
    ("application", 16.20),
    ("network", 16.20),
    ("gateway", 16.20),
];
const DEFAULT_LOAD_BALANCER_MONTHLY: f64 = 22.50;

/// S3 standard storage rate
const OBJECT_STORE_PER_GB_MONTHLY: f64 = 0.023;
/// Assumed bucket size when the inventory could not determine one
const DEFAULT_OBJECT_STORE_GB: f64 = 10.0;

const SEARCH_MONTHLY: &[(&str, f64)] = &[
    ("t3.small.search", 26.00),
    ("t3.medium.search", 52.00),
    ("m5.large.search", 103.00),
    ("r5.large.search", 134.00),
];
const DEFAULT_SEARCH_MONTHLY: f64 = 100.00;

fn lookup(table: &[(&str, f64)], type_class: &str, default: f64) -> f64 {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(type_class))
        .map(|(_, cost)| *cost)
        .unwrap_or(default)
}

/// Estimate the recurring monthly cost of one resource.
///
/// Pure lookup; always returns a usable, non-zero estimate.
pub fn estimate_monthly_cost(resource: &ResourceDescriptor) -> f64 {
    match &resource.detail {
        ResourceDetail::ComputeInstance => lookup(
            COMPUTE_MONTHLY,
            &resource.type_class,
            DEFAULT_COMPUTE_MONTHLY,
        ),
        ResourceDetail::DatabaseInstance { .. } => lookup(
            DATABASE_MONTHLY,
            &resource.type_class,
            DEFAULT_DATABASE_MONTHLY,
        ),
        ResourceDetail::ContainerService { desired_count, .. } => {
            CONTAINER_TASK_MONTHLY * f64::from((*desired_count).max(1))
        }
        ResourceDetail::NatGateway => NAT_GATEWAY_MONTHLY,
        ResourceDetail::LoadBalancer { .. } => lookup(
            LOAD_BALANCER_MONTHLY,
            &resource.type_class,
            DEFAULT_LOAD_BALANCER_MONTHLY,
        ),
        ResourceDetail::ObjectStore { size_gb, .. } => {
            size_gb.unwrap_or(DEFAULT_OBJECT_STORE_GB) * OBJECT_STORE_PER_GB_MONTHLY
        }
        ResourceDetail::SearchDomain { .. } => lookup(
            SEARCH_MONTHLY,
            &resource.type_class,
            DEFAULT_SEARCH_MONTHLY,
        ),
    }
}

/// The documented fallback for a kind, exposed for reporting.
pub fn default_monthly_cost(kind: ProviderKind) -> f64 {
    match kind {
        ProviderKind::ComputeInstance => DEFAULT_COMPUTE_MONTHLY,
        ProviderKind::DatabaseInstance => DEFAULT_DATABASE_MONTHLY,
        ProviderKind::ContainerService => CONTAINER_TASK_MONTHLY,
        ProviderKind::NatGateway => NAT_GATEWAY_MONTHLY,
        ProviderKind::LoadBalancer => DEFAULT_LOAD_BALANCER_MONTHLY,
        ProviderKind::ObjectStore => DEFAULT_OBJECT_STORE_GB * OBJECT_STORE_PER_GB_MONTHLY,
        ProviderKind::SearchDomain => DEFAULT_SEARCH_MONTHLY,
    }
}
