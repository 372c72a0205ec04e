//! Seams between the decision engine and the cloud
//!
//! The engine never talks to provider APIs directly; it consumes normalized
//! descriptors from an [`InventoryProvider`] and applies outcomes through a
//! [`CleanupBackend`]. Both traits are implemented by the AWS adapters in
//! production and by in-memory fakes in the integration tests.

use crate::error::{NotificationError, ScanError};
use crate::resource::{ProviderKind, ResourceDescriptor};

/// Region name used for globally-scoped kinds (object stores).
pub const GLOBAL_REGION: &str = "global";

/// Fetches raw resources for one (kind, region) unit and normalizes them.
///
/// Implementations validate required fields at this boundary; anything they
/// return is safe for the engine to consume without further checks.
pub trait InventoryProvider {
    fn list(
        &self,
        kind: ProviderKind,
        region: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ResourceDescriptor>, ScanError>>;
}

/// Performs the mutating operations, one resource at a time.
///
/// Methods are kind-specific so fakes can record exactly which operation was
/// (or was not) invoked. Every call either completes or fails synchronously
/// before the next begins; no retries happen at this layer.
pub trait CleanupBackend {
    fn stop_compute_instance(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    fn stop_database_instance(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    fn scale_container_to_zero(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    fn delete_nat_gateway(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    fn delete_load_balancer(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    fn delete_search_domain(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    /// Count objects in a store, up to `limit`. Used for the delete bound.
    fn count_store_objects(
        &self,
        resource: &ResourceDescriptor,
        limit: usize,
    ) -> impl std::future::Future<Output = anyhow::Result<usize>>;

    /// Delete all objects, then the store itself. Only called after the
    /// count check passed.
    fn empty_and_delete_store(
        &self,
        resource: &ResourceDescriptor,
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;

    /// Apply the audit marker to a resource that survives its action.
    fn apply_audit_tags(
        &self,
        resource: &ResourceDescriptor,
        tags: &[(String, String)],
    ) -> impl std::future::Future<Output = anyhow::Result<()>>;
}

/// Publishes the run report to the notification side channel.
pub trait Notifier {
    fn publish(
        &self,
        subject: &str,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), NotificationError>>;
}
