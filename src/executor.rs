//! Fault-isolated action execution for one candidate at a time
//!
//! The executor owns the safety bounds on destructive actions: protected
//! candidates are never touched, dry runs never issue a mutating call, and
//! object stores over the delete bound are refused outright. Failures are
//! classified and returned; they are never retried here.

use tracing::{info, warn};

use crate::cloud::CleanupBackend;
use crate::context::RunContext;
use crate::error::{ActionError, ActionErrorKind};
use crate::resource::{CleanupCandidate, ProviderKind, ResourceDetail};
use crate::tags::audit_tags;
use serde::Serialize;

/// Maximum number of objects an object store may hold and still be deleted.
/// At or above this, the delete is refused as a conflict.
pub const OBJECT_STORE_DELETE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success,
    SkippedProtected,
    /// Counted as a would-be success for reporting
    SkippedDryRun,
    Failed,
}

/// Produced exactly once per executed candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub resource_id: String,
    pub kind: ProviderKind,
    pub region: String,
    pub outcome: ExecutionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ActionErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExecutionResult {
    fn new(candidate: &CleanupCandidate, outcome: ExecutionOutcome) -> Self {
        Self {
            resource_id: candidate.resource.id.clone(),
            kind: candidate.resource.kind(),
            region: candidate.resource.region.clone(),
            outcome,
            error_kind: None,
            detail: None,
        }
    }

    fn failed(candidate: &CleanupCandidate, error: ActionError) -> Self {
        Self {
            error_kind: Some(error.kind),
            detail: Some(error.detail),
            ..Self::new(candidate, ExecutionOutcome::Failed)
        }
    }
}

/// Applies the kind-specific action for one candidate.
pub struct ActionExecutor<'a, B> {
    backend: &'a B,
    dry_run: bool,
}

impl<'a, B: CleanupBackend> ActionExecutor<'a, B> {
    pub fn new(backend: &'a B, dry_run: bool) -> Self {
        Self { backend, dry_run }
    }

    pub async fn execute(&self, candidate: &CleanupCandidate, ctx: &RunContext) -> ExecutionResult {
        let resource = &candidate.resource;

        if candidate.protection.protected {
            return ExecutionResult {
                detail: candidate.protection.reason.clone(),
                ..ExecutionResult::new(candidate, ExecutionOutcome::SkippedProtected)
            };
        }

        if self.dry_run {
            info!(
                resource_id = %resource.id,
                kind = %resource.kind(),
                region = %resource.region,
                age_days = candidate.age_days,
                "[DRY RUN] Would clean up"
            );
            return ExecutionResult::new(candidate, ExecutionOutcome::SkippedDryRun);
        }

        let action_result = match &resource.detail {
            ResourceDetail::ComputeInstance => self.backend.stop_compute_instance(resource).await,
            ResourceDetail::DatabaseInstance { .. } => {
                self.backend.stop_database_instance(resource).await
            }
            ResourceDetail::ContainerService { .. } => {
                self.backend.scale_container_to_zero(resource).await
            }
            ResourceDetail::NatGateway => self.backend.delete_nat_gateway(resource).await,
            ResourceDetail::LoadBalancer { .. } => self.backend.delete_load_balancer(resource).await,
            ResourceDetail::SearchDomain { .. } => self.backend.delete_search_domain(resource).await,
            ResourceDetail::ObjectStore { .. } => {
                return self.execute_object_store(candidate).await;
            }
        };

        match action_result {
            Ok(()) => {
                info!(
                    resource_id = %resource.id,
                    kind = %resource.kind(),
                    region = %resource.region,
                    "Cleaned up resource"
                );
                self.mark_audited(candidate, ctx).await;
                ExecutionResult::new(candidate, ExecutionOutcome::Success)
            }
            Err(error) => {
                let classified = ActionError::classify(&error);
                warn!(
                    resource_id = %resource.id,
                    kind = %resource.kind(),
                    error_kind = classified.kind.as_str(),
                    error = ?error,
                    "Cleanup action failed"
                );
                ExecutionResult::failed(candidate, classified)
            }
        }
    }

    /// Object stores get an extra bound: list up to the limit first and
    /// refuse the delete when the store is at or over it.
    async fn execute_object_store(&self, candidate: &CleanupCandidate) -> ExecutionResult {
        let resource = &candidate.resource;

        let count = match self
            .backend
            .count_store_objects(resource, OBJECT_STORE_DELETE_LIMIT)
            .await
        {
            Ok(count) => count,
            Err(error) => {
                return ExecutionResult::failed(candidate, ActionError::classify(&error));
            }
        };

        if count >= OBJECT_STORE_DELETE_LIMIT {
            warn!(
                resource_id = %resource.id,
                object_count = count,
                "Refusing to delete object store: not empty"
            );
            return ExecutionResult::failed(
                candidate,
                ActionError::conflict(format!(
                    "not empty: {count}+ objects (limit {OBJECT_STORE_DELETE_LIMIT})"
                )),
            );
        }

        match self.backend.empty_and_delete_store(resource).await {
            Ok(()) => {
                info!(resource_id = %resource.id, objects = count, "Emptied and deleted object store");
                ExecutionResult::new(candidate, ExecutionOutcome::Success)
            }
            Err(error) => ExecutionResult::failed(candidate, ActionError::classify(&error)),
        }
    }

    /// The action already succeeded; a failed marker is logged, not counted
    /// against the run.
    async fn mark_audited(&self, candidate: &CleanupCandidate, ctx: &RunContext) {
        if !candidate.resource.kind().supports_audit_tag() {
            return;
        }
        let tags = audit_tags(ctx.started_at, candidate.age_days);
        if let Err(error) = self
            .backend
            .apply_audit_tags(&candidate.resource, &tags)
            .await
        {
            warn!(
                resource_id = %candidate.resource.id,
                error = ?error,
                "Failed to apply audit tags"
            );
        }
    }
}
