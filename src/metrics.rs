//! Per-run metric schema
//!
//! This module is the single source of truth for metric names. Values are
//! rolled up from the run summary; publication belongs to an external
//! collaborator, so emission here is one structured log event tagged with
//! the correlation id for a log-based pipeline to scrape.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::executor::ExecutionOutcome;
use crate::summary::RunSummary;

/// Metric names, stable across releases.
pub mod names {
    pub const RESOURCES_FOUND: &str = "reaper.resources_found";
    pub const RESOURCES_EXECUTED: &str = "reaper.resources_executed";
    pub const ACTIONS_FAILED: &str = "reaper.actions_failed";
    pub const ERRORS: &str = "reaper.errors";
    pub const RUN_DURATION_MS: &str = "reaper.run_duration_ms";
    pub const ESTIMATED_MONTHLY_SAVINGS: &str = "reaper.estimated_monthly_savings";
}

#[derive(Debug, Serialize)]
pub struct RunMetrics {
    pub correlation_id: String,
    /// Candidate count per provider kind
    pub found_by_kind: BTreeMap<&'static str, usize>,
    pub resources_found: usize,
    pub resources_executed: usize,
    pub actions_failed: usize,
    pub errors: usize,
    pub run_duration_ms: u64,
    pub estimated_monthly_savings: f64,
}

impl RunMetrics {
    pub fn from_summary(summary: &RunSummary) -> Self {
        let found_by_kind = summary
            .candidates
            .iter()
            .map(|(kind, bucket)| (kind.as_str(), bucket.len()))
            .collect();

        Self {
            correlation_id: summary.correlation_id.clone(),
            found_by_kind,
            resources_found: summary.total_candidates(),
            resources_executed: summary.effective_success_count(),
            actions_failed: summary.outcome_count(ExecutionOutcome::Failed),
            errors: summary.errors.len(),
            run_duration_ms: summary.counters.total_ms,
            estimated_monthly_savings: summary
                .cost_report
                .as_ref()
                .map(|r| r.total_monthly_savings)
                .unwrap_or(0.0),
        }
    }

    /// Emit every metric as one structured event.
    pub fn emit(&self) {
        info!(
            target: "metrics",
            correlation_id = %self.correlation_id,
            resources_found = self.resources_found,
            resources_executed = self.resources_executed,
            actions_failed = self.actions_failed,
            errors = self.errors,
            run_duration_ms = self.run_duration_ms,
            estimated_monthly_savings = self.estimated_monthly_savings,
            "run metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionErrorKind;
    use crate::executor::ExecutionResult;
    use crate::protection::ProtectionDecision;
    use crate::resource::{CleanupCandidate, ProviderKind, ResourceDescriptor, ResourceDetail};
    use chrono::Utc;
    use std::collections::HashMap;

    #[test]
    fn metrics_roll_up_from_summary() {
        let mut summary = RunSummary::new("cid".to_string(), Utc::now(), 3, false);
        summary.push_candidate(CleanupCandidate {
            resource: ResourceDescriptor {
                id: "i-1".to_string(),
                name: "a".to_string(),
                region: "us-east-1".to_string(),
                created_at: Some(Utc::now()),
                tags: HashMap::new(),
                type_class: "m5.large".to_string(),
                detail: ResourceDetail::ComputeInstance,
            },
            age_days: 5,
            estimated_cost: 69.0,
            protection: ProtectionDecision::unprotected(),
        });
        summary.results.push(ExecutionResult {
            resource_id: "i-1".to_string(),
            kind: ProviderKind::ComputeInstance,
            region: "us-east-1".to_string(),
            outcome: ExecutionOutcome::Failed,
            error_kind: Some(ActionErrorKind::Transient),
            detail: Some("Throttling".to_string()),
        });
        summary.record_error("i-1", "Throttling");

        let metrics = RunMetrics::from_summary(&summary);
        assert_eq!(metrics.resources_found, 1);
        assert_eq!(metrics.found_by_kind["compute_instance"], 1);
        assert_eq!(metrics.actions_failed, 1);
        assert_eq!(metrics.resources_executed, 0);
        assert_eq!(metrics.errors, 1);
    }

    #[test]
    fn metric_names_are_namespaced() {
        for name in [
            names::RESOURCES_FOUND,
            names::RESOURCES_EXECUTED,
            names::ACTIONS_FAILED,
            names::ERRORS,
            names::RUN_DURATION_MS,
            names::ESTIMATED_MONTHLY_SAVINGS,
        ] {
            assert!(name.starts_with("reaper."));
        }
    }
}
