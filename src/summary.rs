//! Run summary: everything one invocation learned and did
//!
//! Owned solely by the coordinator for the lifetime of one invocation and
//! handed to reporting/notification afterwards. Never shared across
//! invocations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::RunError;
use crate::executor::{ExecutionOutcome, ExecutionResult};
use crate::prioritize::CostReport;
use crate::resource::{CleanupCandidate, ProviderKind};
use crate::schedule::ScheduleDecision;

/// Wall-clock accounting, purely for reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerfCounters {
    /// Scan duration per region (all kinds in that region)
    pub region_scan_ms: BTreeMap<String, u64>,
    /// Action duration per resource id
    pub action_ms: BTreeMap<String, u64>,
    /// Whole-run duration
    pub total_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub correlation_id: String,
    pub started_at: DateTime<Utc>,
    pub max_age_days: i64,
    pub dry_run: bool,
    /// All candidates discovered this run, bucketed by kind. Buckets are in
    /// scan order; within a bucket, prioritized order.
    pub candidates: BTreeMap<ProviderKind, Vec<CleanupCandidate>>,
    /// One entry per candidate handed to the executor
    pub results: Vec<ExecutionResult>,
    pub errors: Vec<RunError>,
    pub counters: PerfCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_report: Option<CostReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleDecision>,
    /// Set when the scheduling gate denied the window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl RunSummary {
    pub fn new(correlation_id: String, started_at: DateTime<Utc>, max_age_days: i64, dry_run: bool) -> Self {
        Self {
            correlation_id,
            started_at,
            max_age_days,
            dry_run,
            candidates: BTreeMap::new(),
            results: Vec::new(),
            errors: Vec::new(),
            counters: PerfCounters::default(),
            cost_report: None,
            schedule: None,
            skip_reason: None,
        }
    }

    pub fn push_candidate(&mut self, candidate: CleanupCandidate) {
        self.candidates
            .entry(candidate.resource.kind())
            .or_default()
            .push(candidate);
    }

    pub fn record_error(&mut self, scope: impl Into<String>, message: impl Into<String>) {
        self.errors.push(RunError {
            scope: scope.into(),
            message: message.into(),
        });
    }

    pub fn total_candidates(&self) -> usize {
        self.candidates.values().map(Vec::len).sum()
    }

    pub fn candidate_count(&self, kind: ProviderKind) -> usize {
        self.candidates.get(&kind).map_or(0, Vec::len)
    }

    /// Results with a given outcome.
    pub fn outcome_count(&self, outcome: ExecutionOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Failed actions per kind, for the report.
    pub fn failures_by_kind(&self) -> BTreeMap<ProviderKind, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            if result.outcome == ExecutionOutcome::Failed {
                *counts.entry(result.kind).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Successes plus dry-run would-be successes.
    pub fn effective_success_count(&self) -> usize {
        self.outcome_count(ExecutionOutcome::Success)
            + self.outcome_count(ExecutionOutcome::SkippedDryRun)
    }
}
