//! Run coordination: scan, decide, gate, execute
//!
//! Fully sequential: one region at a time, one provider kind at a time, one
//! candidate at a time. Every failure is caught at its own scope and
//! recorded; a bad region or resource never aborts the run.

use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cloud::{CleanupBackend, InventoryProvider, GLOBAL_REGION};
use crate::config::Settings;
use crate::context::RunContext;
use crate::cost;
use crate::eligibility::is_eligible;
use crate::executor::ActionExecutor;
use crate::prioritize::prioritize;
use crate::protection::{self, ProtectionDecision, ProtectionRuleSet};
use crate::resource::{CleanupCandidate, ProviderKind, ResourceDescriptor};
use crate::schedule;
use crate::summary::RunSummary;

/// Orchestrates one invocation end to end.
pub struct RunCoordinator<'a, I, B> {
    inventory: &'a I,
    backend: &'a B,
    settings: &'a Settings,
    rules: ProtectionRuleSet,
}

impl<'a, I, B> RunCoordinator<'a, I, B>
where
    I: InventoryProvider,
    B: CleanupBackend,
{
    /// Build the coordinator, loading protection rules once for the run.
    pub fn new(inventory: &'a I, backend: &'a B, settings: &'a Settings) -> Self {
        let mut rules = ProtectionRuleSet::built_in();
        for (kind, patterns) in &settings.exclusion_patterns {
            rules.add_exclusions(*kind, patterns);
        }
        Self {
            inventory,
            backend,
            settings,
            rules,
        }
    }

    pub async fn run(&self, ctx: &RunContext) -> RunSummary {
        let run_start = Instant::now();
        let mut summary = RunSummary::new(
            ctx.correlation_id.clone(),
            ctx.started_at,
            self.settings.max_age_days,
            self.settings.dry_run,
        );

        info!(
            correlation_id = %ctx.correlation_id,
            max_age_days = self.settings.max_age_days,
            dry_run = self.settings.dry_run,
            regions = ?self.settings.regions,
            "Starting cleanup run"
        );

        // Regional scan, fixed kind order inside each region.
        for region in &self.settings.regions {
            let region_start = Instant::now();
            for kind in ProviderKind::REGIONAL_SCAN_ORDER {
                self.scan_unit(&mut summary, kind, region, ctx).await;
            }
            summary.counters.region_scan_ms.insert(
                region.clone(),
                region_start.elapsed().as_millis() as u64,
            );
        }

        // Object stores are global: scanned exactly once, after all regions.
        self.scan_unit(&mut summary, ProviderKind::ObjectStore, GLOBAL_REGION, ctx)
            .await;

        // Ordering always runs; the aggregate report is opt-out.
        let cost_report = prioritize(&mut summary.candidates, self.settings.high_value_threshold);
        if self.settings.cost_analysis_enabled {
            summary.cost_report = Some(cost_report);
        }

        let decision = schedule::should_run(ctx.started_at, &self.settings.scheduling);
        if !decision.should_run {
            info!(reason = %decision.reason, "Scheduling gate denied execution window");
            summary.skip_reason = Some(decision.reason.clone());
            summary.schedule = Some(decision);
            summary.counters.total_ms = run_start.elapsed().as_millis() as u64;
            return summary;
        }
        summary.schedule = Some(decision);

        self.execute_eligible(&mut summary, ctx).await;

        summary.counters.total_ms = run_start.elapsed().as_millis() as u64;
        info!(
            candidates = summary.total_candidates(),
            executed = summary.results.len(),
            errors = summary.errors.len(),
            duration_ms = summary.counters.total_ms,
            "Cleanup run complete"
        );
        summary
    }

    /// Scan one (kind, region) unit, isolating its failures.
    async fn scan_unit(
        &self,
        summary: &mut RunSummary,
        kind: ProviderKind,
        region: &str,
        ctx: &RunContext,
    ) {
        debug!(kind = %kind, region = %region, "Scanning");
        match self.inventory.list(kind, region).await {
            Ok(descriptors) => {
                for descriptor in descriptors {
                    self.ingest(summary, descriptor, ctx);
                }
            }
            Err(error) => {
                warn!(kind = %kind, region = %region, error = %error, "Scan failed, continuing");
                summary.record_error(format!("{region}/{kind}"), error.to_string());
            }
        }
    }

    /// Turn one descriptor into a candidate if it clears the age threshold.
    fn ingest(&self, summary: &mut RunSummary, descriptor: ResourceDescriptor, ctx: &RunContext) {
        let age_days = descriptor.age_days(ctx.started_at);
        if age_days < self.settings.max_age_days {
            return;
        }

        // Computed exactly once per run; everything downstream reuses it.
        let protection = if self.settings.protection_enabled {
            protection::evaluate(&descriptor, &self.rules)
        } else {
            ProtectionDecision::unprotected()
        };

        let estimated_cost = cost::estimate_monthly_cost(&descriptor);

        info!(
            resource_id = %descriptor.id,
            name = %descriptor.name,
            kind = %descriptor.kind(),
            region = %descriptor.region,
            age_days,
            estimated_cost,
            protected = protection.protected,
            reason = ?protection.reason,
            "Found aged resource"
        );

        summary.push_candidate(CleanupCandidate {
            resource: descriptor,
            age_days,
            estimated_cost,
            protection,
        });
    }

    /// Execute every eligible candidate in prioritized order.
    async fn execute_eligible(&self, summary: &mut RunSummary, ctx: &RunContext) {
        let executor = ActionExecutor::new(self.backend, self.settings.dry_run);

        let eligible: Vec<CleanupCandidate> = summary
            .candidates
            .values()
            .flatten()
            .filter(|candidate| is_eligible(candidate, self.settings.max_age_days))
            .cloned()
            .collect();

        for candidate in &eligible {
            let action_start = Instant::now();
            let result = executor.execute(candidate, ctx).await;
            summary.counters.action_ms.insert(
                candidate.resource.id.clone(),
                action_start.elapsed().as_millis() as u64,
            );

            if let Some(detail) = &result.detail {
                if result.error_kind.is_some() {
                    summary.record_error(candidate.resource.id.clone(), detail.clone());
                }
            }
            summary.results.push(result);
        }
    }
}
