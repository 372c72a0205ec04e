//! End-to-end engine tests against in-memory cloud fakes
//!
//! The fakes implement the inventory/backend seams and record every call,
//! so the tests can assert not just outcomes but which mutating operations
//! were (or were not) issued.

use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use idle_reaper::cloud::{CleanupBackend, InventoryProvider, GLOBAL_REGION};
use idle_reaper::config::Settings;
use idle_reaper::context::RunContext;
use idle_reaper::coordinator::RunCoordinator;
use idle_reaper::error::{ActionErrorKind, ScanError};
use idle_reaper::executor::ExecutionOutcome;
use idle_reaper::resource::{ProviderKind, ResourceDescriptor, ResourceDetail};
use idle_reaper::schedule::ScheduleMode;
use idle_reaper::summary::RunSummary;

// ── Fakes ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeInventory {
    resources: HashMap<(String, ProviderKind), Vec<ResourceDescriptor>>,
    failing_units: HashSet<(String, ProviderKind)>,
}

impl FakeInventory {
    fn with_resources(resources: Vec<ResourceDescriptor>) -> Self {
        let mut inventory = Self::default();
        for resource in resources {
            inventory
                .resources
                .entry((resource.region.clone(), resource.kind()))
                .or_default()
                .push(resource);
        }
        inventory
    }

    fn fail_unit(&mut self, region: &str, kind: ProviderKind) {
        self.failing_units.insert((region.to_string(), kind));
    }
}

impl InventoryProvider for FakeInventory {
    async fn list(
        &self,
        kind: ProviderKind,
        region: &str,
    ) -> Result<Vec<ResourceDescriptor>, ScanError> {
        if self.failing_units.contains(&(region.to_string(), kind)) {
            return Err(ScanError::new(region, kind, anyhow!("simulated API outage")));
        }
        Ok(self
            .resources
            .get(&(region.to_string(), kind))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeBackend {
    /// Mutating operations, in call order, as "op:resource_id"
    mutations: Mutex<Vec<String>>,
    /// Audit tags applied, as (resource_id, tags)
    tagged: Mutex<Vec<(String, Vec<(String, String)>)>>,
    /// Object counts per store id, for the delete bound
    object_counts: HashMap<String, usize>,
    /// Error text to fail a resource's action with
    failing_actions: HashMap<String, String>,
}

impl FakeBackend {
    fn mutate(&self, op: &str, id: &str) -> anyhow::Result<()> {
        if let Some(error) = self.failing_actions.get(id) {
            return Err(anyhow!("{error}"));
        }
        self.mutations.lock().unwrap().push(format!("{op}:{id}"));
        Ok(())
    }

    fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    fn tagged(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.tagged.lock().unwrap().clone()
    }
}

impl CleanupBackend for FakeBackend {
    async fn stop_compute_instance(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("stop_compute", &r.id)
    }

    async fn stop_database_instance(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("stop_database", &r.id)
    }

    async fn scale_container_to_zero(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("scale_to_zero", &r.id)
    }

    async fn delete_nat_gateway(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("delete_nat", &r.id)
    }

    async fn delete_load_balancer(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("delete_lb", &r.id)
    }

    async fn delete_search_domain(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("delete_domain", &r.id)
    }

    async fn count_store_objects(
        &self,
        r: &ResourceDescriptor,
        _limit: usize,
    ) -> anyhow::Result<usize> {
        Ok(*self.object_counts.get(&r.id).unwrap_or(&0))
    }

    async fn empty_and_delete_store(&self, r: &ResourceDescriptor) -> anyhow::Result<()> {
        self.mutate("empty_and_delete", &r.id)
    }

    async fn apply_audit_tags(
        &self,
        r: &ResourceDescriptor,
        tags: &[(String, String)],
    ) -> anyhow::Result<()> {
        self.tagged
            .lock()
            .unwrap()
            .push((r.id.clone(), tags.to_vec()));
        Ok(())
    }
}

// ── Fixtures ───────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap()
}

fn compute(id: &str, region: &str, age_days: i64, type_class: &str) -> ResourceDescriptor {
    ResourceDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        region: region.to_string(),
        created_at: Some(now() - Duration::days(age_days)),
        tags: HashMap::new(),
        type_class: type_class.to_string(),
        detail: ResourceDetail::ComputeInstance,
    }
}

fn tagged_compute(
    id: &str,
    region: &str,
    age_days: i64,
    tags: &[(&str, &str)],
) -> ResourceDescriptor {
    ResourceDescriptor {
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..compute(id, region, age_days, "m5.large")
    }
}

fn bucket(id: &str, age_days: i64, object_count: usize) -> ResourceDescriptor {
    ResourceDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        region: GLOBAL_REGION.to_string(),
        created_at: Some(now() - Duration::days(age_days)),
        tags: HashMap::new(),
        type_class: "standard".to_string(),
        detail: ResourceDetail::ObjectStore {
            object_count: Some(object_count),
            size_gb: None,
        },
    }
}

fn settings(regions: &[&str], dry_run: bool) -> Settings {
    Settings {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        dry_run,
        max_age_days: 3,
        ..Settings::default()
    }
}

async fn run_engine(
    inventory: &FakeInventory,
    backend: &FakeBackend,
    settings: &Settings,
) -> RunSummary {
    let ctx = RunContext::at(now());
    RunCoordinator::new(inventory, backend, settings)
        .run(&ctx)
        .await
}

fn candidate_ids(summary: &RunSummary, kind: ProviderKind) -> Vec<String> {
    summary
        .candidates
        .get(&kind)
        .map(|bucket| bucket.iter().map(|c| c.resource.id.clone()).collect())
        .unwrap_or_default()
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dry_run_never_calls_the_mutating_backend() {
    let inventory = FakeInventory::with_resources(vec![
        compute("i-old", "us-east-1", 5, "m5.large"),
        bucket("stale-artifacts", 10, 4),
    ]);
    let backend = FakeBackend::default();

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], true)).await;

    assert_eq!(summary.total_candidates(), 2);
    assert_eq!(summary.results.len(), 2);
    assert!(summary
        .results
        .iter()
        .all(|r| r.outcome == ExecutionOutcome::SkippedDryRun));
    assert!(backend.mutations().is_empty());
    assert!(backend.tagged().is_empty());
}

#[tokio::test]
async fn scan_failure_in_one_region_does_not_block_another() {
    let mut inventory =
        FakeInventory::with_resources(vec![compute("i-in-y", "region-y", 6, "m5.large")]);
    inventory.fail_unit("region-x", ProviderKind::ComputeInstance);
    let backend = FakeBackend::default();

    let summary = run_engine(
        &inventory,
        &backend,
        &settings(&["region-x", "region-y"], true),
    )
    .await;

    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].scope, "region-x/compute_instance");
    assert_eq!(
        candidate_ids(&summary, ProviderKind::ComputeInstance),
        vec!["i-in-y"]
    );
}

#[tokio::test]
async fn crowded_object_store_is_refused_not_deleted() {
    let inventory = FakeInventory::with_resources(vec![bucket("big-bucket", 10, 150)]);
    let mut backend = FakeBackend::default();
    backend.object_counts.insert("big-bucket".to_string(), 150);

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    let result = &summary.results[0];
    assert_eq!(result.outcome, ExecutionOutcome::Failed);
    assert_eq!(result.error_kind, Some(ActionErrorKind::Conflict));
    assert!(result.detail.as_deref().unwrap().contains("not empty"));
    assert!(backend.mutations().is_empty());
}

#[tokio::test]
async fn small_object_store_is_emptied_then_deleted() {
    let inventory = FakeInventory::with_resources(vec![bucket("small-bucket", 10, 50)]);
    let mut backend = FakeBackend::default();
    backend.object_counts.insert("small-bucket".to_string(), 50);

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    assert_eq!(summary.results[0].outcome, ExecutionOutcome::Success);
    assert_eq!(backend.mutations(), vec!["empty_and_delete:small-bucket"]);
}

#[tokio::test]
async fn end_to_end_age_and_protection_filtering() {
    // A: old and untagged -> executed and tagged
    // B: too young -> never becomes a candidate
    // C: old but production-tagged -> candidate, protected, untouched
    let inventory = FakeInventory::with_resources(vec![
        compute("i-a", "us-east-1", 5, "m5.large"),
        compute("i-b", "us-east-1", 1, "m5.large"),
        tagged_compute("i-c", "us-east-1", 10, &[("Environment", "production")]),
    ]);
    let backend = FakeBackend::default();

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    let ids = candidate_ids(&summary, ProviderKind::ComputeInstance);
    assert!(ids.contains(&"i-a".to_string()));
    assert!(!ids.contains(&"i-b".to_string()));
    assert!(ids.contains(&"i-c".to_string()));

    let c = summary.candidates[&ProviderKind::ComputeInstance]
        .iter()
        .find(|c| c.resource.id == "i-c")
        .unwrap();
    assert!(c.protection.protected);
    assert!(c
        .protection
        .reason
        .as_deref()
        .unwrap()
        .contains("Environment=production"));

    // Only A was executed, and only A was tagged.
    assert_eq!(backend.mutations(), vec!["stop_compute:i-a"]);
    let tagged = backend.tagged();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].0, "i-a");
    assert!(tagged[0]
        .1
        .iter()
        .any(|(k, v)| k == "AutoShutdown" && v == "2024-06-03"));
    assert!(tagged[0]
        .1
        .iter()
        .any(|(k, v)| k == "AutoShutdownReason" && v == "Running-for-5-days"));

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].resource_id, "i-a");
    assert_eq!(summary.results[0].outcome, ExecutionOutcome::Success);
}

#[tokio::test]
async fn denied_window_returns_summary_without_any_actions() {
    let inventory =
        FakeInventory::with_resources(vec![compute("i-old", "us-east-1", 5, "m5.large")]);
    let backend = FakeBackend::default();

    let mut cfg = settings(&["us-east-1"], false);
    cfg.scheduling.mode = ScheduleMode::ConservativeSingleWindow;
    cfg.scheduling.conservative_hour = 22; // fixture clock is at 10:00 UTC

    let summary = run_engine(&inventory, &backend, &cfg).await;

    assert!(summary.skip_reason.is_some());
    assert_eq!(summary.total_candidates(), 1);
    assert!(summary.results.is_empty());
    assert!(backend.mutations().is_empty());
}

#[tokio::test]
async fn execution_follows_cost_priority_order() {
    // Same kind, same age; costs come from the type-class table.
    let inventory = FakeInventory::with_resources(vec![
        compute("i-cheap", "us-east-1", 5, "c5.large"), // 61.20
        compute("i-dear", "us-east-1", 5, "m5.xlarge"), // 138.00
        compute("i-mid", "us-east-1", 5, "m5.large"),   // 69.00
    ]);
    let backend = FakeBackend::default();

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    assert_eq!(
        candidate_ids(&summary, ProviderKind::ComputeInstance),
        vec!["i-dear", "i-mid", "i-cheap"]
    );
    assert_eq!(
        backend.mutations(),
        vec![
            "stop_compute:i-dear",
            "stop_compute:i-mid",
            "stop_compute:i-cheap"
        ]
    );
}

#[tokio::test]
async fn failed_action_is_classified_and_does_not_stop_the_run() {
    let inventory = FakeInventory::with_resources(vec![
        compute("i-denied", "us-east-1", 5, "m5.xlarge"),
        compute("i-fine", "us-east-1", 5, "m5.large"),
    ]);
    let mut backend = FakeBackend::default();
    backend.failing_actions.insert(
        "i-denied".to_string(),
        "UnauthorizedOperation: not allowed to stop instances".to_string(),
    );

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    let denied = summary
        .results
        .iter()
        .find(|r| r.resource_id == "i-denied")
        .unwrap();
    assert_eq!(denied.outcome, ExecutionOutcome::Failed);
    assert_eq!(denied.error_kind, Some(ActionErrorKind::PermissionDenied));

    let fine = summary
        .results
        .iter()
        .find(|r| r.resource_id == "i-fine")
        .unwrap();
    assert_eq!(fine.outcome, ExecutionOutcome::Success);

    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].scope, "i-denied");
}

#[tokio::test]
async fn processing_search_domain_is_reported_but_never_executed() {
    let inventory = FakeInventory::with_resources(vec![ResourceDescriptor {
        id: "logs".to_string(),
        name: "logs".to_string(),
        region: "us-east-1".to_string(),
        created_at: None,
        tags: HashMap::new(),
        type_class: "t3.small.search".to_string(),
        detail: ResourceDetail::SearchDomain {
            arn: "arn:aws:es:us-east-1:123:domain/logs".to_string(),
            processing: true,
        },
    }]);
    let backend = FakeBackend::default();

    let summary = run_engine(&inventory, &backend, &settings(&["us-east-1"], false)).await;

    // Old via the 30-day fallback, so it is a candidate; the liveness guard
    // keeps it away from the executor.
    assert_eq!(summary.candidate_count(ProviderKind::SearchDomain), 1);
    assert!(summary.results.is_empty());
    assert!(backend.mutations().is_empty());
}
