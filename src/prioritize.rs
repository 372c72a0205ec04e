//! Cost-based ordering and savings aggregation
//!
//! Purely computational: orders each provider bucket by estimated cost so
//! the most expensive resources are acted on first, and rolls the totals up
//! for the report.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::resource::{CleanupCandidate, ProviderKind};

/// A candidate worth calling out in the report.
#[derive(Debug, Clone, Serialize)]
pub struct HighValueResource {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub region: String,
    pub estimated_cost: f64,
}

/// Aggregate cost view over all candidates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CostReport {
    pub total_monthly_savings: f64,
    pub high_value_resources: Vec<HighValueResource>,
    pub cost_by_region: BTreeMap<String, f64>,
}

/// Stable-sort each bucket descending by estimated cost and aggregate.
///
/// Equal-cost candidates keep their discovery order; this is relied on by
/// the execution ordering tests.
pub fn prioritize(
    candidates: &mut BTreeMap<ProviderKind, Vec<CleanupCandidate>>,
    high_value_threshold: f64,
) -> CostReport {
    let mut report = CostReport::default();

    for bucket in candidates.values_mut() {
        bucket.sort_by(|a, b| {
            b.estimated_cost
                .partial_cmp(&a.estimated_cost)
                .unwrap_or(Ordering::Equal)
        });
    }

    for candidate in candidates.values().flatten() {
        report.total_monthly_savings += candidate.estimated_cost;
        *report
            .cost_by_region
            .entry(candidate.resource.region.clone())
            .or_insert(0.0) += candidate.estimated_cost;

        if candidate.estimated_cost >= high_value_threshold {
            report.high_value_resources.push(HighValueResource {
                id: candidate.resource.id.clone(),
                name: candidate.resource.name.clone(),
                kind: candidate.resource.kind(),
                region: candidate.resource.region.clone(),
                estimated_cost: candidate.estimated_cost,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protection::ProtectionDecision;
    use crate::resource::{ResourceDescriptor, ResourceDetail};
    use chrono::Utc;
    use std::collections::HashMap;

    fn candidate(id: &str, region: &str, cost: f64) -> CleanupCandidate {
        CleanupCandidate {
            resource: ResourceDescriptor {
                id: id.to_string(),
                name: id.to_string(),
                region: region.to_string(),
                created_at: Some(Utc::now()),
                tags: HashMap::new(),
                type_class: "m5.large".to_string(),
                detail: ResourceDetail::ComputeInstance,
            },
            age_days: 5,
            estimated_cost: cost,
            protection: ProtectionDecision::unprotected(),
        }
    }

    fn bucket(candidates: Vec<CleanupCandidate>) -> BTreeMap<ProviderKind, Vec<CleanupCandidate>> {
        let mut map = BTreeMap::new();
        map.insert(ProviderKind::ComputeInstance, candidates);
        map
    }

    #[test]
    fn sorts_descending_by_cost() {
        let mut candidates = bucket(vec![
            candidate("a", "us-east-1", 5.0),
            candidate("b", "us-east-1", 50.0),
            candidate("c", "us-east-1", 20.0),
        ]);
        prioritize(&mut candidates, 100.0);

        let ordered: Vec<f64> = candidates[&ProviderKind::ComputeInstance]
            .iter()
            .map(|c| c.estimated_cost)
            .collect();
        assert_eq!(ordered, vec![50.0, 20.0, 5.0]);
    }

    #[test]
    fn equal_costs_keep_discovery_order() {
        let mut candidates = bucket(vec![
            candidate("first", "us-east-1", 20.0),
            candidate("second", "us-east-1", 20.0),
            candidate("big", "us-east-1", 90.0),
        ]);
        prioritize(&mut candidates, 100.0);

        let ids: Vec<&str> = candidates[&ProviderKind::ComputeInstance]
            .iter()
            .map(|c| c.resource.id.as_str())
            .collect();
        assert_eq!(ids, vec!["big", "first", "second"]);
    }

    #[test]
    fn aggregates_totals_and_regions() {
        let mut candidates = bucket(vec![
            candidate("a", "us-east-1", 10.0),
            candidate("b", "us-west-2", 30.0),
            candidate("c", "us-east-1", 60.0),
        ]);
        let report = prioritize(&mut candidates, 50.0);

        assert_eq!(report.total_monthly_savings, 100.0);
        assert_eq!(report.cost_by_region["us-east-1"], 70.0);
        assert_eq!(report.cost_by_region["us-west-2"], 30.0);
        assert_eq!(report.high_value_resources.len(), 1);
        assert_eq!(report.high_value_resources[0].id, "c");
    }
}
