//! Go/no-go decision for one candidate
//!
//! Combines the age threshold, the protection decision already attached to
//! the candidate, and the per-kind liveness guards. Pure; the protection
//! status is never recomputed here.

use crate::resource::{CleanupCandidate, ResourceDetail};

/// True iff the candidate should be handed to the action executor.
///
/// Liveness guards: a search domain mid-transition is never eligible
/// regardless of age. An object store over the delete bound stays eligible —
/// it belongs in the report — and the executor refuses the actual delete.
pub fn is_eligible(candidate: &CleanupCandidate, max_age_days: i64) -> bool {
    if candidate.protection.protected {
        return false;
    }
    if candidate.age_days < max_age_days {
        return false;
    }
    match &candidate.resource.detail {
        ResourceDetail::SearchDomain { processing, .. } => !processing,
        _ => true,
    }
}
