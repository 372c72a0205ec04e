//! Per-invocation run context
//!
//! A hosting environment may reuse the same process across invocations, so
//! nothing run-scoped is ever process-wide: the correlation id and the time
//! snapshot live here, constructed fresh at the start of each run and passed
//! explicitly to every component.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Tags all log, metric, and summary output of one invocation
    pub correlation_id: String,
    /// Single time snapshot used for every age computation in the run
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Construct with an explicit clock, for deterministic tests.
    pub fn at(started_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            started_at,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
