//! Audit tag constants and helpers
//!
//! Resources that survive their cleanup action (stopped instances and
//! databases) are marked so an operator can see when and why they were shut
//! down, and how to tell an automated stop from a manual one.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `AutoShutdown` | Date the action ran (`YYYY-MM-DD`) |
//! | `AutoShutdownReason` | `Running-for-<N>-days` at decision time |

use chrono::{DateTime, Utc};

/// Tag key recording the shutdown date
pub const TAG_AUTO_SHUTDOWN: &str = "AutoShutdown";

/// Tag key recording the triggering age
pub const TAG_AUTO_SHUTDOWN_REASON: &str = "AutoShutdownReason";

/// Conventional name tag on EC2-style resources
pub const TAG_NAME: &str = "Name";

/// Build the audit marker pair for one actioned resource.
pub fn audit_tags(now: DateTime<Utc>, age_days: i64) -> Vec<(String, String)> {
    vec![
        (
            TAG_AUTO_SHUTDOWN.to_string(),
            now.format("%Y-%m-%d").to_string(),
        ),
        (
            TAG_AUTO_SHUTDOWN_REASON.to_string(),
            format!("Running-for-{age_days}-days"),
        ),
    ]
}
