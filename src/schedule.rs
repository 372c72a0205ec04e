//! Scheduling gate: should this run execute at all
//!
//! Evaluated once per invocation against the UTC hour. The cost-optimized
//! window is deliberately advisory-only: it records whether the run landed
//! in the preferred window but never blocks execution.

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Run unconditionally
    Always,
    /// Run only inside the business-hours window
    BusinessHoursOnly,
    /// Advisory: always runs, records whether the preferred window was hit
    CostOptimizedWindow,
    /// Run only at one configured hour
    ConservativeSingleWindow,
}

#[derive(Debug, Clone)]
pub struct SchedulingPolicy {
    pub mode: ScheduleMode,
    /// Separate flag; composes with the mode check via AND when enabled
    pub business_hours_only: bool,
    /// `[start, end)` in UTC hours
    pub business_hours: (u32, u32),
    /// Preferred execution window for the cost-optimized mode, `[start, end)`
    pub preferred_window: (u32, u32),
    /// The single permitted hour for the conservative mode
    pub conservative_hour: u32,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            mode: ScheduleMode::Always,
            business_hours_only: false,
            business_hours: (9, 17),
            preferred_window: (20, 24),
            conservative_hour: 22,
        }
    }
}

/// Outcome of the gate, kept in the summary for observability.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDecision {
    pub should_run: bool,
    pub mode: ScheduleMode,
    /// Only recorded for the cost-optimized mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_preferred_window: Option<bool>,
    pub reason: String,
}

/// Decide whether the run may execute at `now`.
pub fn should_run(now: DateTime<Utc>, policy: &SchedulingPolicy) -> ScheduleDecision {
    let hour = now.hour();

    let in_business_hours =
        hour >= policy.business_hours.0 && hour < policy.business_hours.1;
    let business_gate = !policy.business_hours_only || in_business_hours;

    let mut in_preferred_window = None;
    let (mode_gate, mode_reason) = match policy.mode {
        ScheduleMode::Always => (true, "mode 'always' permits execution".to_string()),
        ScheduleMode::BusinessHoursOnly => (
            in_business_hours,
            format!(
                "hour {hour} {} business hours {}-{}",
                if in_business_hours { "within" } else { "outside" },
                policy.business_hours.0,
                policy.business_hours.1
            ),
        ),
        ScheduleMode::CostOptimizedWindow => {
            let inside = hour >= policy.preferred_window.0 && hour < policy.preferred_window.1;
            in_preferred_window = Some(inside);
            // Advisory only; the window observation is recorded, not enforced
            (
                true,
                format!(
                    "cost-optimized window is advisory (hour {hour}, preferred {}-{})",
                    policy.preferred_window.0, policy.preferred_window.1
                ),
            )
        }
        ScheduleMode::ConservativeSingleWindow => (
            hour == policy.conservative_hour,
            format!(
                "hour {hour} {} the conservative window at {}",
                if hour == policy.conservative_hour {
                    "matches"
                } else {
                    "misses"
                },
                policy.conservative_hour
            ),
        ),
    };

    let should_run = business_gate && mode_gate;
    let reason = if !business_gate {
        format!(
            "hour {hour} outside business hours {}-{}",
            policy.business_hours.0, policy.business_hours.1
        )
    } else {
        mode_reason
    };

    ScheduleDecision {
        should_run,
        mode: policy.mode,
        in_preferred_window,
        reason,
    }
}
