//! Report assembly: invocation output, notification text, and the CLI table
//!
//! The notification truncation counts are part of the output contract:
//! per-category lists show the first 10 entries, the error list the first 5,
//! each with an "...and N more" suffix.

use serde_json::json;

use crate::summary::RunSummary;

/// Per-category entries shown before truncation
pub const CATEGORY_TRUNCATE: usize = 10;
/// Error entries shown before truncation
pub const ERROR_TRUNCATE: usize = 5;

/// The invocation's top-level output document. Status reflects completion
/// of the orchestration itself, independent of per-resource failures.
pub fn invocation_output(summary: &RunSummary) -> serde_json::Value {
    json!({
        "status": "success",
        "message": format!(
            "Auto-shutdown completed. {} resources processed.",
            summary.total_candidates()
        ),
        "correlation_id": summary.correlation_id,
        "dry_run": summary.dry_run,
        "summary": summary,
    })
}

pub fn notification_subject(summary: &RunSummary) -> String {
    format!(
        "Idle resource cleanup: {} resources {}",
        summary.total_candidates(),
        if summary.dry_run { "identified" } else { "processed" }
    )
}

/// Plain-text body for the notification side channel.
pub fn notification_body(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("Idle Resource Cleanup Report\n");
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(&format!(
        "Mode: {}\n",
        if summary.dry_run { "DRY RUN" } else { "EXECUTED" }
    ));
    out.push_str(&format!("Time: {}\n", summary.started_at.to_rfc3339()));
    out.push_str(&format!("Max Age: {} days\n", summary.max_age_days));
    out.push_str(&format!("Correlation ID: {}\n\n", summary.correlation_id));

    out.push_str("Resources Summary:\n");
    for (kind, bucket) in &summary.candidates {
        out.push_str(&format!("- {}: {}\n", kind.label(), bucket.len()));
    }

    if let Some(report) = &summary.cost_report {
        out.push_str(&format!(
            "\nEstimated monthly savings: ${:.2}\n",
            report.total_monthly_savings
        ));
    }

    for (kind, bucket) in &summary.candidates {
        if bucket.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", kind.label()));
        let entries: Vec<String> = bucket
            .iter()
            .map(|c| {
                format!(
                    "  - {} ({}) in {} - {} days old (~${:.2}/mo)",
                    c.resource.id,
                    c.resource.name,
                    c.resource.region,
                    c.age_days,
                    c.estimated_cost
                )
            })
            .collect();
        push_truncated(&mut out, &entries, CATEGORY_TRUNCATE);
    }

    if !summary.errors.is_empty() {
        out.push_str(&format!("\nErrors ({}):\n", summary.errors.len()));
        let entries: Vec<String> = summary
            .errors
            .iter()
            .map(|e| format!("  - {}: {}", e.scope, e.message))
            .collect();
        push_truncated(&mut out, &entries, ERROR_TRUNCATE);
    }

    if let Some(reason) = &summary.skip_reason {
        out.push_str(&format!("\nExecution skipped: {reason}\n"));
    } else if !summary.dry_run && summary.effective_success_count() > 0 {
        out.push_str(
            "\nTo restart resources:\n\
             - EC2: aws ec2 start-instances --instance-ids <instance-id>\n\
             - RDS: aws rds start-db-instance --db-instance-identifier <db-id>\n\
             - ECS: aws ecs update-service --cluster <cluster> --service <service> --desired-count <count>\n",
        );
    }

    out
}

/// Append up to `limit` entries and an "...and N more" suffix for the rest.
fn push_truncated(out: &mut String, entries: &[String], limit: usize) {
    for entry in entries.iter().take(limit) {
        out.push_str(entry);
        out.push('\n');
    }
    if entries.len() > limit {
        out.push_str(&format!("  ...and {} more\n", entries.len() - limit));
    }
}

/// Fixed-width table for the `report` subcommand.
pub fn render_table(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<18} {:<26} {:<14} {:<8} {:>10}\n",
        "TYPE", "ID", "REGION", "AGE", "COST/MO"
    ));
    out.push_str(&"-".repeat(80));
    out.push('\n');
    for bucket in summary.candidates.values() {
        for candidate in bucket {
            out.push_str(&format!(
                "{:<18} {:<26} {:<14} {:<8} {:>10.2}{}\n",
                candidate.resource.kind().as_str(),
                truncate_id(&candidate.resource.id, 25),
                candidate.resource.region,
                format!("{}d", candidate.age_days),
                candidate.estimated_cost,
                match &candidate.protection.reason {
                    Some(reason) => format!("  [protected: {reason}]"),
                    None => String::new(),
                }
            ));
        }
    }
    out.push_str(&format!("\nTotal: {} resources", summary.total_candidates()));
    if let Some(report) = &summary.cost_report {
        out.push_str(&format!(
            ", est. ${:.2}/month",
            report.total_monthly_savings
        ));
    }
    out.push('\n');
    out
}

fn truncate_id(id: &str, max: usize) -> String {
    if id.len() > max {
        format!("{}...", &id[..max.saturating_sub(3)])
    } else {
        id.to_string()
    }
}

/// Whether the notification side channel should fire for this run: only
/// when at least one eligible resource was handed to the executor.
pub fn should_notify(summary: &RunSummary) -> bool {
    !summary.results.is_empty()
}
