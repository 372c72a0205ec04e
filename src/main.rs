//! idle-reaper: scan AWS for aged resources and shut them down
//!
//! `run` performs the full gated cleanup; `report` is scan-only and never
//! mutates anything.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use idle_reaper::aws::{AwsCloud, S3Client, SnsNotifier};
use idle_reaper::cloud::Notifier;
use idle_reaper::config::{ConfigSource, InvocationInput, LogLevel, Settings};
use idle_reaper::context::RunContext;
use idle_reaper::coordinator::RunCoordinator;
use idle_reaper::metrics::RunMetrics;
use idle_reaper::report;

#[derive(Parser, Debug)]
#[command(name = "idle-reaper")]
#[command(about = "Policy-governed shutdown of idle AWS resources")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all configured regions and execute cleanup actions
    Run {
        /// Override the configured age threshold in days
        #[arg(long)]
        max_age_days: Option<i64>,

        /// Evaluate and report without performing any mutating action
        #[arg(long)]
        dry_run: bool,

        /// Comma-separated region override
        #[arg(long)]
        regions: Option<String>,

        /// Write the invocation output JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Scan and report resource ages without executing anything
    Report {
        /// Override the configured age threshold in days
        #[arg(long)]
        max_age_days: Option<i64>,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    init_tracing();

    let mut settings = Settings::from_env();
    load_external_config(&mut settings).await;

    match args.command {
        Command::Run {
            max_age_days,
            dry_run,
            regions,
            output,
        } => {
            if let Some(raw) = regions {
                let parsed: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if !parsed.is_empty() {
                    settings.regions = parsed;
                }
            }
            settings.apply_input(&InvocationInput {
                max_age_days,
                dry_run: dry_run.then_some(true),
            });

            run_cleanup(settings, output.as_deref()).await
        }

        Command::Report {
            max_age_days,
            format,
            output,
        } => {
            settings.apply_input(&InvocationInput {
                max_age_days,
                // A report never mutates, whatever the environment says.
                dry_run: Some(true),
            });
            run_report(settings, &format, output.as_deref()).await
        }
    }
}

fn init_tracing() {
    // LOG_LEVEL applies unless RUST_LOG overrides it explicitly.
    let default_directive = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|raw| LogLevel::parse(&raw))
        .unwrap_or(LogLevel::Minimal)
        .directive();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Overlay settings from the external config store when configured.
/// Unreachable or malformed store config degrades to what we already have.
async fn load_external_config(settings: &mut Settings) {
    let ConfigSource::ExternalStore { bucket, key } = settings.config_source.clone() else {
        return;
    };

    let ctx = idle_reaper::aws::AwsContext::new("us-east-1").await;
    match S3Client::from_context(&ctx)
        .get_object_string(&bucket, &key)
        .await
    {
        Ok(body) => {
            if let Err(error) = settings.apply_external(&body) {
                warn!(error = %error, "External config rejected, keeping environment settings");
            } else {
                info!(bucket = %bucket, key = %key, "Loaded settings overlay from config store");
            }
        }
        Err(error) => {
            warn!(bucket = %bucket, key = %key, error = ?error, "External config unreachable, keeping environment settings");
        }
    }
}

async fn run_cleanup(settings: Settings, output: Option<&str>) -> Result<()> {
    let ctx = RunContext::new();
    let cloud = AwsCloud::connect(&settings.regions).await;

    let coordinator = RunCoordinator::new(&cloud, &cloud, &settings);
    let summary = coordinator.run(&ctx).await;

    RunMetrics::from_summary(&summary).emit();

    if report::should_notify(&summary) {
        if let Some(topic_arn) = &settings.sns_topic_arn {
            let notifier = SnsNotifier::new(cloud.home_context(), topic_arn.as_str());
            let subject = report::notification_subject(&summary);
            let body = report::notification_body(&summary);
            // Recorded only; a failed publish never changes the run status.
            if let Err(error) = notifier.publish(&subject, &body).await {
                warn!(error = %error, "Notification publish failed");
            }
        }
    }

    let document = report::invocation_output(&summary);
    write_output(&serde_json::to_string_pretty(&document)?, output)?;

    Ok(())
}

async fn run_report(settings: Settings, format: &str, output: Option<&str>) -> Result<()> {
    let ctx = RunContext::new();
    let cloud = AwsCloud::connect(&settings.regions).await;

    let coordinator = RunCoordinator::new(&cloud, &cloud, &settings);
    let summary = coordinator.run(&ctx).await;

    let rendered = if format == "json" {
        serde_json::to_string_pretty(&report::invocation_output(&summary))?
    } else {
        report::render_table(&summary)
    };
    write_output(&rendered, output)?;

    Ok(())
}

fn write_output(content: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            info!(path = %path, "Wrote output");
        }
        None => println!("{content}"),
    }
    Ok(())
}
