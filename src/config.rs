//! Runtime configuration
//!
//! Settings come from the environment (or an overlay fetched from the
//! external config store), with invocation payload overrides applied last.
//! A malformed value never fails the run: it is logged and replaced by the
//! built-in default.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::ConfigError;
use crate::resource::ProviderKind;
use crate::schedule::{ScheduleMode, SchedulingPolicy};

pub const DEFAULT_MAX_AGE_DAYS: i64 = 3;
pub const DEFAULT_REGIONS: &[&str] = &["us-east-1", "us-west-2", "ap-southeast-2"];
pub const DEFAULT_HIGH_VALUE_THRESHOLD: f64 = 50.0;
pub const DEFAULT_COST_PRIORITY_THRESHOLD: f64 = 10.0;

/// Environment keys carrying per-kind exclusion pattern lists.
const EXCLUSION_KEYS: &[(&str, ProviderKind)] = &[
    ("EC2_EXCLUSION_PATTERNS", ProviderKind::ComputeInstance),
    ("RDS_EXCLUSION_PATTERNS", ProviderKind::DatabaseInstance),
    ("ECS_EXCLUSION_PATTERNS", ProviderKind::ContainerService),
    ("ELB_EXCLUSION_PATTERNS", ProviderKind::LoadBalancer),
    ("S3_EXCLUSION_PATTERNS", ProviderKind::ObjectStore),
    ("SEARCH_EXCLUSION_PATTERNS", ProviderKind::SearchDomain),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Minimal,
    Verbose,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "minimal" => Some(LogLevel::Minimal),
            "verbose" => Some(LogLevel::Verbose),
            _ => None,
        }
    }

    /// Default tracing directive for this level
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Minimal => "info",
            LogLevel::Verbose => "debug",
        }
    }
}

/// Where the settings overlay comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Env,
    ExternalStore { bucket: String, key: String },
    Default,
}

/// Optional invocation payload; absent keys fall back to configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationInput {
    pub max_age_days: Option<i64>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub max_age_days: i64,
    pub dry_run: bool,
    pub regions: Vec<String>,
    pub log_level: LogLevel,
    pub cost_analysis_enabled: bool,
    pub high_value_threshold: f64,
    pub cost_priority_threshold: f64,
    pub scheduling: SchedulingPolicy,
    pub protection_enabled: bool,
    pub exclusion_patterns: BTreeMap<ProviderKind, Vec<String>>,
    pub sns_topic_arn: Option<String>,
    pub config_source: ConfigSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            dry_run: false,
            regions: DEFAULT_REGIONS.iter().map(|r| r.to_string()).collect(),
            log_level: LogLevel::Minimal,
            cost_analysis_enabled: true,
            high_value_threshold: DEFAULT_HIGH_VALUE_THRESHOLD,
            cost_priority_threshold: DEFAULT_COST_PRIORITY_THRESHOLD,
            scheduling: SchedulingPolicy::default(),
            protection_enabled: true,
            exclusion_patterns: BTreeMap::new(),
            sns_topic_arn: None,
            config_source: ConfigSource::Env,
        }
    }
}

impl Settings {
    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Every malformed value degrades to
    /// its default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();

        let mut exclusion_patterns = BTreeMap::new();
        for (key, kind) in EXCLUSION_KEYS {
            if let Some(raw) = lookup(key) {
                let patterns = parse_list(&raw);
                if !patterns.is_empty() {
                    exclusion_patterns.insert(*kind, patterns);
                }
            }
        }

        let scheduling = SchedulingPolicy {
            mode: lookup("SCHEDULING_MODE")
                .map(|raw| parse_scheduling_mode(&raw))
                .unwrap_or(defaults.scheduling.mode),
            business_hours_only: parse_or_default(
                &lookup,
                "BUSINESS_HOURS_ONLY",
                defaults.scheduling.business_hours_only,
                parse_bool,
            ),
            ..defaults.scheduling.clone()
        };

        Self {
            max_age_days: parse_or_default(
                &lookup,
                "MAX_AGE_DAYS",
                defaults.max_age_days,
                |raw| raw.parse::<i64>().ok().filter(|v| *v >= 0),
            ),
            dry_run: parse_or_default(&lookup, "DRY_RUN", defaults.dry_run, parse_bool),
            regions: lookup("REGIONS")
                .map(|raw| parse_list(&raw))
                .filter(|regions| !regions.is_empty())
                .unwrap_or(defaults.regions),
            log_level: parse_or_default(&lookup, "LOG_LEVEL", defaults.log_level, LogLevel::parse),
            cost_analysis_enabled: parse_or_default(
                &lookup,
                "COST_ANALYSIS_ENABLED",
                defaults.cost_analysis_enabled,
                parse_bool,
            ),
            high_value_threshold: parse_or_default(
                &lookup,
                "HIGH_VALUE_THRESHOLD",
                defaults.high_value_threshold,
                |raw| raw.parse::<f64>().ok(),
            ),
            cost_priority_threshold: parse_or_default(
                &lookup,
                "COST_PRIORITY_THRESHOLD",
                defaults.cost_priority_threshold,
                |raw| raw.parse::<f64>().ok(),
            ),
            scheduling,
            protection_enabled: parse_or_default(
                &lookup,
                "PROTECTION_ENABLED",
                defaults.protection_enabled,
                parse_bool,
            ),
            exclusion_patterns,
            sns_topic_arn: lookup("SNS_TOPIC_ARN").filter(|arn| !arn.is_empty()),
            config_source: parse_config_source(&lookup),
        }
    }

    /// Apply invocation payload overrides on top of loaded settings.
    pub fn apply_input(&mut self, input: &InvocationInput) {
        if let Some(max_age_days) = input.max_age_days {
            self.max_age_days = max_age_days;
        }
        if let Some(dry_run) = input.dry_run {
            self.dry_run = dry_run;
        }
    }

    /// Overlay a JSON document of env-style keys fetched from the external
    /// config store. Store values win over the environment; a malformed
    /// document degrades to the current settings.
    pub fn apply_external(&mut self, body: &str) -> Result<(), ConfigError> {
        let overlay: BTreeMap<String, String> =
            serde_json::from_str(body).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        let merged = Self::from_lookup(|key| {
            overlay
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        });
        let config_source = self.config_source.clone();
        *self = Settings {
            config_source,
            ..merged
        };
        Ok(())
    }
}

fn parse_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match parse(&raw) {
            Some(value) => value,
            None => {
                let error = ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                };
                warn!(error = %error, "Falling back to default");
                default
            }
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `cost_optimized`, `aggressive`, and `conservative` are the operator-facing
/// names; unknown values degrade to `always` with a warning.
fn parse_scheduling_mode(raw: &str) -> ScheduleMode {
    match raw.to_ascii_lowercase().as_str() {
        "aggressive" | "always" => ScheduleMode::Always,
        "cost_optimized" => ScheduleMode::CostOptimizedWindow,
        "conservative" => ScheduleMode::ConservativeSingleWindow,
        "business_hours" => ScheduleMode::BusinessHoursOnly,
        other => {
            let error = ConfigError::InvalidValue {
                key: "SCHEDULING_MODE".to_string(),
                value: other.to_string(),
            };
            warn!(error = %error, "Falling back to 'always'");
            ScheduleMode::Always
        }
    }
}

fn parse_config_source(lookup: &impl Fn(&str) -> Option<String>) -> ConfigSource {
    match lookup("CONFIG_SOURCE").as_deref() {
        Some("external_store") => {
            match (lookup("CONFIG_BUCKET"), lookup("CONFIG_KEY")) {
                (Some(bucket), Some(key)) if !bucket.is_empty() && !key.is_empty() => {
                    ConfigSource::ExternalStore { bucket, key }
                }
                _ => {
                    warn!("CONFIG_SOURCE=external_store without CONFIG_BUCKET/CONFIG_KEY, using environment");
                    ConfigSource::Env
                }
            }
        }
        Some("default") => ConfigSource::Default,
        _ => ConfigSource::Env,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let settings = settings_from(&[]);
        assert_eq!(settings.max_age_days, 3);
        assert!(!settings.dry_run);
        assert_eq!(settings.regions, DEFAULT_REGIONS.to_vec());
        assert!(settings.protection_enabled);
        assert_eq!(settings.scheduling.mode, ScheduleMode::Always);
        assert_eq!(settings.config_source, ConfigSource::Env);
    }

    #[test]
    fn values_parse_from_lookup() {
        let settings = settings_from(&[
            ("MAX_AGE_DAYS", "7"),
            ("DRY_RUN", "true"),
            ("REGIONS", "eu-west-1, eu-central-1"),
            ("LOG_LEVEL", "verbose"),
            ("HIGH_VALUE_THRESHOLD", "120.5"),
            ("SCHEDULING_MODE", "conservative"),
            ("BUSINESS_HOURS_ONLY", "yes"),
            ("SNS_TOPIC_ARN", "arn:aws:sns:us-east-1:123:alerts"),
        ]);
        assert_eq!(settings.max_age_days, 7);
        assert!(settings.dry_run);
        assert_eq!(settings.regions, vec!["eu-west-1", "eu-central-1"]);
        assert_eq!(settings.log_level, LogLevel::Verbose);
        assert_eq!(settings.high_value_threshold, 120.5);
        assert_eq!(
            settings.scheduling.mode,
            ScheduleMode::ConservativeSingleWindow
        );
        assert!(settings.scheduling.business_hours_only);
        assert_eq!(
            settings.sns_topic_arn.as_deref(),
            Some("arn:aws:sns:us-east-1:123:alerts")
        );
    }

    #[test]
    fn malformed_values_degrade_to_defaults() {
        let settings = settings_from(&[
            ("MAX_AGE_DAYS", "three"),
            ("DRY_RUN", "maybe"),
            ("SCHEDULING_MODE", "yolo"),
            ("HIGH_VALUE_THRESHOLD", "lots"),
        ]);
        assert_eq!(settings.max_age_days, DEFAULT_MAX_AGE_DAYS);
        assert!(!settings.dry_run);
        assert_eq!(settings.scheduling.mode, ScheduleMode::Always);
        assert_eq!(settings.high_value_threshold, DEFAULT_HIGH_VALUE_THRESHOLD);
    }

    #[test]
    fn negative_max_age_is_rejected() {
        let settings = settings_from(&[("MAX_AGE_DAYS", "-2")]);
        assert_eq!(settings.max_age_days, DEFAULT_MAX_AGE_DAYS);
    }

    #[test]
    fn exclusion_patterns_parse_per_kind() {
        let settings = settings_from(&[
            ("EC2_EXCLUSION_PATTERNS", "prod-*,bastion"),
            ("S3_EXCLUSION_PATTERNS", "tf-state-*"),
        ]);
        assert_eq!(
            settings.exclusion_patterns[&ProviderKind::ComputeInstance],
            vec!["prod-*", "bastion"]
        );
        assert_eq!(
            settings.exclusion_patterns[&ProviderKind::ObjectStore],
            vec!["tf-state-*"]
        );
        assert!(!settings
            .exclusion_patterns
            .contains_key(&ProviderKind::DatabaseInstance));
    }

    #[test]
    fn external_store_source_requires_location() {
        let settings = settings_from(&[
            ("CONFIG_SOURCE", "external_store"),
            ("CONFIG_BUCKET", "ops-config"),
            ("CONFIG_KEY", "reaper.json"),
        ]);
        assert_eq!(
            settings.config_source,
            ConfigSource::ExternalStore {
                bucket: "ops-config".to_string(),
                key: "reaper.json".to_string()
            }
        );

        let incomplete = settings_from(&[("CONFIG_SOURCE", "external_store")]);
        assert_eq!(incomplete.config_source, ConfigSource::Env);
    }

    #[test]
    fn payload_overrides_win() {
        let mut settings = settings_from(&[("MAX_AGE_DAYS", "7")]);
        settings.apply_input(&InvocationInput {
            max_age_days: Some(1),
            dry_run: Some(true),
        });
        assert_eq!(settings.max_age_days, 1);
        assert!(settings.dry_run);
    }

    #[test]
    fn external_overlay_wins_over_defaults() {
        let mut settings = settings_from(&[]);
        settings
            .apply_external(r#"{"MAX_AGE_DAYS": "14", "DRY_RUN": "true"}"#)
            .unwrap();
        assert_eq!(settings.max_age_days, 14);
        assert!(settings.dry_run);

        // Malformed overlay leaves settings untouched
        let before = settings.max_age_days;
        assert!(settings.apply_external("not json").is_err());
        assert_eq!(settings.max_age_days, before);
    }
}
