//! Protection rules: which resources are exempt from cleanup
//!
//! Rules are loaded once per run and read-only thereafter. Evaluation is a
//! pure function of (descriptor, ruleset): no I/O, no mutation, first match
//! wins.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::pattern::Matcher;
use crate::resource::{ProviderKind, ResourceDescriptor};

/// Outcome of protection evaluation for one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectionDecision {
    pub protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ProtectionDecision {
    pub fn protected(reason: impl Into<String>) -> Self {
        Self {
            protected: true,
            reason: Some(reason.into()),
        }
    }

    pub fn unprotected() -> Self {
        Self {
            protected: false,
            reason: None,
        }
    }
}

/// Rules for one provider kind.
#[derive(Debug, Clone, Default)]
pub struct ProviderRules {
    /// Checked first. Under current semantics this is just another
    /// protection tier: there is no force-allow path, and none is added.
    pub whitelist: Vec<Matcher>,
    pub blacklist: Vec<Matcher>,
    pub regexes: Vec<Matcher>,
    /// Tag key -> values that protect; value comparison is
    /// case-insensitive. BTreeMap keeps evaluation order deterministic.
    pub protected_tags: BTreeMap<String, Vec<String>>,
    /// Type classes never cleaned up (e.g. free-tier sizes)
    pub protected_type_classes: Vec<String>,
}

impl ProviderRules {
    /// Append a regex rule, logging and skipping malformed input so one bad
    /// pattern never aborts evaluation of the rest.
    pub fn add_regex(&mut self, kind: ProviderKind, pattern: &str) {
        match Matcher::regex(pattern) {
            Ok(matcher) => self.regexes.push(matcher),
            Err(error) => {
                warn!(kind = %kind, pattern = %pattern, error = %error, "Skipping malformed protection regex");
            }
        }
    }
}

/// The complete per-run ruleset.
///
/// Kinds with no configured entry fall back to the built-in default rules,
/// never to an empty set.
#[derive(Debug, Clone)]
pub struct ProtectionRuleSet {
    rules: HashMap<ProviderKind, ProviderRules>,
    fallback: ProviderRules,
}

impl ProtectionRuleSet {
    /// Built-in defaults applied to every kind: production/keep-alive tags
    /// plus the free-tier type classes that are cheap enough to leave alone.
    pub fn built_in() -> Self {
        let mut rules = HashMap::new();
        for kind in [
            ProviderKind::ComputeInstance,
            ProviderKind::DatabaseInstance,
            ProviderKind::ContainerService,
            ProviderKind::NatGateway,
            ProviderKind::LoadBalancer,
            ProviderKind::ObjectStore,
            ProviderKind::SearchDomain,
        ] {
            rules.insert(kind, default_rules_for(kind));
        }
        Self {
            rules,
            fallback: base_tag_rules(),
        }
    }

    /// Add operator-supplied exclusion patterns (glob syntax) for one kind.
    pub fn add_exclusions(&mut self, kind: ProviderKind, patterns: &[String]) {
        let entry = self.rules.entry(kind).or_insert_with(|| default_rules_for(kind));
        for pattern in patterns {
            entry.blacklist.push(Matcher::glob(pattern));
        }
    }

    pub fn rules_for(&self, kind: ProviderKind) -> &ProviderRules {
        self.rules.get(&kind).unwrap_or(&self.fallback)
    }
}

/// Tag rules shared by every kind.
fn base_tag_rules() -> ProviderRules {
    let mut protected_tags = BTreeMap::new();
    protected_tags.insert(
        "Environment".to_string(),
        vec!["production".to_string(), "prod".to_string()],
    );
    protected_tags.insert("KeepAlive".to_string(), vec!["true".to_string()]);
    protected_tags.insert(
        "Protected".to_string(),
        vec!["true".to_string(), "yes".to_string()],
    );
    ProviderRules {
        protected_tags,
        ..ProviderRules::default()
    }
}

fn default_rules_for(kind: ProviderKind) -> ProviderRules {
    let mut rules = base_tag_rules();
    rules.protected_type_classes = match kind {
        // Free-tier sizes: stopping these saves nothing worth the churn
        ProviderKind::ComputeInstance => vec!["t2.micro".to_string(), "t3.micro".to_string()],
        ProviderKind::DatabaseInstance => {
            vec!["db.t2.micro".to_string(), "db.t3.micro".to_string()]
        }
        _ => Vec::new(),
    };
    rules
}

/// Evaluate protection for one resource. First match wins; the order below
/// is part of the observable contract.
pub fn evaluate(resource: &ResourceDescriptor, ruleset: &ProtectionRuleSet) -> ProtectionDecision {
    let rules = ruleset.rules_for(resource.kind());

    for matcher in &rules.whitelist {
        if matcher.matches(&resource.name) {
            return ProtectionDecision::protected(format!(
                "whitelisted by pattern '{}'",
                matcher.as_str()
            ));
        }
    }

    for matcher in &rules.blacklist {
        if matcher.matches(&resource.name) {
            return ProtectionDecision::protected(format!(
                "blacklisted by pattern '{}'",
                matcher.as_str()
            ));
        }
    }

    for matcher in &rules.regexes {
        if matcher.matches(&resource.name) {
            return ProtectionDecision::protected(format!(
                "regex match '{}'",
                matcher.as_str()
            ));
        }
    }

    for (key, values) in &rules.protected_tags {
        if let Some(value) = resource.tags.get(key) {
            if values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                return ProtectionDecision::protected(format!("protected tag {key}={value}"));
            }
        }
    }

    if rules
        .protected_type_classes
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&resource.type_class))
    {
        return ProtectionDecision::protected(format!(
            "protected type class '{}'",
            resource.type_class
        ));
    }

    ProtectionDecision::unprotected()
}
