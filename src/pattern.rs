//! Unified pattern matching for protection rules
//!
//! One capability with two variants: glob (wildcard/exact) and regex. Both
//! expose a single `matches` operation so rule evaluation never cares which
//! flavor a rule was written in.

use regex::{Regex, RegexBuilder};

/// A compiled name pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Wildcard pattern: `*` matches any sequence; without `*` the pattern
    /// requires exact equality. Always case-insensitive, always anchored
    /// over the full string.
    Glob { raw: String, regex: Regex },
    /// User-supplied regular expression, matched as-is.
    Regex { raw: String, regex: Regex },
}

impl Matcher {
    /// Compile a glob pattern. Infallible: every `*`-segment is
    /// regex-escaped before assembly.
    pub fn glob(pattern: &str) -> Self {
        let translated = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = RegexBuilder::new(&format!("^{translated}$"))
            .case_insensitive(true)
            .build()
            .expect("escaped glob translation always compiles");
        Matcher::Glob {
            raw: pattern.to_string(),
            regex,
        }
    }

    /// Compile a regex pattern. Malformed input is the caller's to handle;
    /// rule loading logs and skips it.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Regex {
            raw: pattern.to_string(),
            regex: Regex::new(pattern)?,
        })
    }

    pub fn matches(&self, input: &str) -> bool {
        match self {
            Matcher::Glob { regex, .. } | Matcher::Regex { regex, .. } => regex.is_match(input),
        }
    }

    /// The source text the rule was written with, for decision reasons.
    pub fn as_str(&self) -> &str {
        match self {
            Matcher::Glob { raw, .. } | Matcher::Regex { raw, .. } => raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_is_anchored() {
        let m = Matcher::glob("prod-*");
        assert!(m.matches("prod-db1"));
        assert!(m.matches("PROD-api"));
        assert!(!m.matches("dev-prod1"));
        assert!(!m.matches("my-prod-db1"));
    }

    #[test]
    fn glob_without_star_is_exact_case_insensitive() {
        let m = Matcher::glob("bastion");
        assert!(m.matches("bastion"));
        assert!(m.matches("Bastion"));
        assert!(!m.matches("bastion-2"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let m = Matcher::glob("db.primary");
        assert!(m.matches("db.primary"));
        assert!(!m.matches("dbxprimary"));
    }

    #[test]
    fn interior_star_matches_any_sequence() {
        let m = Matcher::glob("web-*-prod");
        assert!(m.matches("web-eu-prod"));
        assert!(m.matches("web--prod"));
        assert!(!m.matches("web-eu-staging"));
    }

    #[test]
    fn regex_variant_matches_as_written() {
        let m = Matcher::regex(r"^critical-\d+$").unwrap();
        assert!(m.matches("critical-42"));
        assert!(!m.matches("critical-forty"));
    }

    #[test]
    fn malformed_regex_is_an_error() {
        assert!(Matcher::regex("[unclosed").is_err());
    }
}
