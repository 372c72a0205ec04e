//! Error taxonomy and AWS error classification
//!
//! Every failure is caught at the narrowest unit (one resource, one
//! region/kind scan) and recorded in the run summary; nothing here ever
//! aborts a run. Classification matches known AWS error codes against the
//! error chain's debug representation, which works uniformly across all the
//! service SDKs without per-operation downcasting.

use serde::Serialize;
use thiserror::Error;

use crate::resource::ProviderKind;

/// Category of a failed mutating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    NotFound,
    PermissionDenied,
    Conflict,
    Transient,
    Unknown,
}

impl ActionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionErrorKind::NotFound => "not_found",
            ActionErrorKind::PermissionDenied => "permission_denied",
            ActionErrorKind::Conflict => "conflict",
            ActionErrorKind::Transient => "transient",
            ActionErrorKind::Unknown => "unknown",
        }
    }
}

/// A failed mutating action. The executor performs no retries; retry
/// policy, if ever wanted, belongs to a caller.
#[derive(Debug, Error)]
#[error("{} ({})", detail, kind.as_str())]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub detail: String,
}

impl ActionError {
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self {
            kind: ActionErrorKind::Conflict,
            detail: detail.into(),
        }
    }

    /// Classify an adapter failure into the taxonomy.
    pub fn classify(error: &anyhow::Error) -> Self {
        let text = format!("{error:?}");
        Self {
            kind: classify_error_text(&text),
            detail: error.to_string(),
        }
    }
}

/// One region/kind inventory fetch failed.
#[derive(Debug, Error)]
#[error("scan failed for {kind} in {region}: {source}")]
pub struct ScanError {
    pub region: String,
    pub kind: ProviderKind,
    #[source]
    pub source: anyhow::Error,
}

impl ScanError {
    pub fn new(region: impl Into<String>, kind: ProviderKind, source: anyhow::Error) -> Self {
        Self {
            region: region.into(),
            kind,
            source,
        }
    }
}

/// Malformed or unreachable configuration. Always degrades to built-in
/// defaults; never fails an invocation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
    #[error("malformed config document: {0}")]
    Malformed(String),
    #[error("external config store unreachable: {0}")]
    StoreUnreachable(String),
}

/// Side-channel publish failed. Recorded and logged only; never changes the
/// invocation's reported status.
#[derive(Debug, Error)]
#[error("notification publish failed: {0}")]
pub struct NotificationError(pub String);

/// A serializable error entry for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunError {
    /// Narrowest unit the error was caught at, e.g. `us-east-1/compute_instance`
    /// or a resource id
    pub scope: String,
    pub message: String,
}

/// Known AWS error codes per category. Matched against the debug rendering
/// of the full error chain.
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "DBInstanceNotFound",
    "ClusterNotFoundException",
    "ServiceNotFoundException",
    "NatGatewayNotFound",
    "LoadBalancerNotFound",
    "NoSuchBucket",
    "NoSuchKey",
    "ResourceNotFoundException",
];

const PERMISSION_CODES: &[&str] = &[
    "UnauthorizedOperation",
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedException",
];

const CONFLICT_CODES: &[&str] = &[
    "DependencyViolation",
    "InvalidDBInstanceState",
    "IncorrectInstanceState",
    "ResourceInUseException",
    "BucketNotEmpty",
    "InvalidStateFault",
];

const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
    "ServiceUnavailable",
    "InternalFailure",
    "InternalError",
    "RequestTimeout",
];

/// Classify error text by known code, first category that matches.
pub fn classify_error_text(text: &str) -> ActionErrorKind {
    if NOT_FOUND_CODES.iter().any(|c| text.contains(c)) {
        ActionErrorKind::NotFound
    } else if PERMISSION_CODES.iter().any(|c| text.contains(c)) {
        ActionErrorKind::PermissionDenied
    } else if CONFLICT_CODES.iter().any(|c| text.contains(c)) {
        ActionErrorKind::Conflict
    } else if TRANSIENT_CODES.iter().any(|c| text.contains(c)) {
        ActionErrorKind::Transient
    } else {
        ActionErrorKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn known_codes_classify_into_their_category() {
        for code in NOT_FOUND_CODES {
            assert_eq!(classify_error_text(code), ActionErrorKind::NotFound);
        }
        for code in PERMISSION_CODES {
            assert_eq!(classify_error_text(code), ActionErrorKind::PermissionDenied);
        }
        for code in CONFLICT_CODES {
            assert_eq!(classify_error_text(code), ActionErrorKind::Conflict);
        }
        for code in TRANSIENT_CODES {
            assert_eq!(classify_error_text(code), ActionErrorKind::Transient);
        }
    }

    #[test]
    fn unknown_text_is_unknown() {
        assert_eq!(
            classify_error_text("connection refused"),
            ActionErrorKind::Unknown
        );
    }

    #[test]
    fn classify_walks_the_error_chain() {
        let source = anyhow!("service error: UnauthorizedOperation on stop-instances");
        let wrapped = source.context("Failed to stop instance");
        let action = ActionError::classify(&wrapped);
        assert_eq!(action.kind, ActionErrorKind::PermissionDenied);
        assert_eq!(action.detail, "Failed to stop instance");
    }

    #[test]
    fn scan_error_formats_scope() {
        let err = ScanError::new(
            "us-east-1",
            ProviderKind::ComputeInstance,
            anyhow!("timed out"),
        );
        assert!(err.to_string().contains("compute_instance"));
        assert!(err.to_string().contains("us-east-1"));
    }
}
