use serde::{Deserialize, Serialize};

/// Machine-readable error codes.
/// Shared by the approver and the trust store so callers can surface a
/// stable code next to the human-readable reason.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // CSR validation
    MalformedRequest,
    SubjectPrefix,
    MissingOrganization,
    DnsNotPermitted,
    IpNotPermitted,
    MissingGroups,
    InvalidUsages,
    EntityNotFound,
    LookupFailed,
    // Trust store
    BundleParse,
    StoreFailed,
    Unsupported,
    IoError,
    ConfigError,
}

impl ErrorCode {
    /// Whether the condition behind this code is transient.
    ///
    /// Policy denials and parse failures are deterministic for the same
    /// input; only external-dependency failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LookupFailed | Self::StoreFailed | Self::IoError)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MalformedRequest => "malformed_request",
            Self::SubjectPrefix => "subject_prefix",
            Self::MissingOrganization => "missing_organization",
            Self::DnsNotPermitted => "dns_not_permitted",
            Self::IpNotPermitted => "ip_not_permitted",
            Self::MissingGroups => "missing_groups",
            Self::InvalidUsages => "invalid_usages",
            Self::EntityNotFound => "entity_not_found",
            Self::LookupFailed => "lookup_failed",
            Self::BundleParse => "bundle_parse",
            Self::StoreFailed => "store_failed",
            Self::Unsupported => "unsupported",
            Self::IoError => "io_error",
            Self::ConfigError => "config_error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exhaustive serde round-trip. Display must agree with the wire form.
    #[test]
    fn all_error_code_variants_roundtrip_through_json() {
        let variants: Vec<(ErrorCode, &str)> = vec![
            (ErrorCode::MalformedRequest, "malformed_request"),
            (ErrorCode::SubjectPrefix, "subject_prefix"),
            (ErrorCode::MissingOrganization, "missing_organization"),
            (ErrorCode::DnsNotPermitted, "dns_not_permitted"),
            (ErrorCode::IpNotPermitted, "ip_not_permitted"),
            (ErrorCode::MissingGroups, "missing_groups"),
            (ErrorCode::InvalidUsages, "invalid_usages"),
            (ErrorCode::EntityNotFound, "entity_not_found"),
            (ErrorCode::LookupFailed, "lookup_failed"),
            (ErrorCode::BundleParse, "bundle_parse"),
            (ErrorCode::StoreFailed, "store_failed"),
            (ErrorCode::Unsupported, "unsupported"),
            (ErrorCode::IoError, "io_error"),
            (ErrorCode::ConfigError, "config_error"),
        ];
        for (code, expected_str) in &variants {
            let serialized = serde_json::to_value(code).unwrap();
            assert_eq!(
                serialized, *expected_str,
                "{code:?} should serialize to \"{expected_str}\""
            );
            assert_eq!(code.to_string(), *expected_str);

            let deserialized: ErrorCode = serde_json::from_value(serialized).unwrap();
            assert_eq!(&deserialized, code);
        }
    }

    #[test]
    fn only_external_failures_are_retryable() {
        assert!(ErrorCode::LookupFailed.is_retryable());
        assert!(ErrorCode::StoreFailed.is_retryable());
        assert!(ErrorCode::IoError.is_retryable());
        assert!(!ErrorCode::SubjectPrefix.is_retryable());
        assert!(!ErrorCode::InvalidUsages.is_retryable());
        assert!(!ErrorCode::MalformedRequest.is_retryable());
        assert!(!ErrorCode::BundleParse.is_retryable());
    }
}
