//! Policy validation of signing requests.
//!
//! Gates run in a fixed order and the first failure is the reported
//! reason:
//!
//! 1. request parses (PEM label, DER body)
//! 2. common name is `<prefix>:<entity>` with a non-empty entity
//! 3. required organization present
//! 4. DNS / IP SANs only where the policy allows them
//! 5. required groups all declared
//! 6. declared usages equal one allowed set exactly
//! 7. entity exists, when the policy asks for it

use std::collections::{BTreeSet, HashSet};

use nodetrust_common::error::ErrorCode;

use crate::lookup::{EntityLookup, LookupError};
use crate::policy::CertificatePolicy;
use crate::request::{ParsedRequest, SigningRequest};

/// Fewest usages a request may declare.
const MIN_DECLARED_USAGES: usize = 2;

/// Why a request was denied. The `Display` strings are stable and meant
/// for audit messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("malformed request")]
    MalformedRequest,
    #[error("subject name missing required prefix")]
    SubjectPrefix,
    #[error("missing required organization")]
    MissingOrganization,
    #[error("DNS names not permitted")]
    DnsNotPermitted,
    #[error("IP addresses not permitted")]
    IpNotPermitted,
    #[error("missing required groups")]
    MissingGroups,
    #[error("invalid key usages for role")]
    InvalidUsages,
    #[error("entity does not exist")]
    EntityNotFound,
    #[error("existence check failed")]
    ExistenceCheckFailed,
}

impl Rejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedRequest => ErrorCode::MalformedRequest,
            Self::SubjectPrefix => ErrorCode::SubjectPrefix,
            Self::MissingOrganization => ErrorCode::MissingOrganization,
            Self::DnsNotPermitted => ErrorCode::DnsNotPermitted,
            Self::IpNotPermitted => ErrorCode::IpNotPermitted,
            Self::MissingGroups => ErrorCode::MissingGroups,
            Self::InvalidUsages => ErrorCode::InvalidUsages,
            Self::EntityNotFound => ErrorCode::EntityNotFound,
            Self::ExistenceCheckFailed => ErrorCode::LookupFailed,
        }
    }

    /// Only a failed existence check may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

/// Outcome of validating one request against one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// All gates passed. `entity` is the name claimed after the prefix.
    Approve { entity: String },
    Deny(Rejection),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Approve { entity } => Some(entity),
            Self::Deny(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Approve { .. } => None,
            Self::Deny(rejection) => Some(rejection),
        }
    }
}

/// Validate `request` against `policy`, consulting `lookup` only if the
/// policy requires the claimed entity to exist.
pub fn validate<L>(request: &SigningRequest, policy: &CertificatePolicy, lookup: &L) -> Decision
where
    L: EntityLookup + ?Sized,
{
    match evaluate(request, policy, lookup) {
        Ok(entity) => {
            tracing::info!(
                request = %request.name,
                role = %policy.name,
                entity = %entity,
                "Signing request satisfies policy"
            );
            Decision::Approve { entity }
        }
        Err(rejection) => {
            tracing::debug!(
                request = %request.name,
                role = %policy.name,
                reason = %rejection,
                "Signing request denied"
            );
            Decision::Deny(rejection)
        }
    }
}

/// Whether `request` parses and carries `policy`'s identity (prefix and
/// organization). The stricter gates are not applied.
pub fn matches_role(request: &SigningRequest, policy: &CertificatePolicy) -> bool {
    request
        .parse()
        .ok()
        .is_some_and(|parsed| check_identity(&parsed, policy).is_ok())
}

fn evaluate<L>(
    request: &SigningRequest,
    policy: &CertificatePolicy,
    lookup: &L,
) -> Result<String, Rejection>
where
    L: EntityLookup + ?Sized,
{
    let parsed = request.parse().map_err(|e| {
        tracing::debug!(request = %request.name, error = %e, "Signing request does not parse");
        Rejection::MalformedRequest
    })?;

    let entity = check_identity(&parsed, policy)?.to_string();
    check_sans(&parsed, policy)?;
    check_groups(&request.groups, policy)?;
    check_usages(&request.usages, policy)?;

    if policy.validate_entity_exists {
        check_exists(&entity, lookup)?;
    }

    Ok(entity)
}

/// Gates 2 and 3. Returns the claimed entity name.
fn check_identity<'a>(
    parsed: &'a ParsedRequest,
    policy: &CertificatePolicy,
) -> Result<&'a str, Rejection> {
    let prefix = format!("{}:", policy.subject_prefix);
    let entity = match parsed.common_name.strip_prefix(prefix.as_str()) {
        Some(rest) if !rest.is_empty() => rest,
        _ => return Err(Rejection::SubjectPrefix),
    };

    if !parsed.organizations.iter().any(|o| *o == policy.organization) {
        return Err(Rejection::MissingOrganization);
    }
    Ok(entity)
}

fn check_sans(parsed: &ParsedRequest, policy: &CertificatePolicy) -> Result<(), Rejection> {
    if !parsed.dns_names.is_empty() && !policy.allow_sans.allow_dns {
        return Err(Rejection::DnsNotPermitted);
    }
    if !parsed.ip_addresses.is_empty() && !policy.allow_sans.allow_ip {
        return Err(Rejection::IpNotPermitted);
    }
    Ok(())
}

fn check_groups(declared: &[String], policy: &CertificatePolicy) -> Result<(), Rejection> {
    if policy.required_groups.is_empty() {
        return Ok(());
    }
    if declared.len() < policy.required_groups.len() {
        return Err(Rejection::MissingGroups);
    }
    let declared: HashSet<&str> = declared.iter().map(String::as_str).collect();
    if policy
        .required_groups
        .iter()
        .all(|g| declared.contains(g.as_str()))
    {
        Ok(())
    } else {
        Err(Rejection::MissingGroups)
    }
}

fn check_usages(declared: &[String], policy: &CertificatePolicy) -> Result<(), Rejection> {
    if declared.len() < MIN_DECLARED_USAGES {
        return Err(Rejection::InvalidUsages);
    }
    let declared: BTreeSet<&str> = declared.iter().map(String::as_str).collect();
    let matched = policy.allowed_usage_sets.iter().any(|allowed| {
        let allowed: BTreeSet<&str> = allowed.iter().map(|u| u.as_str()).collect();
        allowed == declared
    });
    if matched {
        Ok(())
    } else {
        Err(Rejection::InvalidUsages)
    }
}

fn check_exists<L>(entity: &str, lookup: &L) -> Result<(), Rejection>
where
    L: EntityLookup + ?Sized,
{
    match lookup.exists(entity) {
        Ok(true) => Ok(()),
        Ok(false) | Err(LookupError::NotFound(_)) => Err(Rejection::EntityNotFound),
        Err(e) => {
            tracing::warn!(entity, error = %e, "Entity existence check failed");
            Err(Rejection::ExistenceCheckFailed)
        }
    }
}
