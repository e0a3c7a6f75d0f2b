//! Identity roles and their certificate policies.
//!
//! Three roles cover every machine identity a joining node may request.
//! The table is built once at startup and handed to the validator; it is
//! never mutated afterwards.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::request::SigningRequest;
use crate::validator;

/// Node identities: `system:node:<name>` in `system:nodes`.
pub const NODE_PREFIX: &str = "system:node";
pub const NODE_ORGANIZATION: &str = "system:nodes";
pub const AUTHENTICATED_GROUP: &str = "system:authenticated";

/// A cryptographic capability declared on a signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyUsage {
    DigitalSignature,
    KeyEncipherment,
    ClientAuth,
    ServerAuth,
}

impl KeyUsage {
    /// Wire spelling as it appears in a signing request's usage list.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalSignature => "digital signature",
            Self::KeyEncipherment => "key encipherment",
            Self::ClientAuth => "client auth",
            Self::ServerAuth => "server auth",
        }
    }
}

impl std::fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a role may carry subject alternative names at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanPolicy {
    pub allow_dns: bool,
    pub allow_ip: bool,
}

impl SanPolicy {
    pub const NONE: Self = Self {
        allow_dns: false,
        allow_ip: false,
    };
    pub const ALL: Self = Self {
        allow_dns: true,
        allow_ip: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePolicy {
    pub name: String,
    /// Common name must be `<subject_prefix>:<entity>`.
    pub subject_prefix: String,
    pub organization: String,
    /// Groups that must all be present on the signing request.
    pub required_groups: Vec<String>,
    pub validate_entity_exists: bool,
    pub allow_sans: SanPolicy,
    /// Alternative complete usage sets; the request must equal one of them.
    pub allowed_usage_sets: Vec<BTreeSet<KeyUsage>>,
}

fn usage_set(usages: &[KeyUsage]) -> BTreeSet<KeyUsage> {
    usages.iter().copied().collect()
}

impl CertificatePolicy {
    /// Node client certificate. The node object does not exist yet when this
    /// is requested, so there is no existence check.
    pub fn client_identity() -> Self {
        use KeyUsage::*;
        Self {
            name: Role::ClientIdentity.name().to_string(),
            subject_prefix: NODE_PREFIX.to_string(),
            organization: NODE_ORGANIZATION.to_string(),
            required_groups: Vec::new(),
            validate_entity_exists: false,
            allow_sans: SanPolicy::NONE,
            allowed_usage_sets: vec![
                usage_set(&[KeyEncipherment, DigitalSignature, ClientAuth]),
                // Non-RSA keys cannot declare key encipherment.
                usage_set(&[DigitalSignature, ClientAuth]),
            ],
        }
    }

    /// Node serving certificate, requested by an already-registered node.
    pub fn serving_identity() -> Self {
        use KeyUsage::*;
        Self {
            name: Role::ServingIdentity.name().to_string(),
            subject_prefix: NODE_PREFIX.to_string(),
            organization: NODE_ORGANIZATION.to_string(),
            required_groups: vec![NODE_ORGANIZATION.to_string(), AUTHENTICATED_GROUP.to_string()],
            validate_entity_exists: true,
            allow_sans: SanPolicy::ALL,
            allowed_usage_sets: vec![
                usage_set(&[KeyEncipherment, DigitalSignature, ServerAuth]),
                usage_set(&[DigitalSignature, ServerAuth]),
            ],
        }
    }

    /// Per-node service agent certificate. Groups come from the platform's
    /// identity binding, not from the request.
    pub fn service_identity(prefix: &str, organization: &str) -> Self {
        use KeyUsage::*;
        Self {
            name: Role::ServiceIdentity.name().to_string(),
            subject_prefix: prefix.to_string(),
            organization: organization.to_string(),
            required_groups: Vec::new(),
            validate_entity_exists: true,
            allow_sans: SanPolicy::NONE,
            allowed_usage_sets: vec![usage_set(&[DigitalSignature, ClientAuth, KeyEncipherment])],
        }
    }

    pub fn with_sans(mut self, allow_sans: SanPolicy) -> Self {
        self.allow_sans = allow_sans;
        self
    }
}

/// The closed set of recognized identity roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    ClientIdentity,
    ServingIdentity,
    ServiceIdentity,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::ClientIdentity, Self::ServingIdentity, Self::ServiceIdentity];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ClientIdentity => "client-identity",
            Self::ServingIdentity => "serving-identity",
            Self::ServiceIdentity => "service-identity",
        }
    }

    /// Signer a request for this role is addressed to.
    pub fn signer_name(&self) -> &'static str {
        match self {
            Self::ClientIdentity => "kubernetes.io/kube-apiserver-client-kubelet",
            Self::ServingIdentity => "kubernetes.io/kubelet-serving",
            Self::ServiceIdentity => "kubernetes.io/kube-apiserver-client",
        }
    }

    /// Parse from user-provided text.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client-identity" | "client" | "kubelet-client" => Some(Self::ClientIdentity),
            "serving-identity" | "serving" | "kubelet-serving" => Some(Self::ServingIdentity),
            "service-identity" | "service" => Some(Self::ServiceIdentity),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable role → policy mapping.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    entries: Vec<(Role, CertificatePolicy)>,
}

impl PolicyTable {
    pub fn new(config: &PolicyConfig) -> Self {
        let entries = Role::ALL
            .into_iter()
            .filter(|role| !config.disabled_roles.contains(role))
            .map(|role| {
                let policy = match role {
                    Role::ClientIdentity => CertificatePolicy::client_identity(),
                    Role::ServingIdentity => CertificatePolicy::serving_identity(),
                    Role::ServiceIdentity => CertificatePolicy::service_identity(
                        &config.service_prefix,
                        &config.service_organization,
                    ),
                };
                (role, policy)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, role: Role) -> Option<&CertificatePolicy> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, policy)| policy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &CertificatePolicy)> {
        self.entries.iter().map(|(role, policy)| (*role, policy))
    }

    /// Roles whose identity gates accept `request`, in table order.
    ///
    /// A declared signer narrows the candidates to the role addressed to it.
    pub fn classify(&self, request: &SigningRequest) -> Vec<Role> {
        self.iter()
            .filter(|(role, _)| match request.signer_name.as_deref() {
                Some(signer) => signer == role.signer_name(),
                None => true,
            })
            .filter(|(_, policy)| validator::matches_role(request, policy))
            .map(|(role, _)| role)
            .collect()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(&PolicyConfig::default())
    }
}
