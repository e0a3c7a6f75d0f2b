//! `[policy]` section of `config.toml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use nodetrust_common::config::{self, ConfigError};

use crate::policy::Role;

pub const SECTION: &str = "policy";

const DEFAULT_SERVICE_PREFIX: &str = "system:node-agent";
const DEFAULT_SERVICE_ORGANIZATION: &str = "system:node-agents";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Common-name prefix of the service-identity role.
    pub service_prefix: String,
    /// Organization required of the service-identity role.
    pub service_organization: String,
    /// Roles left out of the table entirely.
    pub disabled_roles: Vec<Role>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            service_prefix: DEFAULT_SERVICE_PREFIX.to_string(),
            service_organization: DEFAULT_SERVICE_ORGANIZATION.to_string(),
            disabled_roles: Vec::new(),
        }
    }
}

/// Load `[policy]` from `path`, defaulting when absent.
pub fn load_policy_config(path: &Path) -> Result<PolicyConfig, ConfigError> {
    config::load_section(path, SECTION)
}

/// Load `[policy]` from the shared `config.toml`.
pub fn load_default_policy_config() -> Result<PolicyConfig, ConfigError> {
    config::load_default_section(SECTION)
}
