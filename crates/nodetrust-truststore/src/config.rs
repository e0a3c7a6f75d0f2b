//! `[trust_sync]` section of `config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use nodetrust_common::config::{self, ConfigError};
use nodetrust_common::paths;

use crate::directory::DirectoryStore;
use crate::reconcile::sync_bundle_file;
use crate::store::StoreHandle;
use crate::TrustStoreError;

pub const SECTION: &str = "trust_sync";

const DEFAULT_NAME_PREFIX: &str = "nodetrust";
const DEFAULT_BUNDLE_FILENAME: &str = "ca-bundle.pem";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// PEM bundle to converge the store towards.
    pub bundle_path: PathBuf,
    /// Prefix for anchor and temporary file names.
    pub name_prefix: String,
    pub store: StoreConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            bundle_path: paths::data_dir().join(DEFAULT_BUNDLE_FILENAME),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            store: StoreConfig::System,
        }
    }
}

/// Which store a sync pass targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// The platform's native trust store.
    #[default]
    System,
    /// An explicit anchor directory.
    Directory {
        anchor_dir: PathBuf,
        #[serde(default)]
        bundle_path: Option<PathBuf>,
        #[serde(default)]
        refresh_command: Vec<String>,
    },
}

impl SyncConfig {
    pub fn open_store(&self) -> Result<Box<dyn StoreHandle>, TrustStoreError> {
        match &self.store {
            StoreConfig::System => crate::system_store(&self.name_prefix),
            StoreConfig::Directory {
                anchor_dir,
                bundle_path,
                refresh_command,
            } => {
                let mut store = DirectoryStore::new(anchor_dir, self.name_prefix.as_str())
                    .with_refresh_command(refresh_command.iter().cloned());
                if let Some(bundle_path) = bundle_path {
                    store = store.with_bundle(bundle_path);
                }
                Ok(Box::new(store))
            }
        }
    }
}

/// Load `[trust_sync]` from `path`, defaulting when absent.
pub fn load_sync_config(path: &Path) -> Result<SyncConfig, ConfigError> {
    config::load_section(path, SECTION)
}

/// Load `[trust_sync]` from the shared `config.toml`.
pub fn load_default_sync_config() -> Result<SyncConfig, ConfigError> {
    config::load_default_section(SECTION)
}

/// Run one sync pass as configured.
pub fn sync_from_config(config: &SyncConfig) -> Result<bool, TrustStoreError> {
    let mut store = config.open_store()?;
    sync_bundle_file(&config.bundle_path, store.as_mut())
}
