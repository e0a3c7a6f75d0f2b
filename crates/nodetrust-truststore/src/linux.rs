//! Linux trust store layouts.

use std::path::Path;

use crate::directory::DirectoryStore;

const DEBIAN_ANCHOR_DIR: &str = "/usr/local/share/ca-certificates";
const DEBIAN_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

const RHEL_ANCHOR_DIR: &str = "/etc/pki/ca-trust/source/anchors";
const RHEL_BUNDLE: &str = "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem";

/// Debian / Ubuntu: `update-ca-certificates`.
pub fn debian(name_prefix: &str) -> DirectoryStore {
    DirectoryStore::new(DEBIAN_ANCHOR_DIR, name_prefix)
        .with_bundle(DEBIAN_BUNDLE)
        .with_refresh_command(["update-ca-certificates"])
}

/// RHEL / Fedora: `update-ca-trust extract`.
pub fn rhel(name_prefix: &str) -> DirectoryStore {
    DirectoryStore::new(RHEL_ANCHOR_DIR, name_prefix)
        .with_bundle(RHEL_BUNDLE)
        .with_refresh_command(["update-ca-trust", "extract"])
}

/// Pick the layout present on this machine, preferring p11-kit's.
pub fn detect(name_prefix: &str) -> DirectoryStore {
    if Path::new(RHEL_ANCHOR_DIR).is_dir() {
        tracing::debug!("Using p11-kit (update-ca-trust) trust store layout");
        rhel(name_prefix)
    } else {
        tracing::debug!("Using update-ca-certificates trust store layout");
        debian(name_prefix)
    }
}
