//! Trust store synchronization for nodetrust.
//!
//! Parses a multi-certificate PEM bundle and converges an operating system
//! trust store towards it. Convergence is additive only: certificates in the
//! bundle that the store lacks are added, nothing is ever removed.
//!
//! Platform support:
//! - **Linux**: anchor directory plus a rebuild command
//!   (`update-ca-certificates` or `update-ca-trust extract`)
//! - **Windows**: `certutil -addstore Root`, enumerated via PowerShell
//! - **macOS**: `security add-trusted-cert` against the System keychain

use std::ffi::OsStr;
use std::process::Command;

use nodetrust_common::config::ConfigError;
use nodetrust_common::error::ErrorCode;

pub mod bundle;
pub mod certificate;
pub mod config;
pub mod directory;
pub mod memory;
pub mod reconcile;
pub mod store;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod darwin;

#[cfg(windows)]
pub mod windows;

pub use bundle::{parse_bundle, read_bundle_file, BundleError, BundleReader};
pub use certificate::Certificate;
pub use reconcile::{reconcile, sync_bundle_file};
pub use store::StoreHandle;

#[derive(Debug, thiserror::Error)]
pub enum TrustStoreError {
    #[error("trust store command failed: {0}")]
    CommandFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("platform not supported")]
    Unsupported,
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),
    #[error("store rejected certificate {fingerprint}: {reason}")]
    AddFailed { fingerprint: String, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TrustStoreError {
    /// Store-side failures are assumed transient; a malformed bundle or an
    /// unsupported platform will fail the same way next time.
    pub fn is_retryable(&self) -> bool {
        ErrorCode::from(self).is_retryable()
    }
}

impl From<&TrustStoreError> for ErrorCode {
    fn from(e: &TrustStoreError) -> Self {
        match e {
            TrustStoreError::CommandFailed(_) | TrustStoreError::AddFailed { .. } => {
                ErrorCode::StoreFailed
            }
            TrustStoreError::Io(_) | TrustStoreError::Bundle(BundleError::Io(_)) => {
                ErrorCode::IoError
            }
            TrustStoreError::Bundle(_) => ErrorCode::BundleParse,
            TrustStoreError::Unsupported => ErrorCode::Unsupported,
            TrustStoreError::Config(c) => ErrorCode::from(c),
        }
    }
}

/// The native trust store of the current platform.
///
/// `name_prefix` names the files or temporary artifacts the store writes
/// (e.g. `"nodetrust"` → `nodetrust-<fingerprint>.crt` on Linux).
pub fn system_store(name_prefix: &str) -> Result<Box<dyn StoreHandle>, TrustStoreError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(linux::detect(name_prefix)))
    }

    #[cfg(windows)]
    {
        Ok(Box::new(windows::WindowsRootStore::new(name_prefix)))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(darwin::KeychainStore::system(name_prefix)))
    }

    #[cfg(not(any(target_os = "linux", windows, target_os = "macos")))]
    {
        let _ = name_prefix;
        Err(TrustStoreError::Unsupported)
    }
}

/// Run a trust store command and return its stdout, failing on non-zero exit.
pub(crate) fn run_command<I, S>(program: &str, args: I) -> Result<Vec<u8>, TrustStoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program).args(args).output()?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(program, stderr = %stderr, "Trust store command failed");
        Err(TrustStoreError::CommandFailed(format!(
            "{program} exit code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )))
    }
}

/// File name used when a certificate has to be materialized on disk.
pub(crate) fn cert_file_name(name_prefix: &str, cert: &Certificate) -> String {
    let fingerprint = cert.fingerprint();
    format!("{name_prefix}-{}.crt", &fingerprint[..16])
}
