//! macOS trust store integration via the `security` tool.

use std::path::PathBuf;

use crate::bundle::parse_bundle;
use crate::certificate::Certificate;
use crate::store::StoreHandle;
use crate::{cert_file_name, run_command, TrustStoreError};

const SYSTEM_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

#[derive(Debug, Clone)]
pub struct KeychainStore {
    keychain: PathBuf,
    name_prefix: String,
}

impl KeychainStore {
    pub fn new(keychain: impl Into<PathBuf>, name_prefix: &str) -> Self {
        Self {
            keychain: keychain.into(),
            name_prefix: name_prefix.to_string(),
        }
    }

    pub fn system(name_prefix: &str) -> Self {
        Self::new(SYSTEM_KEYCHAIN, name_prefix)
    }
}

impl StoreHandle for KeychainStore {
    fn list_certificates(&self) -> Result<Vec<Certificate>, TrustStoreError> {
        let keychain = self.keychain.to_string_lossy().into_owned();
        let stdout = run_command(
            "security",
            ["find-certificate", "-a", "-p", keychain.as_str()],
        )?;
        Ok(parse_bundle(&stdout)?)
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<(), TrustStoreError> {
        let cert_path = std::env::temp_dir().join(cert_file_name(&self.name_prefix, cert));
        std::fs::write(&cert_path, cert.to_pem())?;

        let keychain = self.keychain.to_string_lossy().into_owned();
        let cert_arg = cert_path.to_string_lossy().into_owned();
        let result = run_command(
            "security",
            [
                "add-trusted-cert",
                "-d",
                "-r",
                "trustRoot",
                "-k",
                keychain.as_str(),
                cert_arg.as_str(),
            ],
        );

        // Clean up temp file regardless of result
        let _ = std::fs::remove_file(&cert_path);

        result?;
        tracing::info!(
            fingerprint = %cert.fingerprint(),
            "Certificate installed in macOS keychain"
        );
        Ok(())
    }
}
