//! Windows trust store integration via `certutil` and PowerShell.

use base64::Engine;

use crate::certificate::Certificate;
use crate::store::StoreHandle;
use crate::{cert_file_name, run_command, TrustStoreError};

const DEFAULT_STORE: &str = "Root";

#[derive(Debug, Clone)]
pub struct WindowsRootStore {
    store_name: String,
    name_prefix: String,
}

impl WindowsRootStore {
    pub fn new(name_prefix: &str) -> Self {
        Self::named(DEFAULT_STORE, name_prefix)
    }

    /// A LocalMachine store other than `Root` (e.g. `CA`).
    pub fn named(store_name: &str, name_prefix: &str) -> Self {
        Self {
            store_name: store_name.to_string(),
            name_prefix: name_prefix.to_string(),
        }
    }
}

impl StoreHandle for WindowsRootStore {
    fn list_certificates(&self) -> Result<Vec<Certificate>, TrustStoreError> {
        let script = format!(
            "Get-ChildItem -Path Cert:\\LocalMachine\\{} | ForEach-Object \
             {{ [System.Convert]::ToBase64String($_.RawData) }}",
            self.store_name
        );
        let stdout = run_command(
            "powershell",
            ["-NoProfile", "-NonInteractive", "-Command", script.as_str()],
        )?;

        let text = String::from_utf8_lossy(&stdout);
        let mut certs = Vec::new();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let der = base64::engine::general_purpose::STANDARD
                .decode(line)
                .map_err(|e| {
                    TrustStoreError::CommandFailed(format!("unexpected store listing output: {e}"))
                })?;
            let cert = Certificate::from_der(der).map_err(|e| {
                TrustStoreError::CommandFailed(format!("unexpected store listing output: {e}"))
            })?;
            certs.push(cert);
        }
        Ok(certs)
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<(), TrustStoreError> {
        let cert_path = std::env::temp_dir().join(cert_file_name(&self.name_prefix, cert));
        std::fs::write(&cert_path, cert.to_pem())?;

        let cert_arg = cert_path.to_string_lossy().into_owned();
        let result = run_command(
            "certutil",
            ["-addstore", self.store_name.as_str(), cert_arg.as_str()],
        );

        // Clean up temp file regardless of result
        let _ = std::fs::remove_file(&cert_path);

        result?;
        tracing::info!(
            fingerprint = %cert.fingerprint(),
            store = %self.store_name,
            "Certificate installed in Windows certificate store"
        );
        Ok(())
    }
}
