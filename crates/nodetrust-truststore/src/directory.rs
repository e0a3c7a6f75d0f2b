//! Anchor-directory trust store.
//!
//! Certificates are added by writing one PEM file per certificate into an
//! anchor directory. If the platform compiles anchors into a bundle, the
//! store enumerates that compiled bundle (so an addition counts only once
//! the rebuild has run) and `commit` runs the rebuild command.

use std::path::{Path, PathBuf};

use crate::bundle::{read_bundle_file, BundleError};
use crate::certificate::Certificate;
use crate::store::StoreHandle;
use crate::{cert_file_name, run_command, TrustStoreError};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    anchor_dir: PathBuf,
    bundle_path: Option<PathBuf>,
    refresh_command: Vec<String>,
    name_prefix: String,
}

impl DirectoryStore {
    pub fn new(anchor_dir: impl Into<PathBuf>, name_prefix: impl Into<String>) -> Self {
        Self {
            anchor_dir: anchor_dir.into(),
            bundle_path: None,
            refresh_command: Vec::new(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Enumerate this compiled bundle instead of the anchor directory.
    pub fn with_bundle(mut self, bundle_path: impl Into<PathBuf>) -> Self {
        self.bundle_path = Some(bundle_path.into());
        self
    }

    /// Command (program followed by arguments) run on commit.
    pub fn with_refresh_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refresh_command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn anchor_dir(&self) -> &Path {
        &self.anchor_dir
    }

    fn list_anchor_dir(&self) -> Result<Vec<Certificate>, TrustStoreError> {
        let entries = match std::fs::read_dir(&self.anchor_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|ext| ext.to_str()),
                    Some("crt" | "pem")
                )
            })
            .collect();
        paths.sort();

        let mut certs = Vec::new();
        for path in paths {
            certs.extend(read_bundle_file(&path)?);
        }
        Ok(certs)
    }
}

impl StoreHandle for DirectoryStore {
    fn list_certificates(&self) -> Result<Vec<Certificate>, TrustStoreError> {
        let Some(bundle_path) = &self.bundle_path else {
            return self.list_anchor_dir();
        };
        match read_bundle_file(bundle_path) {
            Ok(certs) => Ok(certs),
            Err(BundleError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %bundle_path.display(),
                    "Compiled bundle missing, treating store as empty"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<(), TrustStoreError> {
        std::fs::create_dir_all(&self.anchor_dir)?;
        let cert_path = self.anchor_dir.join(cert_file_name(&self.name_prefix, cert));
        std::fs::write(&cert_path, cert.to_pem())?;
        tracing::debug!(path = %cert_path.display(), "Anchor written");
        Ok(())
    }

    fn commit(&mut self) -> Result<(), TrustStoreError> {
        let Some((program, args)) = self.refresh_command.split_first() else {
            return Ok(());
        };
        run_command(program, args)?;
        tracing::info!(
            anchor_dir = %self.anchor_dir.display(),
            command = %program,
            "Trust store rebuilt"
        );
        Ok(())
    }
}
