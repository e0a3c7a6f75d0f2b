//! Additive, idempotent convergence of a store towards a bundle.

use std::collections::HashSet;
use std::path::Path;

use crate::bundle::read_bundle_file;
use crate::certificate::Certificate;
use crate::store::StoreHandle;
use crate::TrustStoreError;

/// Add every bundle certificate the store lacks. Returns whether the store
/// changed.
///
/// The store is enumerated exactly once per pass. Membership is exact DER
/// equality. Nothing is removed. The first failed addition aborts the pass;
/// earlier additions stay in place and are committed best-effort, so
/// re-running the pass converges.
pub fn reconcile<S>(bundle: &[Certificate], store: &mut S) -> Result<bool, TrustStoreError>
where
    S: StoreHandle + ?Sized,
{
    let mut present: HashSet<Certificate> = store.list_certificates()?.into_iter().collect();
    let mut added = 0usize;

    for cert in bundle {
        if present.contains(cert) {
            tracing::debug!(fingerprint = %cert.fingerprint(), "Certificate already trusted");
            continue;
        }

        if let Err(e) = store.add_certificate(cert) {
            tracing::warn!(
                fingerprint = %cert.fingerprint(),
                added,
                error = %e,
                "Trust store addition failed, aborting pass"
            );
            if added > 0 {
                if let Err(commit_err) = store.commit() {
                    tracing::warn!(error = %commit_err, "Commit of partial pass failed");
                }
            }
            return Err(e);
        }

        tracing::info!(
            fingerprint = %cert.fingerprint(),
            subject = %cert.subject(),
            "Certificate added to trust store"
        );
        present.insert(cert.clone());
        added += 1;
    }

    if added > 0 {
        store.commit()?;
    }
    Ok(added > 0)
}

/// Re-read the bundle at `path` and reconcile it into `store`.
///
/// The file is parsed afresh on every call.
pub fn sync_bundle_file<S>(path: &Path, store: &mut S) -> Result<bool, TrustStoreError>
where
    S: StoreHandle + ?Sized,
{
    let bundle = read_bundle_file(path)?;
    let changed = reconcile(&bundle, store)?;
    tracing::debug!(path = %path.display(), changed, "Trust bundle sync pass complete");
    Ok(changed)
}
