//! The trust store capability the reconciler drives.

use crate::certificate::Certificate;
use crate::TrustStoreError;

/// A certificate store that can be enumerated and appended to.
///
/// Implementations wrap the platform primitives; the convergence logic
/// lives in [`crate::reconcile`]. Callers must serialize passes against the
/// same store.
pub trait StoreHandle {
    /// Current contents of the store.
    fn list_certificates(&self) -> Result<Vec<Certificate>, TrustStoreError>;

    /// Add one certificate.
    fn add_certificate(&mut self, cert: &Certificate) -> Result<(), TrustStoreError>;

    /// Make additions from the current pass effective.
    ///
    /// Stores whose additions are immediately live keep the default.
    fn commit(&mut self) -> Result<(), TrustStoreError> {
        Ok(())
    }
}
