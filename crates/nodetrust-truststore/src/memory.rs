//! In-memory store, used by tests and by callers that stage a store.

use std::cell::Cell;

use crate::certificate::Certificate;
use crate::store::StoreHandle;
use crate::TrustStoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    certs: Vec<Certificate>,
    list_calls: Cell<usize>,
    commits: usize,
    adds_before_failure: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_certificates(certs: Vec<Certificate>) -> Self {
        Self {
            certs,
            ..Self::default()
        }
    }

    /// Accept `n` more additions, then fail every further one.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.adds_before_failure = Some(n);
        self
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certs
    }

    pub fn contains(&self, cert: &Certificate) -> bool {
        self.certs.contains(cert)
    }

    /// Number of enumerations performed so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.get()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl StoreHandle for MemoryStore {
    fn list_certificates(&self) -> Result<Vec<Certificate>, TrustStoreError> {
        self.list_calls.set(self.list_calls.get() + 1);
        Ok(self.certs.clone())
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<(), TrustStoreError> {
        match self.adds_before_failure {
            Some(0) => {
                return Err(TrustStoreError::AddFailed {
                    fingerprint: cert.fingerprint(),
                    reason: "memory store refused addition".into(),
                })
            }
            Some(ref mut remaining) => *remaining -= 1,
            None => {}
        }
        self.certs.push(cert.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), TrustStoreError> {
        self.commits += 1;
        Ok(())
    }
}
