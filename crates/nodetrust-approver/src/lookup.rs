//! External existence check for claimed entities.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The lookup completed and the entity does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The lookup itself failed (timeout, transport, permissions).
    #[error("lookup failed: {0}")]
    Unavailable(String),
}

/// Resolves whether a claimed entity (e.g. a node) is known to the cluster.
///
/// `Ok(false)` and `Err(LookupError::NotFound)` both mean the entity does
/// not exist. Timeouts are the implementor's concern and surface as
/// `Unavailable`.
pub trait EntityLookup {
    fn exists(&self, name: &str) -> Result<bool, LookupError>;
}

impl<F> EntityLookup for F
where
    F: Fn(&str) -> Result<bool, LookupError>,
{
    fn exists(&self, name: &str) -> Result<bool, LookupError> {
        self(name)
    }
}

/// Fixed set of known entity names.
#[derive(Debug, Clone, Default)]
pub struct KnownEntities {
    names: HashSet<String>,
}

impl KnownEntities {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntityLookup for KnownEntities {
    fn exists(&self, name: &str) -> Result<bool, LookupError> {
        Ok(self.names.contains(name))
    }
}
