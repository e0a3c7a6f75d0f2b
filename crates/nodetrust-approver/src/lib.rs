//! Certificate signing request approval for joining cluster members.
//!
//! A [`PolicyTable`] holds one immutable [`CertificatePolicy`] per
//! recognized [`Role`]. [`validate`] runs a request through every gate of a
//! policy and returns a binary [`Decision`]; [`matches_role`] runs only the
//! identity gates so a caller can classify a request before validating it.
//!
//! Nothing here performs I/O except the injected [`EntityLookup`].

pub mod audit;
pub mod config;
pub mod lookup;
pub mod policy;
pub mod request;
pub mod validator;

pub use lookup::{EntityLookup, KnownEntities, LookupError};
pub use policy::{CertificatePolicy, KeyUsage, PolicyTable, Role, SanPolicy};
pub use request::{ParseError, ParsedRequest, SigningRequest};
pub use validator::{matches_role, validate, Decision, Rejection};
