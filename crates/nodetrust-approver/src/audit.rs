//! Append-only audit log of approval decisions.
//!
//! One line per decision, carrying the stable denial reason so operators
//! can see exactly which gate a request failed.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::request::SigningRequest;
use crate::validator::Decision;

const AUDIT_FILENAME: &str = "csr-audit.log";

/// Path to the audit log file.
pub fn audit_log_path() -> PathBuf {
    nodetrust_common::paths::log_dir().join(AUDIT_FILENAME)
}

/// Append a decision to the default audit log.
pub fn append_decision(
    request: &SigningRequest,
    role: &str,
    decision: &Decision,
) -> Result<(), std::io::Error> {
    append_decision_to(&audit_log_path(), request, role, decision)
}

/// Append a decision to a specific log file.
///
/// Format: `2026-02-11T10:30:00Z | csr_denied | request=csr-7 | role=client-identity | reason=missing required organization`
pub fn append_decision_to(
    path: &Path,
    request: &SigningRequest,
    role: &str,
    decision: &Decision,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let mut line = match decision {
        Decision::Approve { entity } => format!(
            "{timestamp} | csr_approved | request={} | role={role} | entity={entity}",
            request.name
        ),
        Decision::Deny(rejection) => format!(
            "{timestamp} | csr_denied | request={} | role={role} | reason={rejection}",
            request.name
        ),
    };
    line.push('\n');

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(line.as_bytes())?;

    tracing::debug!(request = %request.name, "Audit log entry written");
    Ok(())
}
