//! Error taxonomy for the Auditor (§7).
//!
//! Six kinds are named in the spec; they map onto two enums here.
//! `AuditError` is what lane tasks and `submitAuditTask`'s handle
//! surface. `PortError` is what adapters (real or mock) return and is
//! classified into `AuditError` at the point each cycle calls out.

use thiserror::Error;

/// Errors surfaced by the Auditor's own cycles and lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// Kind 2: the cluster manager failed to produce a view. Fatal —
    /// triggers an Auditor-wide shutdown request (§4.2, §7).
    #[error("cluster view unavailable: {0}")]
    ClusterUnavailable(String),

    /// Kind 1: the under-replication manager's availability check
    /// itself failed. Not fatal — the current cycle is skipped and the
    /// next scheduled tick retries (§4.2 step 1).
    #[error("replication manager unavailable: {0}")]
    ReplicationManagerUnavailable(String),

    /// Kind 3: a publish failed partway through a bookie's ledger set.
    /// Remaining publishes for that bookie (and cycle) are abandoned;
    /// the next tick retries from scratch (§4.2 step 5).
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// Kind 5: submission was rejected because the target lane is
    /// already shut down.
    #[error("task rejected: lane is shut down")]
    Rejected,

    /// Kind 6: the running task observed the interrupt flag and ended
    /// early.
    #[error("interrupted")]
    Interrupted,
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Errors returned by a port (real or mock) before being classified
/// into an `AuditError` by the calling cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),
}
