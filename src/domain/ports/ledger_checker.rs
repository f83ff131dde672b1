//! Per-ledger fragment verification ports (§6: `LedgerChecker`, `AdminClient`).

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::{LedgerFragment, LedgerId};

/// A read-only, no-recovery handle on a ledger, opened for checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerHandle {
    pub ledger_id: LedgerId,
}

#[async_trait]
pub trait AdminClient: Send + Sync {
    /// `openLedgerNoRecovery(ledgerId)`. A `PortError::NotFound` here is
    /// the "ledger deleted between enumeration and open" edge case and
    /// is treated as a successful item by the caller (§4.3); any other
    /// error becomes `BookieHandleUnavailable`.
    async fn open_ledger_no_recovery(&self, ledger_id: LedgerId) -> Result<LedgerHandle, PortError>;

    /// Release a handle. A no-op on read-only handles, but always
    /// attempted; errors are logged by the caller, never propagated
    /// (§4.3 edge cases, §9 design note (b)).
    async fn close_ledger(&self, handle: LedgerHandle) -> Result<(), PortError>;
}

#[async_trait]
pub trait LedgerChecker: Send + Sync {
    /// `checkLedger(handle, callback)` collapsed to a single awaited
    /// result: the set of fragments found to be under-replicated
    /// ("lost fragments"), each carrying its hosting bookie addresses.
    async fn check_ledger(&self, handle: LedgerHandle) -> Result<Vec<LedgerFragment>, PortError>;
}
