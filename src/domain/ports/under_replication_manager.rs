//! Under-replication queue port (§6: `LedgerUnderReplicationManager`).

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::{BookieId, LedgerId};

#[async_trait]
pub trait UnderReplicationManager: Send + Sync {
    /// `isLedgerReplicationEnabled()`. May fail with "unavailable"
    /// (§4.2 step 1, §7 kind 1).
    async fn is_replication_enabled(&self) -> Result<bool, PortError>;

    /// `notifyLedgerReplicationEnabled(cb)` collapsed into a single
    /// one-shot wait: resolves the first time replication becomes
    /// enabled. Used by `BookieAuditCycle`'s gate (§4.2 step 1).
    async fn wait_until_replication_enabled(&self) -> Result<(), PortError>;

    /// `markLedgerUnderreplicated(ledgerId, missingBookieAddr)`. May
    /// fail (§4.2 step 5, §7 kind 3).
    async fn mark_ledger_underreplicated(
        &self,
        ledger_id: LedgerId,
        missing_bookie: BookieId,
    ) -> Result<(), PortError>;

    /// `getAllUnderreplicatedLedgers()` — the raw path strings the
    /// snapshotter parses (§4.4).
    async fn all_underreplicated_ledger_paths(&self) -> Result<Vec<String>, PortError>;
}
