//! Bookie-to-ledger index port (§6: `BookieLedgerIndexer`).

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::BookieLedgerIndex;

#[async_trait]
pub trait BookieLedgerIndexer: Send + Sync {
    /// `getBookieToLedgerIndex()`. The returned map is a snapshot; the
    /// caller owns it as a local value for the duration of one cycle
    /// and never reuses it across cycles (invariant 2 of §3).
    async fn bookie_to_ledger_index(&self) -> Result<BookieLedgerIndex, PortError>;
}
