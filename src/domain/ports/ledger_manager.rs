//! Ledger enumeration port (§6: `LedgerManager`).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::LedgerId;

/// Per-ledger work handed to `LedgerManager::async_process_ledgers`.
pub type LedgerProcessor =
    Arc<dyn Fn(LedgerId) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Enumerates every ledger known to the cluster.
///
/// Modeled on the source's push-based `asyncProcessLedgers(processor,
/// completionCallback, context, okCode, errorCode)`: `processor` is
/// invoked once per ledger id, and the returned future resolving *is*
/// the completion callback firing — §9's design note says a single
/// completion future is an equivalent reimplementation of the
/// processor/completion-callback/latch triple, since async/await gives
/// the "fires exactly once" guarantee for free.
#[async_trait]
pub trait LedgerManager: Send + Sync {
    async fn async_process_ledgers(&self, processor: LedgerProcessor) -> Result<(), PortError>;
}
