//! `LedgerCheckCycle` (§4.3): the most intricate operation, bridging a
//! synchronous driver to a push-based, fan-out asynchronous traversal
//! with a per-item callback. Collapsed here into a single future per
//! ledger — the per-ledger processor *is* the completion callback, and
//! the outer `await` on `async_process_ledgers` *is* the block-until-
//! final-callback the source needs an explicit latch for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::errors::{AuditError, AuditResult, PortError};
use crate::domain::ports::{AdminClient, LedgerChecker, LedgerManager, LedgerProcessor, UnderReplicationManager};

pub struct LedgerCheckCycle {
    ledger_manager: Arc<dyn LedgerManager>,
    admin_client: Arc<dyn AdminClient>,
    ledger_checker: Arc<dyn LedgerChecker>,
    under_replication: Arc<dyn UnderReplicationManager>,
}

impl LedgerCheckCycle {
    pub fn new(
        ledger_manager: Arc<dyn LedgerManager>,
        admin_client: Arc<dyn AdminClient>,
        ledger_checker: Arc<dyn LedgerChecker>,
        under_replication: Arc<dyn UnderReplicationManager>,
    ) -> Self {
        Self {
            ledger_manager,
            admin_client,
            ledger_checker,
            under_replication,
        }
    }

    /// The dedicated metadata-store connection, client, and admin
    /// handle §4.3 calls for are this cycle's `admin_client` and
    /// `ledger_checker` ports: they are built fresh per call by the
    /// caller (see `AuditorState`) and simply dropped at the end of
    /// `run`, which is the scoped-acquisition release the source
    /// expresses with an explicit try/finally.
    pub async fn run(&self, cancel: CancellationToken) -> AuditResult<()> {
        let enabled = self
            .under_replication
            .is_replication_enabled()
            .await
            .map_err(|e| AuditError::ReplicationManagerUnavailable(e.to_string()))?;
        if !enabled {
            tracing::debug!("replication disabled; skipping ledger check cycle");
            return Ok(());
        }

        let aborted = Arc::new(AtomicBool::new(false));
        let interrupted = Arc::new(AtomicBool::new(false));

        let admin_client = self.admin_client.clone();
        let ledger_checker = self.ledger_checker.clone();
        let under_replication = self.under_replication.clone();
        let aborted_flag = aborted.clone();
        let interrupted_flag = interrupted.clone();

        let processor: LedgerProcessor = Arc::new(move |ledger_id| {
            let admin_client = admin_client.clone();
            let ledger_checker = ledger_checker.clone();
            let under_replication = under_replication.clone();
            let aborted = aborted_flag.clone();
            let interrupted = interrupted_flag.clone();
            let cancel = cancel.clone();

            Box::pin(async move {
                if aborted.load(Ordering::Acquire) || interrupted.load(Ordering::Acquire) {
                    return;
                }

                if cancel.is_cancelled() {
                    interrupted.store(true, Ordering::Release);
                    tracing::warn!(%ledger_id, "ledger check interrupted before open");
                    return;
                }

                match under_replication.is_replication_enabled().await {
                    Ok(true) => {}
                    Ok(false) => {
                        aborted.store(true, Ordering::Release);
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "replication-enabled check failed mid-traversal; aborting");
                        aborted.store(true, Ordering::Release);
                        return;
                    }
                }

                let handle = match admin_client.open_ledger_no_recovery(ledger_id).await {
                    Ok(handle) => handle,
                    Err(PortError::NotFound(_)) => {
                        // Deleted between enumeration and open: a success, per §4.3.
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(%ledger_id, error = %e, "bookie handle unavailable");
                        return;
                    }
                };

                let fragments = match ledger_checker.check_ledger(handle).await {
                    Ok(fragments) => fragments,
                    Err(e) => {
                        tracing::warn!(%ledger_id, error = %e, "ledger check failed");
                        if let Err(close_err) = admin_client.close_ledger(handle).await {
                            tracing::warn!(%ledger_id, error = %close_err, "close failed after check error");
                        }
                        return;
                    }
                };

                for fragment in &fragments {
                    for bookie in &fragment.hosts {
                        if let Err(e) = under_replication
                            .mark_ledger_underreplicated(fragment.ledger_id, bookie.clone())
                            .await
                        {
                            tracing::warn!(%ledger_id, bookie = %bookie, error = %e, "publish failed for fragment");
                        }
                    }
                }

                if let Err(e) = admin_client.close_ledger(handle).await {
                    tracing::warn!(%ledger_id, error = %e, "close failed");
                }
            })
        });

        self.ledger_manager
            .async_process_ledgers(processor)
            .await
            .map_err(|e| AuditError::ClusterUnavailable(e.to_string()))?;

        if interrupted.load(Ordering::Acquire) {
            return Err(AuditError::Interrupted);
        }

        Ok(())
    }
}
