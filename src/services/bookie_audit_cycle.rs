//! `BookieAuditCycle` (§4.2): the recurring check for bookies that have
//! dropped out of the cluster while still holding ledger fragments.

use std::sync::Arc;

use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::LostBookieSet;
use crate::domain::ports::{BookieLedgerIndexer, ClusterManager, MetricsSink, UnderReplicationManager};

/// Outcome of one `runBookieAudit()` pass. `Requeue` models §4.2 step
/// 3: replication was disabled between building the index and acting
/// on it, so this pass is abandoned and a fresh pass must be
/// resubmitted to `bookieLane` rather than simply retried next tick
/// (scenario 2 of §8; preserved as-is per the open question in §9(a)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookieAuditOutcome {
    Completed,
    Requeue,
}

pub struct BookieAuditCycle {
    cluster_manager: Arc<dyn ClusterManager>,
    under_replication: Arc<dyn UnderReplicationManager>,
    indexer: Arc<dyn BookieLedgerIndexer>,
    metrics: Arc<dyn MetricsSink>,
}

impl BookieAuditCycle {
    pub fn new(
        cluster_manager: Arc<dyn ClusterManager>,
        under_replication: Arc<dyn UnderReplicationManager>,
        indexer: Arc<dyn BookieLedgerIndexer>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            cluster_manager,
            under_replication,
            indexer,
            metrics,
        }
    }

    /// `runBookieAudit()` (§4.2 steps 1-5).
    pub async fn run(&self) -> AuditResult<BookieAuditOutcome> {
        // Reset the published-count counter at the very start of the
        // cycle (invariant 3 of §3 / I8), before any gate, fetch, or
        // publish — including cycles that end up requeuing or finding
        // no lost bookies. Otherwise a cycle that publishes nothing
        // would misreport the previous cycle's count as its own.
        self.metrics.reset_published_underreplicated();

        // Step 1: gate on replication being enabled. If disabled, block
        // on the one-shot watcher until it is (§4.2 step 1). An
        // unavailable check — either the initial read or the watcher
        // itself failing — is not fatal: the cycle is skipped and the
        // next tick retries (§7 kind 1).
        let enabled = self
            .under_replication
            .is_replication_enabled()
            .await
            .map_err(|e| AuditError::ReplicationManagerUnavailable(e.to_string()))?;
        if !enabled {
            tracing::debug!("replication disabled; blocking bookie audit until enabled");
            self.under_replication
                .wait_until_replication_enabled()
                .await
                .map_err(|e| AuditError::ReplicationManagerUnavailable(e.to_string()))?;
        }

        // Step 2: build the bookie-to-ledger index. Taken before the
        // cluster view so a bookie added between the two reads is seen
        // as active (never spuriously reported lost), per §4.2 step 2's
        // ordering note.
        let index = self
            .indexer
            .bookie_to_ledger_index()
            .await
            .map_err(|e| AuditError::ClusterUnavailable(e.to_string()))?;

        // Step 3: re-check replication is still enabled before acting
        // on the index (§4.2 step 3) — avoids publishing against a
        // window where replication was disabled mid-cycle.
        let still_enabled = self
            .under_replication
            .is_replication_enabled()
            .await
            .map_err(|e| AuditError::ReplicationManagerUnavailable(e.to_string()))?;
        if !still_enabled {
            tracing::debug!("replication disabled mid-cycle; requeuing a fresh bookie audit");
            return Ok(BookieAuditOutcome::Requeue);
        }

        // Step 4: fetch the cluster view and compute the lost set
        // (invariant I4). Fatal on failure (§7 kind 2).
        let active = self
            .cluster_manager
            .active_bookies()
            .await
            .map_err(|e| AuditError::ClusterUnavailable(e.to_string()))?;
        let stale = self
            .cluster_manager
            .stale_bookies()
            .await
            .map_err(|e| AuditError::ClusterUnavailable(e.to_string()))?;
        let view = crate::domain::models::ClusterView::new(active, stale);
        let lost = LostBookieSet::compute(&view, &index);

        self.cluster_manager.notify_lost_bookies(lost.0.clone()).await;

        if lost.is_empty() {
            tracing::debug!("bookie audit cycle found no lost bookies");
            return Ok(BookieAuditOutcome::Completed);
        }

        // Step 5: mark every ledger on every lost bookie
        // under-replicated (the counter was already reset at cycle
        // start). A publish failure abandons the rest of that bookie's
        // ledgers and the cycle; the next tick starts fresh (§7 kind 3).
        let mut published = 0u64;
        for bookie in lost.iter() {
            let Some(ledgers) = index.get(bookie) else {
                continue;
            };
            for ledger_id in ledgers {
                self.under_replication
                    .mark_ledger_underreplicated(*ledger_id, bookie.clone())
                    .await
                    .map_err(|e| AuditError::PublishFailed(e.to_string()))?;
                published += 1;
                self.metrics.incr_published_underreplicated(1);
            }
        }

        tracing::info!(lost = lost.0.len(), published, "bookie audit cycle published under-replication");
        Ok(BookieAuditOutcome::Completed)
    }
}
