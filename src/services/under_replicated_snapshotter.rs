//! `UnderReplicatedSnapshotter` (§4.4): periodic task on `urLane` that
//! refreshes the shared under-replicated-ledgers snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::domain::errors::AuditResult;
use crate::domain::models::{parse_ledger_id_from_path, LedgerId};
use crate::domain::ports::{MetricsSink, UnderReplicationManager};

/// Holds the last snapshot with reference-swap semantics (invariant
/// I7): readers always see a fully-built set, never a partial update.
pub type UnderreplicatedLedgersSnapshot = ArcSwap<HashSet<LedgerId>>;

pub struct UnderReplicatedSnapshotter {
    under_replication: Arc<dyn UnderReplicationManager>,
    metrics: Arc<dyn MetricsSink>,
    snapshot: Arc<UnderreplicatedLedgersSnapshot>,
}

impl UnderReplicatedSnapshotter {
    pub fn new(
        under_replication: Arc<dyn UnderReplicationManager>,
        metrics: Arc<dyn MetricsSink>,
        snapshot: Arc<UnderreplicatedLedgersSnapshot>,
    ) -> Self {
        Self {
            under_replication,
            metrics,
            snapshot,
        }
    }

    /// `sampleSnapshotSize()`: the gauge reads the current snapshot's
    /// size, 0 before the first run (§4.4).
    pub fn snapshot_size(&self) -> u64 {
        self.snapshot.load().len() as u64
    }

    /// The metrics sink this snapshotter was built with, reused by
    /// `AuditorState` to register the cluster manager's stats sink
    /// against the same instruments the cycles publish to.
    pub fn metrics(&self) -> Arc<dyn MetricsSink> {
        self.metrics.clone()
    }

    pub async fn run(&self) -> AuditResult<()> {
        let paths = self
            .under_replication
            .all_underreplicated_ledger_paths()
            .await
            .map_err(|e| crate::domain::errors::AuditError::ReplicationManagerUnavailable(e.to_string()))?;

        let mut ledger_ids: HashSet<LedgerId> = HashSet::new();
        let mut ignored = 0usize;
        for path in &paths {
            match parse_ledger_id_from_path(path) {
                Some(id) => {
                    ledger_ids.insert(id);
                }
                None => ignored += 1,
            }
        }
        if ignored > 0 {
            tracing::debug!(ignored, "snapshotter ignored unparseable under-replication paths");
        }

        self.snapshot.store(Arc::new(ledger_ids));
        self.metrics.set_underreplicated_gauge(self.snapshot_size());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockMetricsSink, MockUnderReplicationManager};
    use crate::domain::models::BookieId;

    #[tokio::test]
    async fn gauge_reads_zero_before_first_run() {
        let under_replication = Arc::new(MockUnderReplicationManager::new(true));
        let metrics = Arc::new(MockMetricsSink::default());
        let snapshot = Arc::new(ArcSwap::from_pointee(HashSet::new()));
        let snapshotter = UnderReplicatedSnapshotter::new(under_replication, metrics, snapshot);
        assert_eq!(snapshotter.snapshot_size(), 0);
    }

    #[tokio::test]
    async fn swaps_in_parsed_ledger_ids_and_updates_gauge() {
        let under_replication = Arc::new(MockUnderReplicationManager::new(true));
        under_replication
            .mark_ledger_underreplicated(LedgerId(10), BookieId::from("A"))
            .await
            .unwrap();
        under_replication
            .mark_ledger_underreplicated(LedgerId(255), BookieId::from("B"))
            .await
            .unwrap();

        let metrics = Arc::new(MockMetricsSink::default());
        let snapshot = Arc::new(ArcSwap::from_pointee(HashSet::new()));
        let snapshotter = UnderReplicatedSnapshotter::new(under_replication, metrics.clone(), snapshot);

        snapshotter.run().await.unwrap();
        assert_eq!(snapshotter.snapshot_size(), 2);
        assert_eq!(metrics.gauge_value(), 2);
    }
}
