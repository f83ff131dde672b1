//! `AuditorState` + `LifecycleController` (§3, §4.5): the component
//! that owns the two lanes, wires the three periodic cycles onto them,
//! and exposes the Auditor's public lifecycle surface.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{AuditError, AuditResult};
use crate::domain::models::{AuditorConfig, LedgerId};
use crate::domain::ports::{
    AdminClient, BookieLedgerIndexer, ClusterManager, LedgerChecker, LedgerManager, MetricsSink,
    UnderReplicationManager,
};
use crate::services::bookie_audit_cycle::{BookieAuditCycle, BookieAuditOutcome};
use crate::services::ledger_check_cycle::LedgerCheckCycle;
use crate::services::scheduler::{Lane, LaneTask, Scheduler, TaskHandle};
use crate::services::under_replicated_snapshotter::{UnderReplicatedSnapshotter, UnderreplicatedLedgersSnapshot};

/// The Auditor's collaborators (§6 required collaborators), bundled so
/// `Auditor::new` doesn't take seven positional `Arc`s.
pub struct AuditorPorts {
    pub cluster_manager: Arc<dyn ClusterManager>,
    pub under_replication: Arc<dyn UnderReplicationManager>,
    pub indexer: Arc<dyn BookieLedgerIndexer>,
    pub ledger_manager: Arc<dyn LedgerManager>,
    pub admin_client: Arc<dyn AdminClient>,
    pub ledger_checker: Arc<dyn LedgerChecker>,
    pub metrics: Arc<dyn MetricsSink>,
}

/// Owns the two lanes, the under-replicated-ledgers snapshot, and the
/// three periodic cycles. The only state shared across lane boundaries
/// is `snapshot` (§5), swapped atomically by the snapshotter and read
/// by the gauge sampler.
pub struct Auditor {
    config: AuditorConfig,
    scheduler: Scheduler,
    cluster_manager: Arc<dyn ClusterManager>,
    /// Whether this Auditor constructed its own cluster manager and is
    /// therefore responsible for closing it on shutdown (§3 ownership).
    owns_cluster_manager: bool,
    metrics: Arc<dyn MetricsSink>,
    bookie_cycle: Arc<BookieAuditCycle>,
    ledger_cycle: Arc<LedgerCheckCycle>,
    snapshotter: Arc<UnderReplicatedSnapshotter>,
}

/// A `ClusterUnavailable` error (§7 kind 2: the cluster manager failed
/// to produce a view) is fatal — "terminate the current cycle and
/// trigger a shutdown request; the Auditor cannot operate without
/// membership visibility" (§4.2). Every periodic and one-shot task that
/// can surface this error routes its result through here so the fatal
/// path is handled the same way no matter which cycle raised it.
/// Shutting both lanes down directly (rather than submitting a
/// shutdown task) is safe here because this function only ever runs
/// from inside a task already executing on `bookie_lane` — there is no
/// outside caller racing to observe a half-shut lane.
fn shut_down_on_cluster_unavailable(
    result: AuditResult<()>,
    bookie_lane: &Arc<Lane>,
    ur_lane: &Arc<Lane>,
) -> AuditResult<()> {
    if let Err(AuditError::ClusterUnavailable(ref msg)) = result {
        tracing::error!(error = %msg, "cluster view unavailable; shutting the Auditor down");
        bookie_lane.shutdown();
        ur_lane.shutdown();
    }
    result
}

/// Builds the `LaneTask` for one bookie audit pass. On
/// `BookieAuditOutcome::Requeue` (§4.2 step 3: replication disabled
/// between index build and publish) it resubmits a fresh pass onto the
/// same lane before returning, matching scenario 2 of §8. The resubmit
/// is fire-and-forget from this task's point of view — the requeued
/// pass is a new, independently-tracked submission. A `ClusterUnavailable`
/// error shuts both lanes down instead of being left for `?` to merely
/// propagate into an unread `TaskHandle` (§4.2, §7 kind 2).
fn bookie_audit_task(cycle: Arc<BookieAuditCycle>, bookie_lane: Arc<Lane>, ur_lane: Arc<Lane>) -> LaneTask {
    Box::new(move |_cancel| {
        Box::pin(async move {
            match cycle.run().await {
                Ok(BookieAuditOutcome::Completed) => Ok(()),
                Ok(BookieAuditOutcome::Requeue) => {
                    let _ = bookie_lane.submit(bookie_audit_task(cycle.clone(), bookie_lane.clone(), ur_lane.clone()));
                    Ok(())
                }
                Err(e) => shut_down_on_cluster_unavailable(Err(e), &bookie_lane, &ur_lane),
            }
        })
    })
}

impl Auditor {
    pub fn new(config: AuditorConfig, ports: AuditorPorts, owns_cluster_manager: bool) -> Self {
        let snapshot: Arc<UnderreplicatedLedgersSnapshot> = Arc::new(ArcSwap::from_pointee(HashSet::<LedgerId>::new()));

        let bookie_cycle = Arc::new(BookieAuditCycle::new(
            ports.cluster_manager.clone(),
            ports.under_replication.clone(),
            ports.indexer.clone(),
            ports.metrics.clone(),
        ));
        let ledger_cycle = Arc::new(LedgerCheckCycle::new(
            ports.ledger_manager.clone(),
            ports.admin_client.clone(),
            ports.ledger_checker.clone(),
            ports.under_replication.clone(),
        ));
        let snapshotter = Arc::new(UnderReplicatedSnapshotter::new(
            ports.under_replication.clone(),
            ports.metrics.clone(),
            snapshot,
        ));

        Self {
            config,
            scheduler: Scheduler::new(),
            cluster_manager: ports.cluster_manager,
            owns_cluster_manager,
            bookie_cycle,
            ledger_cycle,
            snapshotter,
        }
    }

    /// `isRunning()`.
    pub fn is_running(&self) -> bool {
        !self.scheduler.bookie_lane.is_shutdown()
    }

    /// The last published under-replicated-ledgers snapshot size; 0
    /// before the first snapshotter run (§4.4).
    pub fn underreplicated_ledger_count(&self) -> u64 {
        self.snapshotter.snapshot_size()
    }

    /// `start()` (§4.5). Not re-entrant but idempotent in effect: a
    /// second call on an already-shut-down lane is a no-op.
    pub async fn start(&self) -> AuditResult<()> {
        if self.scheduler.bookie_lane.is_shutdown() {
            return Ok(());
        }

        if let Err(e) = self.cluster_manager.start().await {
            tracing::error!(error = %e, "cluster manager failed to start; Auditor is non-functional without membership");
            self.submit_shutdown_task();
            return Err(AuditError::ClusterUnavailable(e.to_string()));
        }
        self.cluster_manager.enable_stats(self.snapshotter_metrics()).await;

        if self.config.bookie_check_interval_secs == 0 {
            // "0 means run once immediately, then no periodic" (§4.5).
            self.submit_audit_task();
        } else {
            let cycle = self.bookie_cycle.clone();
            let bookie_lane = self.scheduler.bookie_lane.clone();
            let ur_lane = self.scheduler.ur_lane.clone();
            self.scheduler.bookie_lane.schedule_at_fixed_rate(
                move || bookie_audit_task(cycle.clone(), bookie_lane.clone(), ur_lane.clone()),
                Duration::from_secs(0),
                Duration::from_secs(self.config.bookie_check_interval_secs),
            );
        }

        if self.config.ledger_check_interval_secs > 0 {
            let cycle = self.ledger_cycle.clone();
            let bookie_lane = self.scheduler.bookie_lane.clone();
            let ur_lane = self.scheduler.ur_lane.clone();
            self.scheduler.bookie_lane.schedule_at_fixed_rate(
                move || {
                    let cycle = cycle.clone();
                    let bookie_lane = bookie_lane.clone();
                    let ur_lane = ur_lane.clone();
                    let task: LaneTask = Box::new(move |cancel| {
                        let cycle = cycle.clone();
                        let bookie_lane = bookie_lane.clone();
                        let ur_lane = ur_lane.clone();
                        Box::pin(async move {
                            let result = cycle.run(cancel).await;
                            shut_down_on_cluster_unavailable(result, &bookie_lane, &ur_lane)
                        })
                    });
                    task
                },
                Duration::from_secs(self.config.ledger_check_interval_secs),
                Duration::from_secs(self.config.ledger_check_interval_secs),
            );
        }

        if self.config.ur_snapshot_interval_secs > 0 {
            let snapshotter = self.snapshotter.clone();
            self.scheduler.ur_lane.schedule_at_fixed_rate(
                move || {
                    let snapshotter = snapshotter.clone();
                    let task: LaneTask = Box::new(move |_cancel| {
                        let snapshotter = snapshotter.clone();
                        Box::pin(async move { snapshotter.run().await })
                    });
                    task
                },
                Duration::from_secs(0),
                Duration::from_secs(self.config.ur_snapshot_interval_secs),
            );
        }

        Ok(())
    }

    fn snapshotter_metrics(&self) -> Arc<dyn MetricsSink> {
        // `enable_stats` wants the same sink the cycles already use;
        // `BookieAuditCycle` doesn't expose its own handle, so this
        // goes through the snapshotter, which was built from the same
        // `Arc` in `new`.
        self.bookie_cycle_metrics()
    }

    fn bookie_cycle_metrics(&self) -> Arc<dyn MetricsSink> {
        self.snapshotter.metrics()
    }

    /// `submitAuditTask()`: a one-shot bookie audit for external
    /// triggers (tests, membership-change hooks). Returns an
    /// already-failed future if the lane is shut down.
    pub fn submit_audit_task(&self) -> TaskHandle {
        let cycle = self.bookie_cycle.clone();
        let bookie_lane = self.scheduler.bookie_lane.clone();
        let ur_lane = self.scheduler.ur_lane.clone();
        self.scheduler
            .bookie_lane
            .submit(bookie_audit_task(cycle, bookie_lane, ur_lane))
    }

    /// `checkAllLedgers()`: package-visible test entry point for the
    /// ledger check cycle, run on the bookie lane like its periodic
    /// counterpart. A `ClusterUnavailable` result shuts the Auditor
    /// down the same way the periodic ledger-check task does (§7 kind 2).
    pub fn check_all_ledgers(&self) -> TaskHandle {
        let cycle = self.ledger_cycle.clone();
        let bookie_lane = self.scheduler.bookie_lane.clone();
        let ur_lane = self.scheduler.ur_lane.clone();
        self.scheduler.bookie_lane.submit(Box::new(move |cancel| {
            let cycle = cycle.clone();
            let bookie_lane = bookie_lane.clone();
            let ur_lane = ur_lane.clone();
            Box::pin(async move {
                let result = cycle.run(cancel).await;
                shut_down_on_cluster_unavailable(result, &bookie_lane, &ur_lane)
            })
        }))
    }

    /// `submitShutdownTask()`: idempotent. Enqueues a task that flips
    /// `bookieLane`'s shutdown flag from inside a lane task, so no
    /// running audit ever observes a half-shut lane; `urLane` has no
    /// such hazard and is shut down directly (invariant I5: once
    /// requested, neither lane accepts new work).
    pub fn submit_shutdown_task(&self) {
        if self.scheduler.bookie_lane.is_shutdown() {
            return;
        }
        let bookie_lane = self.scheduler.bookie_lane.clone();
        let _ = self.scheduler.bookie_lane.submit(Box::new(move |_cancel| {
            let bookie_lane = bookie_lane.clone();
            Box::pin(async move {
                bookie_lane.shutdown();
                Ok(())
            })
        }));
        self.scheduler.ur_lane.shutdown();
    }

    /// `shutdown()` (§4.5, §5): requests shutdown, then waits in
    /// 30-second slices for `bookieLane` to drain, escalating to
    /// `shutdownNow()` on both lanes after any slice that doesn't
    /// finish. `cancel` models "interruption during wait": if it fires
    /// the wait loop returns immediately.
    pub async fn shutdown(&self, cancel: CancellationToken) {
        self.submit_shutdown_task();

        loop {
            let slice = self.scheduler.bookie_lane.await_termination(Duration::from_secs(30));
            tokio::select! {
                drained = slice => {
                    if drained {
                        return;
                    }
                    tracing::warn!("bookieLane did not terminate within a 30s slice; escalating to shutdownNow");
                    self.scheduler.bookie_lane.shutdown_now();
                    self.scheduler.ur_lane.shutdown_now();
                }
                () = cancel.cancelled() => {
                    tracing::warn!("shutdown wait interrupted");
                    return;
                }
            }
        }
    }

    /// Teardown of the self-constructed cluster manager, if any (§3,
    /// §5). Must be called after `shutdown()` has drained the lanes so
    /// no audit is still calling through to it.
    pub async fn close_owned_resources(&self) {
        if self.owns_cluster_manager {
            self.cluster_manager.shutdown().await;
        }
    }
}
