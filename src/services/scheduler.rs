//! The two-lane serial scheduler (§4.1).
//!
//! Each `Lane` is a single-worker serial executor: tasks submitted to it
//! run strictly one after another, never overlapping, even when a
//! fixed-rate task's period elapses before the previous run finished
//! (the next submission simply queues up behind it). A panic inside a
//! task is caught at the lane boundary and logged — it never kills the
//! lane, matching §4.1's "exceptions never terminate the lane".

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{AuditError, AuditResult};

/// Work item run by a lane. Receives a `CancellationToken` that is
/// cancelled by `shutdown_now`, so long-running tasks (in particular
/// `LedgerCheckCycle`) have something to poll at their own cooperative
/// abort points.
pub type LaneTask =
    Box<dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = AuditResult<()>> + Send>> + Send>;

/// The outcome of a submitted task, as a plain future — equivalent to
/// `submitAuditTask() -> future<void>` carrying an audit-exception on
/// failure.
pub type TaskHandle = Pin<Box<dyn Future<Output = AuditResult<()>> + Send>>;

struct QueuedTask {
    task: LaneTask,
    outcome_tx: oneshot::Sender<AuditResult<()>>,
}

/// A single-threaded serial executor.
pub struct Lane {
    name: &'static str,
    sender: mpsc::UnboundedSender<QueuedTask>,
    shutdown: Arc<AtomicBool>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
}

impl Lane {
    pub fn new(name: &'static str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let cancel = CancellationToken::new();
        let in_flight = Arc::new(AtomicUsize::new(0));

        tokio::spawn(Self::run_worker(
            name,
            receiver,
            cancel.clone(),
            in_flight.clone(),
        ));

        Self {
            name,
            sender,
            shutdown,
            cancel,
            in_flight,
        }
    }

    async fn run_worker(
        name: &'static str,
        mut receiver: mpsc::UnboundedReceiver<QueuedTask>,
        cancel: CancellationToken,
        in_flight: Arc<AtomicUsize>,
    ) {
        while let Some(queued) = receiver.recv().await {
            if cancel.is_cancelled() {
                let _ = queued.outcome_tx.send(Err(AuditError::Interrupted));
                in_flight.fetch_sub(1, Ordering::AcqRel);
                continue;
            }

            let task_cancel = cancel.clone();
            let join = tokio::spawn((queued.task)(task_cancel));
            let outcome = match join.await {
                Ok(result) => result,
                Err(join_err) => {
                    tracing::error!(lane = name, error = %join_err, "lane task panicked; lane continues");
                    Err(AuditError::Interrupted)
                }
            };
            let _ = queued.outcome_tx.send(outcome);
            in_flight.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// `submit(task) -> handle`.
    pub fn submit(&self, task: LaneTask) -> TaskHandle {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!(lane = self.name, "rejected submission: lane is shut down");
            return Box::pin(async { Err(AuditError::Rejected) });
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        if self
            .sender
            .send(QueuedTask { task, outcome_tx })
            .is_err()
        {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            return Box::pin(async { Err(AuditError::Rejected) });
        }

        Box::pin(async move { outcome_rx.await.unwrap_or(Err(AuditError::Rejected)) })
    }

    /// `schedule(task, delay)`: run `factory()` once, `delay` from now.
    pub fn schedule<F>(self: &Arc<Self>, factory: F, delay: Duration)
    where
        F: Fn() -> LaneTask + Send + Sync + 'static,
    {
        let lane = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !lane.shutdown.load(Ordering::Acquire) {
                lane.submit(factory());
            }
        });
    }

    /// `scheduleAtFixedRate(task, initialDelay, period)`. The ticker
    /// re-submits `period` after the *previous tick's scheduled start*,
    /// not after the previous run's completion; overlap is prevented by
    /// the lane's own serial execution, not by the ticker.
    pub fn schedule_at_fixed_rate<F>(self: &Arc<Self>, factory: F, initial_delay: Duration, period: Duration)
    where
        F: Fn() -> LaneTask + Send + Sync + 'static,
    {
        let lane = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;
            let mut ticker = tokio::time::interval(period);
            // The first tick fires immediately; we already waited initial_delay.
            ticker.tick().await;
            loop {
                if lane.shutdown.load(Ordering::Acquire) {
                    return;
                }
                lane.submit(factory());
                ticker.tick().await;
            }
        });
    }

    /// `isShutdown()`.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// `shutdown()`: stop accepting new work; in-flight and already
    /// queued tasks are left to drain.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// `shutdownNow()`: in addition to `shutdown()`, cooperatively
    /// interrupt whatever is currently running and fail anything still
    /// queued with `Interrupted` rather than letting it start.
    pub fn shutdown_now(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.cancel.cancel();
    }

    /// `awaitTermination(timeout) -> bool`: true if every queued and
    /// in-flight task drained within `timeout`.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Owns the two independent lanes (§2, §4.1): `bookie_lane` for bookie
/// audits and one-shot submissions, `ur_lane` for the under-replicated
/// snapshotter. Kept separate so a slow ledger check never delays
/// snapshot refresh or vice versa.
pub struct Scheduler {
    pub bookie_lane: Arc<Lane>,
    pub ur_lane: Arc<Lane>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            bookie_lane: Arc::new(Lane::new("bookie")),
            ur_lane: Arc::new(Lane::new("under-replication")),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
