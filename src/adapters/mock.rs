//! In-memory port implementations used by tests and the demo binary.
//!
//! Mirrors the teacher's testing style of hand-written in-memory
//! repository doubles (see its `domain::ports` test modules) rather
//! than a mocking-macro crate — every adapter here is a small struct a
//! test can configure by hand.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::Arc;

use tokio::sync::Notify;

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::{BookieId, BookieLedgerIndex, LedgerFragment, LedgerId};
use crate::domain::ports::{
    AdminClient, BookieLedgerIndexer, ClusterManager, LedgerChecker, LedgerHandle, LedgerManager,
    LedgerProcessor, MetricsSink, SpeculativeRequestExecutor, UnderReplicationManager,
};

/// `ClusterManager` double: returns a fixed active/stale view, or a
/// transport failure if configured to.
#[derive(Default)]
pub struct MockClusterManager {
    active: HashSet<BookieId>,
    stale: HashSet<BookieId>,
    fail: bool,
    /// Fails `active_bookies`/`stale_bookies` while `start()` still
    /// succeeds — models a cluster view transport failure discovered
    /// mid-lifecycle by a later periodic cycle, distinct from `fail`
    /// (which fails `start()` itself).
    fail_view: bool,
    notified_lost: Mutex<Vec<HashSet<BookieId>>>,
}

impl MockClusterManager {
    pub fn with_view(active: HashSet<BookieId>, stale: HashSet<BookieId>) -> Self {
        Self {
            active,
            stale,
            fail: false,
            fail_view: false,
            notified_lost: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Starts successfully but fails every subsequent `active_bookies`/
    /// `stale_bookies` call, as if membership visibility was lost after
    /// the Auditor was already running.
    pub fn failing_view_after_start() -> Self {
        Self {
            fail_view: true,
            ..Default::default()
        }
    }

    pub fn notifications(&self) -> Vec<HashSet<BookieId>> {
        self.notified_lost.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterManager for MockClusterManager {
    async fn start(&self) -> Result<(), PortError> {
        if self.fail {
            return Err(PortError::Unavailable("cluster manager down".into()));
        }
        Ok(())
    }

    async fn active_bookies(&self) -> Result<HashSet<BookieId>, PortError> {
        if self.fail || self.fail_view {
            return Err(PortError::Transport("active bookies unavailable".into()));
        }
        Ok(self.active.clone())
    }

    async fn stale_bookies(&self) -> Result<HashSet<BookieId>, PortError> {
        if self.fail || self.fail_view {
            return Err(PortError::Transport("stale bookies unavailable".into()));
        }
        Ok(self.stale.clone())
    }

    async fn notify_lost_bookies(&self, lost: HashSet<BookieId>) {
        self.notified_lost.lock().unwrap().push(lost);
    }

    async fn shutdown(&self) {}
}

/// `UnderReplicationManager` double.
pub struct MockUnderReplicationManager {
    enabled: AtomicBool,
    fail_enabled_check: bool,
    fail_publish: bool,
    /// When set, `is_replication_enabled` returns `true` for calls
    /// before this count and `false` from then on — models replication
    /// being disabled partway through a cycle (scenario 2 of §8).
    disable_after_calls: Option<u64>,
    enabled_check_calls: AtomicU64,
    root: String,
    published: Mutex<Vec<(LedgerId, BookieId)>>,
    /// Wakes `wait_until_replication_enabled` waiters when `enable` is
    /// called, modeling the source's one-shot watcher callback (§4.2
    /// step 1, §6 `notifyLedgerReplicationEnabled`).
    notify: Notify,
}

impl MockUnderReplicationManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            fail_enabled_check: false,
            fail_publish: false,
            disable_after_calls: None,
            enabled_check_calls: AtomicU64::new(0),
            root: "/ledgerunderreplication".to_string(),
            published: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    /// Enabled on the first `is_replication_enabled` call, disabled on
    /// every call after — the index-build race in §4.2 step 3.
    pub fn new_disabling_after_first_check() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            fail_enabled_check: false,
            fail_publish: false,
            disable_after_calls: Some(1),
            enabled_check_calls: AtomicU64::new(0),
            root: "/ledgerunderreplication".to_string(),
            published: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    pub fn failing_enabled_check() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            fail_enabled_check: true,
            fail_publish: false,
            disable_after_calls: None,
            enabled_check_calls: AtomicU64::new(0),
            root: "/ledgerunderreplication".to_string(),
            published: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    pub fn failing_publish() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            fail_enabled_check: false,
            fail_publish: true,
            disable_after_calls: None,
            enabled_check_calls: AtomicU64::new(0),
            root: "/ledgerunderreplication".to_string(),
            published: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    pub fn published(&self) -> Vec<(LedgerId, BookieId)> {
        self.published.lock().unwrap().clone()
    }

    /// Flips replication to enabled and wakes any caller parked in
    /// `wait_until_replication_enabled` — the test-side equivalent of
    /// the source firing its one-shot watcher callback.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }
}

#[async_trait]
impl UnderReplicationManager for MockUnderReplicationManager {
    async fn is_replication_enabled(&self) -> Result<bool, PortError> {
        if self.fail_enabled_check {
            return Err(PortError::Unavailable("zk session lost".into()));
        }
        let call = self.enabled_check_calls.fetch_add(1, Ordering::AcqRel);
        if let Some(threshold) = self.disable_after_calls {
            return Ok(call < threshold && self.enabled.load(Ordering::Acquire));
        }
        Ok(self.enabled.load(Ordering::Acquire))
    }

    async fn wait_until_replication_enabled(&self) -> Result<(), PortError> {
        if self.fail_enabled_check {
            return Err(PortError::Unavailable("zk session lost".into()));
        }
        loop {
            let notified = self.notify.notified();
            if self.enabled.load(Ordering::Acquire) {
                return Ok(());
            }
            notified.await;
        }
    }

    async fn mark_ledger_underreplicated(
        &self,
        ledger_id: LedgerId,
        missing_bookie: BookieId,
    ) -> Result<(), PortError> {
        if self.fail_publish {
            return Err(PortError::Transport("publish failed".into()));
        }
        self.published.lock().unwrap().push((ledger_id, missing_bookie));
        Ok(())
    }

    async fn all_underreplicated_ledger_paths(&self) -> Result<Vec<String>, PortError> {
        Ok(self
            .published
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| crate::domain::models::format_ledger_path(&self.root, *id))
            .collect())
    }
}

/// `BookieLedgerIndexer` double.
#[derive(Default)]
pub struct MockBookieLedgerIndexer {
    index: BookieLedgerIndex,
    fail: bool,
}

impl MockBookieLedgerIndexer {
    pub fn new(index: BookieLedgerIndex) -> Self {
        Self { index, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            index: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl BookieLedgerIndexer for MockBookieLedgerIndexer {
    async fn bookie_to_ledger_index(&self) -> Result<BookieLedgerIndex, PortError> {
        if self.fail {
            return Err(PortError::Transport("index scan failed".into()));
        }
        Ok(self.index.clone())
    }
}

/// `MetricsSink` double: in-memory counters, readable from tests.
#[derive(Default)]
pub struct MockMetricsSink {
    published: AtomicU64,
    gauge: AtomicU64,
}

impl MockMetricsSink {
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    pub fn gauge_value(&self) -> u64 {
        self.gauge.load(Ordering::Acquire)
    }
}

impl MetricsSink for MockMetricsSink {
    fn incr_published_underreplicated(&self, by: u64) {
        self.published.fetch_add(by, Ordering::AcqRel);
    }

    fn reset_published_underreplicated(&self) {
        self.published.store(0, Ordering::Release);
    }

    fn set_underreplicated_gauge(&self, value: u64) {
        self.gauge.store(value, Ordering::Release);
    }
}

/// `LedgerManager` double: drives `processor` over a fixed id list.
pub struct MockLedgerManager {
    ledger_ids: Vec<LedgerId>,
    fail: bool,
}

impl MockLedgerManager {
    pub fn new(ledger_ids: Vec<LedgerId>) -> Self {
        Self {
            ledger_ids,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            ledger_ids: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl LedgerManager for MockLedgerManager {
    async fn async_process_ledgers(&self, processor: LedgerProcessor) -> Result<(), PortError> {
        if self.fail {
            return Err(PortError::Transport("ledger enumeration failed".into()));
        }
        for id in &self.ledger_ids {
            processor(*id).await;
        }
        Ok(())
    }
}

/// `AdminClient` double.
pub struct MockAdminClient {
    deleted: HashSet<LedgerId>,
    unavailable: HashSet<LedgerId>,
    closed: Mutex<Vec<LedgerId>>,
}

impl MockAdminClient {
    pub fn new(deleted: HashSet<LedgerId>, unavailable: HashSet<LedgerId>) -> Self {
        Self {
            deleted,
            unavailable,
            closed: Mutex::new(Vec::new()),
        }
    }

    pub fn closed(&self) -> Vec<LedgerId> {
        self.closed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminClient for MockAdminClient {
    async fn open_ledger_no_recovery(&self, ledger_id: LedgerId) -> Result<LedgerHandle, PortError> {
        if self.deleted.contains(&ledger_id) {
            return Err(PortError::NotFound(format!("ledger {ledger_id} deleted")));
        }
        if self.unavailable.contains(&ledger_id) {
            return Err(PortError::Unavailable(format!("ledger {ledger_id} unavailable")));
        }
        Ok(LedgerHandle { ledger_id })
    }

    async fn close_ledger(&self, handle: LedgerHandle) -> Result<(), PortError> {
        self.closed.lock().unwrap().push(handle.ledger_id);
        Ok(())
    }
}

/// `LedgerChecker` double: returns a fixed fragment list per ledger id.
#[derive(Default)]
pub struct MockLedgerChecker {
    fragments: HashMap<LedgerId, Vec<LedgerFragment>>,
}

impl MockLedgerChecker {
    pub fn new(fragments: HashMap<LedgerId, Vec<LedgerFragment>>) -> Self {
        Self { fragments }
    }
}

#[async_trait]
impl LedgerChecker for MockLedgerChecker {
    async fn check_ledger(&self, handle: LedgerHandle) -> Result<Vec<LedgerFragment>, PortError> {
        Ok(self.fragments.get(&handle.ledger_id).cloned().unwrap_or_default())
    }
}

/// `SpeculativeRequestExecutor` double: a scripted sequence of
/// outcomes, one per call, holding on the last entry once exhausted.
pub struct MockSpeculativeExecutor {
    script: Vec<Result<bool, PortError>>,
    calls: AtomicU64,
}

impl MockSpeculativeExecutor {
    pub fn new(script: Vec<Result<bool, PortError>>) -> Self {
        Self {
            script,
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl SpeculativeRequestExecutor for MockSpeculativeExecutor {
    async fn issue_speculative_request(&self) -> Result<bool, PortError> {
        let idx = self.calls.fetch_add(1, Ordering::AcqRel) as usize;
        self.script
            .get(idx)
            .cloned()
            .unwrap_or_else(|| self.script.last().cloned().unwrap_or(Ok(false)))
    }
}

/// Type-erased bundle, handy for wiring up `AuditorState` in tests and
/// the demo binary without repeating five `Arc::new` calls.
pub struct MockPorts {
    pub cluster_manager: Arc<dyn ClusterManager>,
    pub under_replication: Arc<dyn UnderReplicationManager>,
    pub indexer: Arc<dyn BookieLedgerIndexer>,
    pub ledger_manager: Arc<dyn LedgerManager>,
    pub admin_client: Arc<dyn AdminClient>,
    pub ledger_checker: Arc<dyn LedgerChecker>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl Default for MockPorts {
    fn default() -> Self {
        Self {
            cluster_manager: Arc::new(MockClusterManager::default()),
            under_replication: Arc::new(MockUnderReplicationManager::new(true)),
            indexer: Arc::new(MockBookieLedgerIndexer::default()),
            ledger_manager: Arc::new(MockLedgerManager::new(Vec::new())),
            admin_client: Arc::new(MockAdminClient::new(HashSet::new(), HashSet::new())),
            ledger_checker: Arc::new(MockLedgerChecker::default()),
            metrics: Arc::new(MockMetricsSink::default()),
        }
    }
}
