//! Cluster membership snapshot and lost-bookie computation.

use std::collections::{HashMap, HashSet};

use super::bookie::BookieId;
use super::ledger::LedgerId;

/// A consistent snapshot of which bookies are known active vs. stale,
/// as produced by the cluster manager for a single audit cycle. Never
/// reused across cycles (invariant 2 of §3).
#[derive(Debug, Clone, Default)]
pub struct ClusterView {
    pub active: HashSet<BookieId>,
    pub stale: HashSet<BookieId>,
}

impl ClusterView {
    pub fn new(active: HashSet<BookieId>, stale: HashSet<BookieId>) -> Self {
        Self { active, stale }
    }
}

/// Mapping of bookie to the set of ledgers present on it at scan time.
/// Built fresh per audit cycle and discarded once consumed — never
/// promoted to instance state (§9 design note on `ledgerDetails`).
pub type BookieLedgerIndex = HashMap<BookieId, HashSet<LedgerId>>;

/// The bookies judged lost in one bookie-audit cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LostBookieSet(pub HashSet<BookieId>);

impl LostBookieSet {
    /// `lost = stale ∪ (indexed − active)`, exactly (invariant I4).
    pub fn compute(view: &ClusterView, index: &BookieLedgerIndex) -> Self {
        let mut lost = view.stale.clone();
        for bookie in index.keys() {
            if !view.active.contains(bookie) {
                lost.insert(bookie.clone());
            }
        }
        Self(lost)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookieId> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
