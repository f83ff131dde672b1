//! Cluster membership port (§6: `BookieClusterManager`).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::PortError;
use crate::domain::models::BookieId;
use crate::domain::ports::metrics_sink::MetricsSink;

#[async_trait]
pub trait ClusterManager: Send + Sync {
    /// `start()`. Failure here is fatal to the Auditor (§4.5).
    async fn start(&self) -> Result<(), PortError>;

    /// `enableStats(sink)`. Default no-op for adapters that don't
    /// register their own instruments.
    async fn enable_stats(&self, _sink: Arc<dyn MetricsSink>) {}

    /// `getActiveBookies()`. Transport failure here is fatal (§7 kind 2).
    async fn active_bookies(&self) -> Result<HashSet<BookieId>, PortError>;

    /// `fetchStaleBookies()`. Transport failure here is fatal (§7 kind 2).
    async fn stale_bookies(&self) -> Result<HashSet<BookieId>, PortError>;

    /// `lostBookiesChanged(set)`.
    async fn notify_lost_bookies(&self, lost: HashSet<BookieId>);

    /// Teardown. Only called by the Auditor on a manager it constructed
    /// itself — an injected manager is shared and outlives shutdown
    /// (§3 ownership, §5 resource lifecycles).
    async fn shutdown(&self);
}
