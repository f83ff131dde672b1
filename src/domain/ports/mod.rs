//! Domain ports (interfaces) for the Auditor's external collaborators (§6).

pub mod cluster_manager;
pub mod ledger_checker;
pub mod ledger_indexer;
pub mod ledger_manager;
pub mod metrics_sink;
pub mod speculative_executor;
pub mod under_replication_manager;

pub use cluster_manager::ClusterManager;
pub use ledger_checker::{AdminClient, LedgerChecker, LedgerHandle};
pub use ledger_indexer::BookieLedgerIndexer;
pub use ledger_manager::{LedgerManager, LedgerProcessor};
pub use metrics_sink::MetricsSink;
pub use speculative_executor::SpeculativeRequestExecutor;
pub use under_replication_manager::UnderReplicationManager;
