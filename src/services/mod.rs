//! The Auditor's control-plane and speculative-scheduler services (§4).

pub mod auditor;
pub mod bookie_audit_cycle;
pub mod ledger_check_cycle;
pub mod scheduler;
pub mod speculative_scheduler;
pub mod under_replicated_snapshotter;

pub use auditor::{Auditor, AuditorPorts};
pub use bookie_audit_cycle::{BookieAuditCycle, BookieAuditOutcome};
pub use ledger_check_cycle::LedgerCheckCycle;
pub use scheduler::{Lane, LaneTask, Scheduler, TaskHandle};
pub use speculative_scheduler::{initiate as initiate_speculative_chain, SpeculativeChain, SpeculativePolicy, SpeculativePolicyError};
pub use under_replicated_snapshotter::{UnderReplicatedSnapshotter, UnderreplicatedLedgersSnapshot};
