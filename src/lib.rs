//! Ledger Auditor — control-plane component for a distributed
//! append-only ledger store.
//!
//! Detects under-replicated ledgers by cross-referencing cluster
//! membership against the bookie-to-ledger index, publishes repair
//! work to an external under-replication queue, and runs a speculative
//! request scheduler used by read paths to hedge tail latency. See
//! `DESIGN.md` for the module-by-module grounding ledger.

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{AuditError, AuditResult};
pub use services::{Auditor, AuditorPorts};
