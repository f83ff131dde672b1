//! Domain models for the Auditor.

pub mod bookie;
pub mod cluster_view;
pub mod config;
pub mod ledger;

pub use bookie::BookieId;
pub use cluster_view::{BookieLedgerIndex, ClusterView, LostBookieSet};
pub use config::{AuditorConfig, LoggingConfig, MetadataStoreConfig};
pub use ledger::{format_ledger_path, parse_ledger_id_from_path, LedgerFragment, LedgerId, UnderReplicationRecord};
