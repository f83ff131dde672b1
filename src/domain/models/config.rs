//! Configuration schema for the Auditor (§6 configuration keys).

use serde::{Deserialize, Serialize};

/// Root configuration for the Auditor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditorConfig {
    /// `auditorPeriodicCheckInterval` — ledger check cadence, seconds.
    /// 0 disables the ledger check lane entirely.
    #[serde(default = "default_ledger_check_interval_secs")]
    pub ledger_check_interval_secs: u64,

    /// `auditorPeriodicBookieCheckInterval` — bookie audit cadence,
    /// seconds. 0 means "run once immediately, then no periodic" (§4.5).
    #[serde(default = "default_bookie_check_interval_secs")]
    pub bookie_check_interval_secs: u64,

    /// `auditorURLedgerCheckInterval` — under-replicated snapshot
    /// cadence, seconds. 0 disables the snapshotter lane.
    #[serde(default = "default_ur_snapshot_interval_secs")]
    pub ur_snapshot_interval_secs: u64,

    /// External metadata store configuration, used only by the
    /// dedicated connection `LedgerCheckCycle` opens per run (§4.3/§5).
    #[serde(default)]
    pub metadata_store: MetadataStoreConfig,

    /// Under-replication path root, e.g. `/ledgerunderreplication`, used
    /// to parse the snapshotter's path shape (§4.4/§6).
    #[serde(default = "default_under_replication_root")]
    pub under_replication_root: String,

    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_ledger_check_interval_secs() -> u64 {
    21_600 // 6 hours
}

const fn default_bookie_check_interval_secs() -> u64 {
    3_600 // 1 hour
}

const fn default_ur_snapshot_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_under_replication_root() -> String {
    "/ledgerunderreplication".to_string()
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            ledger_check_interval_secs: default_ledger_check_interval_secs(),
            bookie_check_interval_secs: default_bookie_check_interval_secs(),
            ur_snapshot_interval_secs: default_ur_snapshot_interval_secs(),
            metadata_store: MetadataStoreConfig::default(),
            under_replication_root: default_under_replication_root(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Connection details for the external metadata store client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetadataStoreConfig {
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_endpoints() -> Vec<String> {
    vec!["localhost:2181".to_string()]
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for MetadataStoreConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Logging configuration, mirrored from the teacher's ambient stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for a rolling file sink; stdout-only if unset.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
