//! Thin CLI bootstrap: load config, init logging and metrics, wire the
//! in-memory mock adapters (§1 scopes the real ledger-store clients
//! out), build the Auditor, run until signalled, shut down cleanly.
//!
//! Mirrors the teacher's `main.rs` dispatch shape — parse args, load
//! config, construct the service, dispatch on the subcommand — scaled
//! down to this crate's two commands.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio_util::sync::CancellationToken;

use ledger_auditor::adapters::mock::{
    MockAdminClient, MockBookieLedgerIndexer, MockClusterManager, MockLedgerChecker, MockLedgerManager,
    MockUnderReplicationManager,
};
use ledger_auditor::adapters::FacadeMetricsSink;
use ledger_auditor::infrastructure::config::ConfigLoader;
use ledger_auditor::infrastructure::logging::LoggerImpl;
use ledger_auditor::{Auditor, AuditorPorts};

#[derive(Parser)]
#[command(name = "ledger-auditor", about = "Control-plane auditor for a distributed ledger store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Auditor and run until interrupted.
    Run,
    /// Run a single bookie audit pass against the wired adapters and exit.
    CheckOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load().context("failed to load Auditor configuration")?;
    let _logger = LoggerImpl::init(&config.logging).context("failed to initialize logging")?;

    // Demo-only: installs the default Prometheus exporter globally.
    // `services/` code never touches this recorder directly — every
    // instrument goes through the `MetricsSink` port (§6, SPEC_FULL §B.5).
    if let Err(e) = PrometheusBuilder::new().install() {
        tracing::warn!(error = %e, "failed to install Prometheus exporter; metrics will be recorded but not exported");
    }

    let ports = AuditorPorts {
        cluster_manager: Arc::new(MockClusterManager::default()),
        under_replication: Arc::new(MockUnderReplicationManager::new(true)),
        indexer: Arc::new(MockBookieLedgerIndexer::default()),
        ledger_manager: Arc::new(MockLedgerManager::new(Vec::new())),
        admin_client: Arc::new(MockAdminClient::new(HashSet::new(), HashSet::new())),
        ledger_checker: Arc::new(MockLedgerChecker::default()),
        metrics: Arc::new(FacadeMetricsSink::new()),
    };

    let auditor = Auditor::new(config, ports, false);

    match cli.command {
        Commands::Run => {
            auditor.start().await.context("Auditor failed to start")?;
            tracing::info!("Auditor running; waiting for ctrl-c");
            tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
            tracing::info!("shutdown requested");
            auditor.shutdown(CancellationToken::new()).await;
            auditor.close_owned_resources().await;
        }
        Commands::CheckOnce => {
            auditor.start().await.context("Auditor failed to start")?;
            // `start()` with a non-zero bookie interval schedules the
            // periodic task; give it a moment to complete its first
            // immediate run before shutting back down.
            tokio::time::sleep(Duration::from_millis(200)).await;
            auditor.shutdown(CancellationToken::new()).await;
            auditor.close_owned_resources().await;
        }
    }

    Ok(())
}
