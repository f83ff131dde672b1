//! `LoggerImpl::init` (SPEC_FULL §B.3): wires `tracing_subscriber`
//! from `LoggingConfig`, grounded in the teacher's
//! `infrastructure::logging::logger::LoggerImpl::init`.

use anyhow::{Context, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Owns the non-blocking writer guard (if any) so the background
/// flush thread lives for the process lifetime. Dropping this ends
/// logging — `main.rs` holds it until shutdown.
pub struct LoggerImpl {
    _guard: Option<WorkerGuard>,
}

impl LoggerImpl {
    /// Initialize the global `tracing` subscriber. Idempotent is not
    /// guaranteed — like the teacher's logger, this is meant to be
    /// called exactly once, from `main`.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_level(&config.level)?;
        let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::daily(log_dir, "ledger-auditor.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter.clone());

            let stdout_layer = Self::stdout_layer(&config.format, env_filter);

            tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
            Some(guard)
        } else {
            let stdout_layer = Self::stdout_layer(&config.format, env_filter);
            tracing_subscriber::registry().with(stdout_layer).init();
            None
        };

        Ok(Self { _guard: guard })
    }

    fn stdout_layer<S>(
        format: &str,
        env_filter: EnvFilter,
    ) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        if format == "json" {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(env_filter)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stdout)
                .with_target(true)
                .with_filter(env_filter)
                .boxed()
        }
    }
}

fn parse_level(level: &str) -> Result<Level> {
    level
        .parse::<Level>()
        .context(format!("invalid log level '{level}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_levels() {
        assert_eq!(parse_level("info").unwrap(), Level::INFO);
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
    }

    #[test]
    fn rejects_invalid_level() {
        assert!(parse_level("verbose").is_err());
    }
}
