//! Structured logging infrastructure.
//!
//! `tracing` + `tracing-subscriber`, mirroring the teacher's
//! `infrastructure::logging` layering, scaled down to this crate's
//! single `LoggingConfig` (no rotation policy or retention — the
//! Auditor has nothing resembling an audit trail to retain).

pub mod logger;

pub use logger::LoggerImpl;
