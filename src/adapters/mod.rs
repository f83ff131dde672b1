//! Concrete and in-memory implementations of the domain ports (§6).

pub mod metrics_sink;
pub mod mock;

pub use metrics_sink::FacadeMetricsSink;
