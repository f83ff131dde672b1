//! `MetricsSink` backed by the `metrics` facade crate (§6 metrics
//! surface, SPEC_FULL §B.5). The concrete recorder (a
//! `metrics-exporter-prometheus` `PrometheusHandle`) is installed once
//! in `main.rs`; this adapter only ever talks to the facade's global
//! recorder, never the exporter directly, matching the teacher's habit
//! of keeping a concrete backend behind the port it was built for.

use metrics::{counter, gauge};

use crate::domain::ports::MetricsSink;

const PUBLISHED_UNDERREPLICATED_LEDGERS: &str = "published_underreplicated_ledgers";
const UNDERREPLICATED_LEDGERS: &str = "underreplicated_ledgers";

#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeMetricsSink;

impl FacadeMetricsSink {
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for FacadeMetricsSink {
    fn incr_published_underreplicated(&self, by: u64) {
        counter!(PUBLISHED_UNDERREPLICATED_LEDGERS).increment(by);
    }

    fn reset_published_underreplicated(&self) {
        counter!(PUBLISHED_UNDERREPLICATED_LEDGERS).absolute(0);
    }

    fn set_underreplicated_gauge(&self, value: u64) {
        #[allow(clippy::cast_precision_loss)]
        gauge!(UNDERREPLICATED_LEDGERS).set(value as f64);
    }
}
