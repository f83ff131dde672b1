//! Metrics surface port (§6 metrics surface).
//!
//! Every external-facing concern in the teacher crate sits behind a
//! port trait (`AgentRepository`, `MemoryRepository`, ...); the two
//! named instruments from §6 get the same treatment here so
//! `services/` never depends on a concrete metrics backend.

pub trait MetricsSink: Send + Sync {
    /// Increment `published_underreplicated_ledgers` by `by`.
    fn incr_published_underreplicated(&self, by: u64);

    /// Reset `published_underreplicated_ledgers` to zero. Called at the
    /// start of every bookie audit cycle (invariant 3 of §3).
    fn reset_published_underreplicated(&self);

    /// Set `underreplicated_ledgers` to the size of the latest
    /// snapshot (§4.4).
    fn set_underreplicated_gauge(&self, value: u64);
}
