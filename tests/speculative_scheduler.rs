//! End-to-end scenarios 3 and 4 of §8 for the Core B speculative
//! request scheduler: observed delays under a growing backoff capped
//! at `max`, and early termination once the executor is satisfied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ledger_auditor::domain::errors::PortError;
use ledger_auditor::domain::ports::SpeculativeRequestExecutor;
use ledger_auditor::services::{initiate_speculative_chain, Lane, SpeculativePolicy};

/// Records the instant of every call and returns a scripted outcome.
struct TimingExecutor {
    script: Vec<bool>,
    calls: AtomicU64,
    observed_at: Mutex<Vec<Instant>>,
}

impl TimingExecutor {
    fn new(script: Vec<bool>) -> Self {
        Self {
            script,
            calls: AtomicU64::new(0),
            observed_at: Mutex::new(Vec::new()),
        }
    }

    async fn call_instants(&self) -> Vec<Instant> {
        self.observed_at.lock().await.clone()
    }
}

#[async_trait]
impl SpeculativeRequestExecutor for TimingExecutor {
    async fn issue_speculative_request(&self) -> Result<bool, PortError> {
        self.observed_at.lock().await.push(Instant::now());
        let idx = self.calls.fetch_add(1, Ordering::AcqRel) as usize;
        Ok(*self.script.get(idx).unwrap_or(&false))
    }
}

/// Scenario 3: `first=100, max=400, multiplier=2`, executor always
/// returns `true`. Observed delays: 100, 200, 400, 400, 400, ...
#[tokio::test]
async fn scenario_three_delays_grow_then_cap_at_max() {
    let policy = SpeculativePolicy::new(30, 120, 2).unwrap();
    let lane = Arc::new(Lane::new("speculative-scenario-3"));
    let executor = Arc::new(TimingExecutor::new(vec![true, true, true, true, true]));

    let start = Instant::now();
    let _chain = initiate_speculative_chain(policy, lane, executor.clone());

    // first(30) + next(60) + next(120, capped) + next(120) ≈ 330ms to
    // the 4th call; pad generously for scheduler jitter.
    tokio::time::sleep(Duration::from_millis(420)).await;

    let instants = executor.call_instants().await;
    assert!(instants.len() >= 4, "expected at least 4 speculative requests, got {}", instants.len());

    let deltas: Vec<u64> = std::iter::once(start)
        .chain(instants.iter().copied())
        .collect::<Vec<_>>()
        .windows(2)
        .map(|w| (w[1] - w[0]).as_millis() as u64)
        .collect();

    // Delay 1 ~ 30ms, delay 2 ~ 60ms, delay 3 onward capped ~ 120ms.
    assert!(deltas[0] >= 20 && deltas[0] < 90, "delay 1 = {}ms", deltas[0]);
    assert!(deltas[1] >= 45 && deltas[1] < 160, "delay 2 = {}ms", deltas[1]);
    assert!(deltas[2] >= 90 && deltas[2] < 220, "delay 3 = {}ms", deltas[2]);
    assert!(deltas[3] >= 90 && deltas[3] < 220, "delay 4 = {}ms", deltas[3]);
}

/// Scenario 4: same policy; executor returns `true, true, false`.
/// Scheduled delays: 100, 200; after the `false` no further schedule,
/// the chain terminates.
#[tokio::test]
async fn scenario_four_chain_stops_after_executor_says_stop() {
    let policy = SpeculativePolicy::new(20, 200, 2).unwrap();
    let lane = Arc::new(Lane::new("speculative-scenario-4"));
    let executor = Arc::new(TimingExecutor::new(vec![true, true, false]));

    let chain = initiate_speculative_chain(policy, lane, executor.clone());

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(chain.state_is_terminated());
    assert_eq!(
        executor.call_instants().await.len(),
        3,
        "chain must stop issuing requests after the executor returns false"
    );
}
