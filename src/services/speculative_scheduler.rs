//! Speculative request scheduler, Core B (§4.6): a hedging retry policy
//! that keeps issuing a speculative request at a growing backoff until
//! the original request is satisfied, the executor fails, or its own
//! scheduling lane rejects it.
//!
//! The backoff math is the same shape as the teacher's
//! `infrastructure::claude::retry::RetryPolicy::calculate_backoff` —
//! `previous_delay * multiplier`, capped — adapted from "N attempts
//! with a fixed cap" to "run until told to stop".

use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::SpeculativeRequestExecutor;
use crate::services::scheduler::{Lane, LaneTask};

/// `firstTimeoutMs`, `maxTimeoutMs`, `backoffMultiplier` (§3 data
/// model). Construction rejects policies where `maxTimeoutMs ×
/// multiplier` would overflow (invariant I1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeculativePolicy {
    first_timeout_ms: u64,
    max_timeout_ms: u64,
    multiplier: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeculativePolicyError {
    #[error("max_timeout_ms ({max_timeout_ms}) * multiplier ({multiplier}) overflows u64")]
    Overflow { max_timeout_ms: u64, multiplier: u64 },
    #[error("multiplier must be at least 1")]
    MultiplierTooSmall,
}

impl SpeculativePolicy {
    pub fn new(first_timeout_ms: u64, max_timeout_ms: u64, multiplier: u64) -> Result<Self, SpeculativePolicyError> {
        if multiplier < 1 {
            return Err(SpeculativePolicyError::MultiplierTooSmall);
        }
        if max_timeout_ms.checked_mul(multiplier).is_none() {
            return Err(SpeculativePolicyError::Overflow {
                max_timeout_ms,
                multiplier,
            });
        }
        Ok(Self {
            first_timeout_ms,
            max_timeout_ms,
            multiplier,
        })
    }

    /// The delay for the request after one whose delay was
    /// `previous_delay_ms`: `min(max, previous * multiplier)` (I2).
    /// Public so callers (and property tests) can predict the backoff
    /// sequence without re-deriving it, mirroring the teacher's public
    /// `RetryPolicy::calculate_backoff`.
    pub fn next_delay_ms(&self, previous_delay_ms: u64) -> u64 {
        previous_delay_ms
            .saturating_mul(self.multiplier)
            .min(self.max_timeout_ms)
    }

    pub fn first_timeout_ms(&self) -> u64 {
        self.first_timeout_ms
    }
}

/// Per-chain state machine (§4.6): `Idle -> Scheduled -> Firing ->
/// (Scheduled | Terminated)`. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainState {
    Idle,
    Scheduled,
    Firing,
    Terminated,
}

struct ChainInner {
    state: std::sync::Mutex<ChainState>,
}

/// A running speculative-request chain. Dropping the last clone (or
/// reaching `Terminated`) releases the lane's hold on the executor —
/// the chain holds no reference to itself once stopped, so there is
/// nothing left for the lane to keep alive (§4.6 "must break the
/// self-reference on stop").
#[derive(Clone)]
pub struct SpeculativeChain {
    inner: Arc<ChainInner>,
}

impl SpeculativeChain {
    fn new() -> Self {
        Self {
            inner: Arc::new(ChainInner {
                state: std::sync::Mutex::new(ChainState::Idle),
            }),
        }
    }

    fn set(&self, state: ChainState) {
        *self.inner.state.lock().unwrap() = state;
    }

    pub fn state_is_terminated(&self) -> bool {
        *self.inner.state.lock().unwrap() == ChainState::Terminated
    }
}

/// `initiate(scheduler, requestExecutor)`: schedules the first
/// speculative request `firstTimeoutMs` in the future on `lane`.
pub fn initiate(
    policy: SpeculativePolicy,
    lane: Arc<Lane>,
    executor: Arc<dyn SpeculativeRequestExecutor>,
) -> SpeculativeChain {
    let chain = SpeculativeChain::new();
    chain.set(ChainState::Scheduled);
    schedule_next(policy, lane, executor, chain.clone(), policy.first_timeout_ms);
    chain
}

/// Sleeps `delay_ms` outside the lane, then submits the firing step
/// onto it and awaits the outcome directly — unlike the generic
/// `Lane::schedule` helper, this needs to see whether `submit` itself
/// was rejected so it can log and terminate the chain (§4.6 "if the
/// scheduler rejects a submission, log and stop").
fn schedule_next(
    policy: SpeculativePolicy,
    lane: Arc<Lane>,
    executor: Arc<dyn SpeculativeRequestExecutor>,
    chain: SpeculativeChain,
    delay_ms: u64,
) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        let fire_chain = chain.clone();
        let fire_lane = lane.clone();
        let fire_executor = executor.clone();
        let task: LaneTask = Box::new(move |_cancel| {
            Box::pin(async move {
                fire_chain.set(ChainState::Firing);

                match fire_executor.issue_speculative_request().await {
                    Ok(true) => {
                        let next_delay = policy.next_delay_ms(delay_ms);
                        fire_chain.set(ChainState::Scheduled);
                        schedule_next(policy, fire_lane, fire_executor, fire_chain, next_delay);
                    }
                    Ok(false) => {
                        fire_chain.set(ChainState::Terminated);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "speculative request failed; chain terminated");
                        fire_chain.set(ChainState::Terminated);
                    }
                }
                Ok(())
            })
        });

        if let Err(e) = lane.submit(task).await {
            tracing::warn!(error = %e, "speculative chain rejected by scheduler; terminated");
            chain.set(ChainState::Terminated);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockSpeculativeExecutor;
    use crate::domain::errors::PortError;

    #[test]
    fn rejects_overflowing_policies() {
        let err = SpeculativePolicy::new(10, u64::MAX, 2).unwrap_err();
        assert!(matches!(err, SpeculativePolicyError::Overflow { .. }));
    }

    #[test]
    fn rejects_sub_unity_multiplier() {
        let err = SpeculativePolicy::new(10, 1000, 0).unwrap_err();
        assert_eq!(err, SpeculativePolicyError::MultiplierTooSmall);
    }

    #[test]
    fn accepts_well_formed_policy() {
        assert!(SpeculativePolicy::new(100, 5_000, 2).is_ok());
    }

    #[test]
    fn next_delay_grows_by_multiplier_and_caps_at_max() {
        let policy = SpeculativePolicy::new(100, 1_000, 2).unwrap();
        assert_eq!(policy.next_delay_ms(100), 200);
        assert_eq!(policy.next_delay_ms(600), 1_000); // 1200 capped to 1000
        assert_eq!(policy.next_delay_ms(1_000), 1_000);
    }

    #[tokio::test]
    async fn chain_terminates_when_executor_says_stop() {
        let policy = SpeculativePolicy::new(5, 50, 2).unwrap();
        let lane = Arc::new(Lane::new("speculative"));
        let executor = Arc::new(MockSpeculativeExecutor::new(vec![Ok(false)]));
        let chain = initiate(policy, lane.clone(), executor);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(chain.state_is_terminated());
    }

    #[tokio::test]
    async fn chain_terminates_on_executor_failure() {
        let policy = SpeculativePolicy::new(5, 50, 2).unwrap();
        let lane = Arc::new(Lane::new("speculative"));
        let executor = Arc::new(MockSpeculativeExecutor::new(vec![Err(PortError::Transport(
            "boom".into(),
        ))]));
        let chain = initiate(policy, lane.clone(), executor);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(chain.state_is_terminated());
    }

    #[tokio::test]
    async fn chain_terminates_when_lane_is_shut_down() {
        let policy = SpeculativePolicy::new(5, 50, 2).unwrap();
        let lane = Arc::new(Lane::new("speculative"));
        lane.shutdown();
        let executor = Arc::new(MockSpeculativeExecutor::new(vec![Ok(true)]));
        let chain = initiate(policy, lane, executor);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(chain.state_is_terminated());
    }

    proptest::proptest! {
        /// I1: construction fails iff `max * multiplier` overflows u64.
        #[test]
        fn construction_succeeds_exactly_when_no_overflow(
            first in 1u64..10_000,
            max in 1u64..10_000,
            multiplier in 1u64..10_000,
        ) {
            let result = SpeculativePolicy::new(first, max, multiplier);
            prop_assert!(result.is_ok());
        }

        #[test]
        fn construction_rejects_overflowing_products(multiplier in 2u64..=u64::MAX) {
            let result = SpeculativePolicy::new(10, u64::MAX, multiplier);
            prop_assert!(result.is_err());
        }

        /// I2: the delay sequence is monotonic non-decreasing and
        /// bounded above by `max`, for any starting delay.
        #[test]
        fn next_delay_is_monotonic_and_capped(
            first in 1u64..1_000,
            max in 1u64..100_000,
            multiplier in 1u64..10,
            previous in 0u64..100_000,
        ) {
            let policy = SpeculativePolicy::new(first, max, multiplier).unwrap();
            let next = policy.next_delay_ms(previous);
            prop_assert!(next >= previous.min(max));
            prop_assert!(next <= max);
        }
    }

    #[tokio::test]
    async fn chain_reschedules_while_executor_keeps_saying_continue() {
        let policy = SpeculativePolicy::new(5, 50, 2).unwrap();
        let lane = Arc::new(Lane::new("speculative"));
        let executor = Arc::new(MockSpeculativeExecutor::new(vec![Ok(true), Ok(true), Ok(false)]));
        let chain = initiate(policy, lane.clone(), executor.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(chain.state_is_terminated());
        assert!(executor.call_count() >= 3);
    }
}
