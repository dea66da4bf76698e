//! crates/alumni_quest_core/src/settlement.rs
//!
//! Simulated acceptance of a confirmed proof: after a fixed delay the flow is
//! closed. Nothing is persisted here.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SETTLEMENT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettlementState {
    Idle,
    Pending { deadline: Instant },
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// The delay elapsed; the caller should be closed now.
    Settled,
    /// The flow went away first.
    Abandoned,
    /// Settlement was never started or has already completed.
    Inactive,
}

/// Tracks a single settlement so the close signal fires at most once.
#[derive(Debug)]
pub struct Settlement {
    delay: Duration,
    state: SettlementState,
}

impl Settlement {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: SettlementState::Idle,
        }
    }

    /// Starts the delay. Returns `false` for every call after the first.
    pub fn begin(&mut self) -> bool {
        match self.state {
            SettlementState::Idle => {
                self.state = SettlementState::Pending {
                    deadline: Instant::now() + self.delay,
                };
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SettlementState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.state == SettlementState::Settled
    }

    /// Marks the settlement done. Returns `true` exactly once.
    pub fn complete(&mut self) -> bool {
        match self.state {
            SettlementState::Pending { .. } => {
                self.state = SettlementState::Settled;
                true
            }
            _ => false,
        }
    }

    /// Waits out the pending delay unless `cancel` fires first.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> SettlementOutcome {
        let Some(deadline) = self.deadline() else {
            return SettlementOutcome::Inactive;
        };
        tokio::select! {
            _ = cancel.cancelled() => SettlementOutcome::Abandoned,
            _ = tokio::time::sleep_until(deadline) => {
                if self.complete() {
                    SettlementOutcome::Settled
                } else {
                    SettlementOutcome::Inactive
                }
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn settles_once_after_the_delay() {
        let mut settlement = Settlement::new(DEFAULT_SETTLEMENT_DELAY);
        let cancel = CancellationToken::new();
        let started = Instant::now();

        assert!(settlement.begin());
        assert!(!settlement.begin());
        assert!(!settlement.begin());

        assert_eq!(settlement.wait(&cancel).await, SettlementOutcome::Settled);
        assert!(started.elapsed() >= DEFAULT_SETTLEMENT_DELAY);
        assert!(settlement.is_settled());

        assert_eq!(settlement.wait(&cancel).await, SettlementOutcome::Inactive);
        assert!(!settlement.complete());
        assert!(!settlement.begin());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_abandons_the_wait() {
        let mut settlement = Settlement::new(DEFAULT_SETTLEMENT_DELAY);
        let cancel = CancellationToken::new();
        settlement.begin();
        cancel.cancel();
        assert_eq!(settlement.wait(&cancel).await, SettlementOutcome::Abandoned);
        assert!(!settlement.is_settled());
    }

    #[tokio::test]
    async fn wait_without_begin_is_inactive() {
        let mut settlement = Settlement::new(Duration::from_millis(1));
        assert_eq!(
            settlement.wait(&CancellationToken::new()).await,
            SettlementOutcome::Inactive
        );
    }
}
