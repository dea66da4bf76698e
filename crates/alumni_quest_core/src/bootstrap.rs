//! crates/alumni_quest_core/src/bootstrap.rs
//!
//! Account bootstrap: make sure a `users` row exists for a signed-in identity.

use crate::domain::UserProfile;
use crate::ports::{DatabaseService, PortError, PortResult};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    Exponential { initial: Duration, max: Duration },
}

impl Backoff {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created(UserProfile),
    Found(UserProfile),
    Exhausted { attempts: u32, last_error: PortError },
}

/// Get-or-create for the `users` row of `user_id`.
///
/// A conflicting insert means another request created the row first, so it is
/// re-read. Failed attempts back off per `policy` and are retried until
/// `max_attempts` is reached.
pub async fn get_or_create_user(
    db: &dyn DatabaseService,
    user_id: &str,
    policy: &RetryPolicy,
) -> PortResult<BootstrapOutcome> {
    if let Some(user) = db.find_user(user_id).await? {
        return Ok(BootstrapOutcome::Found(user));
    }

    let blank = UserProfile::blank(user_id);
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = PortError::Unexpected("no attempt made".to_string());

    for attempt in 1..=max_attempts {
        match db.insert_user(&blank).await {
            Ok(user) => {
                info!("Created user row for {} on attempt {}", user_id, attempt);
                return Ok(BootstrapOutcome::Created(user));
            }
            Err(PortError::Conflict(msg)) => {
                match db.find_user(user_id).await {
                    Ok(Some(user)) => return Ok(BootstrapOutcome::Found(user)),
                    Ok(None) => last_error = PortError::Conflict(msg),
                    Err(e) => last_error = e,
                }
            }
            Err(e) => last_error = e,
        }

        warn!(
            "Bootstrap attempt {}/{} for {} failed: {}",
            attempt, max_attempts, user_id, last_error
        );
        if attempt < max_attempts {
            tokio::time::sleep(policy.backoff.delay_after(attempt)).await;
        }
    }

    Ok(BootstrapOutcome::Exhausted {
        attempts: max_attempts,
        last_error,
    })
}
