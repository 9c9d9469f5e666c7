//! Bounded retry of optimistic-concurrency conflicts.
//!
//! A command handler validates against the versions it loaded and commits
//! conditionally on them. When another writer got there first the whole
//! load-validate-append attempt is repeated, so the second pass validates
//! against the winner's state.

use std::future::Future;

use tracing::debug;

use crate::error::DomainError;

/// How many times a conflicting command is attempted before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5)
    }
}

/// Runs `attempt` until it succeeds, fails with anything other than
/// `DomainError::ConcurrencyConflict`, or the policy is exhausted.
///
/// # Errors
///
/// Returns the last error produced by `attempt`.
pub async fn retry_on_conflict<T, F, Fut>(policy: RetryPolicy, mut attempt: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            }) if tries < policy.max_attempts => {
                debug!(%aggregate_id, expected, actual, attempt = tries, "retrying after concurrency conflict");
                tries += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    fn conflict() -> DomainError {
        DomainError::ConcurrencyConflict {
            aggregate_id: Uuid::nil(),
            expected: 1,
            actual: 2,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_conflicts() {
        // Arrange
        let calls = AtomicU32::new(0);
        let counter = &calls;

        // Act
        let result = retry_on_conflict(RetryPolicy::new(3), || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(conflict())
            } else {
                Ok(42)
            }
        })
        .await;

        // Assert
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_when_policy_exhausted() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), DomainError> = retry_on_conflict(RetryPolicy::new(2), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(conflict())
        })
        .await;

        assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_repeat_domain_conflicts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), DomainError> = retry_on_conflict(RetryPolicy::default(), || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::conflict("party_full", "full"))
        })
        .await;

        assert_eq!(result.unwrap_err().conflict_code(), Some("party_full"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_clamps_to_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
