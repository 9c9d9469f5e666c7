//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every variant is recoverable by the caller: the command is rejected and no
/// entity is changed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// The actor lacks the rights to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A state precondition failed (full party, wrong loan state, ...).
    #[error("conflict ({code}): {message}")]
    Conflict {
        /// Machine-readable reason, e.g. `party_full`.
        code: &'static str,
        /// Human-readable explanation.
        message: String,
    },

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Builds a `Conflict` error with the given reason code.
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Returns the conflict reason code, if this is a `Conflict`.
    #[must_use]
    pub fn conflict_code(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display_includes_code_and_message() {
        let err = DomainError::conflict("party_full", "party has 4 of 4 members");

        assert_eq!(
            err.to_string(),
            "conflict (party_full): party has 4 of 4 members"
        );
        assert_eq!(err.conflict_code(), Some("party_full"));
    }

    #[test]
    fn test_conflict_code_is_none_for_other_variants() {
        let err = DomainError::Validation("amount must be positive".into());

        assert_eq!(err.conflict_code(), None);
    }
}
