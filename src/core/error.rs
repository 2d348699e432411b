//! Error types for scheduler operations.

use thiserror::Error;

use crate::util::ids::MemberId;

/// Errors produced by scheduler components.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// Caller is not a member of the group's roster. Not retried.
    #[error("not a member of this group: {0}")]
    NotAMember(MemberId),
    /// Caller attempted to release without holding the resource. Not retried.
    #[error("not the current holder: {0}")]
    NotHolder(MemberId),
    /// Concurrent write collision on the same group's record. Retryable.
    #[error("transaction conflict, retry with backoff")]
    TransactionConflict,
    /// Store connectivity failure with context. No local state was mutated.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl SchedulerError {
    /// Whether the scheduler should retry the operation automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
