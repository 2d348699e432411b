//! Turn-state store backends.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTurnStore;
pub use postgres::PostgresTurnStore;

use async_trait::async_trait;

use crate::core::error::SchedulerError;
use crate::core::state::TurnState;
use crate::infra::notify::Subscription;
use crate::util::ids::GroupId;

/// Transactional mutation applied to a group's current turn state.
///
/// The closure observes the freshest committed state and either produces the
/// fully-updated next state in place, or returns an error to abort with the
/// prior state untouched. Outcomes are smuggled out through captures.
pub type Mutation<'a> = &'a mut (dyn FnMut(&mut TurnState) -> Result<(), SchedulerError> + Send);

/// Document-store collaborator: one atomically-updatable record per group.
#[async_trait]
pub trait TurnStore: Send + Sync + 'static {
    /// Atomically read-modify-write the record for `group`.
    ///
    /// The store applies `apply` to the current value and commits the result
    /// only when the closure succeeds and actually changed the state;
    /// unchanged results are not re-committed and not re-published. Fails
    /// with [`SchedulerError::TransactionConflict`] when atomicity cannot be
    /// guaranteed under contention (callers retry with backoff) and
    /// [`SchedulerError::StoreUnavailable`] on connectivity failure.
    ///
    /// Records for unknown groups materialize as the empty state.
    ///
    /// Returns the state as of the end of the transaction.
    async fn read_modify_write(
        &self,
        group: &GroupId,
        apply: Mutation<'_>,
    ) -> Result<TurnState, SchedulerError>;

    /// Subscribe to committed states for `group`.
    ///
    /// Delivers the current value immediately, then every subsequent commit
    /// in commit order.
    fn subscribe(&self, group: &GroupId) -> Subscription;
}
