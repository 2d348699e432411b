//! In-memory turn-state store for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::error::SchedulerError;
use crate::core::state::TurnState;
use crate::infra::notify::{ChangeNotifier, Subscription};
use crate::infra::store::{Mutation, TurnStore};
use crate::util::ids::GroupId;

struct Record {
    state: TurnState,
    version: u64,
}

/// In-memory store keeping one versioned record per group.
///
/// Transactions are serialized per group by holding the record lock across
/// the mutation closure, and commits publish to the notifier under that same
/// lock so subscribers observe states in commit order. Different groups use
/// different locks and never contend.
pub struct InMemoryTurnStore {
    records: Mutex<HashMap<GroupId, Arc<Mutex<Record>>>>,
    notifier: ChangeNotifier,
}

impl InMemoryTurnStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            notifier: ChangeNotifier::new(),
        }
    }

    fn record(&self, group: &GroupId) -> Arc<Mutex<Record>> {
        Arc::clone(
            self.records
                .lock()
                .entry(group.clone())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(Record {
                        state: TurnState::default(),
                        version: 0,
                    }))
                }),
        )
    }

    /// Snapshot of the current state for `group`.
    #[must_use]
    pub fn snapshot(&self, group: &GroupId) -> TurnState {
        self.record(group).lock().state.clone()
    }

    /// Commit count for `group`, for tests and diagnostics.
    #[must_use]
    pub fn version(&self, group: &GroupId) -> u64 {
        self.record(group).lock().version
    }
}

impl Default for InMemoryTurnStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn read_modify_write(
        &self,
        group: &GroupId,
        apply: Mutation<'_>,
    ) -> Result<TurnState, SchedulerError> {
        let record = self.record(group);
        let mut guard = record.lock();

        let mut next = guard.state.clone();
        apply(&mut next)?;

        if next != guard.state {
            guard.state = next.clone();
            guard.version += 1;
            tracing::debug!(group = %group, version = guard.version, "committed turn state");
            // Publish while the record lock still serializes commits.
            self.notifier.publish(group, &next);
        }
        Ok(next)
    }

    fn subscribe(&self, group: &GroupId) -> Subscription {
        let record = self.record(group);
        // Register under the record lock so no commit lands between reading
        // the current value and opening the channel.
        let guard = record.lock();
        self.notifier.subscribe(group, guard.state.clone())
    }
}
