//! Postgres-backed turn-state store (schema and interface stubs).

use async_trait::async_trait;

use crate::core::error::SchedulerError;
use crate::core::state::TurnState;
use crate::infra::notify::Subscription;
use crate::infra::store::{Mutation, TurnStore};
use crate::util::ids::GroupId;

/// Postgres store adapter placeholder.
pub struct PostgresTurnStore;

impl PostgresTurnStore {
    /// Create a new adapter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Migration statements for the turn-state record table.
    ///
    /// One row per group; `state` carries the serialized record and `version`
    /// backs optimistic concurrency (compare-and-set on commit).
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS tl_turn_states (
    group_id TEXT PRIMARY KEY,
    state JSONB NOT NULL,
    version BIGINT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#,
        ]
    }
}

impl Default for PostgresTurnStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TurnStore for PostgresTurnStore {
    async fn read_modify_write(
        &self,
        _group: &GroupId,
        _apply: Mutation<'_>,
    ) -> Result<TurnState, SchedulerError> {
        Err(SchedulerError::StoreUnavailable(
            "postgres store not wired to database client".into(),
        ))
    }

    fn subscribe(&self, group: &GroupId) -> Subscription {
        Subscription::detached(group.clone(), uuid::Uuid::new_v4())
    }
}
