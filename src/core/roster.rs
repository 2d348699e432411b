//! Group roster: the authoritative membership set per group.
//!
//! The scheduler never decides membership. It only consults the roster to
//! validate callers and consumes removal events so departed members are
//! scrubbed from the turn state.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::core::error::SchedulerError;
use crate::core::state::Member;
use crate::util::ids::{GroupId, MemberId};

/// A membership change observed on the roster.
#[derive(Debug, Clone)]
pub enum RosterEvent {
    /// A member joined a group.
    Joined {
        /// Group joined.
        group: GroupId,
        /// The new member.
        member: Member,
    },
    /// A member was kicked or left a group.
    Removed {
        /// Group left.
        group: GroupId,
        /// The departed member.
        member: MemberId,
    },
}

/// Abstraction over the membership source of truth.
#[async_trait]
pub trait Roster: Send + Sync + 'static {
    /// Look up `member` in `group`, returning the full record if present.
    async fn member(
        &self,
        group: &GroupId,
        member: &MemberId,
    ) -> Result<Option<Member>, SchedulerError>;

    /// Subscribe to membership-change events.
    fn events(&self) -> broadcast::Receiver<RosterEvent>;
}

/// In-memory roster for development and testing.
pub struct InMemoryRoster {
    groups: Mutex<HashMap<GroupId, HashMap<MemberId, Member>>>,
    events: broadcast::Sender<RosterEvent>,
}

impl InMemoryRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            groups: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Add `member` to `group`, replacing any record with the same id.
    pub fn add_member(&self, group: &GroupId, member: Member) {
        self.groups
            .lock()
            .entry(group.clone())
            .or_default()
            .insert(member.id.clone(), member.clone());
        let _ = self.events.send(RosterEvent::Joined {
            group: group.clone(),
            member,
        });
    }

    /// Remove `member` from `group`. Emits a removal event even when the
    /// member was already gone, since callers treat the cascade as idempotent.
    pub fn remove_member(&self, group: &GroupId, member: &MemberId) {
        if let Some(members) = self.groups.lock().get_mut(group) {
            members.remove(member);
        }
        let _ = self.events.send(RosterEvent::Removed {
            group: group.clone(),
            member: member.clone(),
        });
    }

    /// Number of members currently in `group`.
    #[must_use]
    pub fn len(&self, group: &GroupId) -> usize {
        self.groups.lock().get(group).map_or(0, HashMap::len)
    }

    /// Whether `group` has no members.
    #[must_use]
    pub fn is_empty(&self, group: &GroupId) -> bool {
        self.len(group) == 0
    }
}

impl Default for InMemoryRoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Roster for InMemoryRoster {
    async fn member(
        &self,
        group: &GroupId,
        member: &MemberId,
    ) -> Result<Option<Member>, SchedulerError> {
        Ok(self
            .groups
            .lock()
            .get(group)
            .and_then(|members| members.get(member))
            .cloned())
    }

    fn events(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_lookup() {
        let roster = InMemoryRoster::new();
        let group = GroupId::new("g1");
        roster.add_member(&group, Member::new("a", "Alice"));

        let found = roster.member(&group, &"a".into()).await.unwrap();
        assert_eq!(found.unwrap().display_name, "Alice");
        assert!(roster.member(&group, &"b".into()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_removal_emits_event() {
        let roster = InMemoryRoster::new();
        let group = GroupId::new("g1");
        roster.add_member(&group, Member::new("a", "Alice"));

        let mut events = roster.events();
        roster.remove_member(&group, &"a".into());

        match events.recv().await.unwrap() {
            RosterEvent::Removed { group: g, member } => {
                assert_eq!(g, group);
                assert_eq!(member, "a".into());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(roster.is_empty(&group));
    }
}
