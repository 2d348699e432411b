//! Turn state: the single atomically-updatable record per group.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::ids::MemberId;

/// A member eligible to use the group's resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier within the group.
    pub id: MemberId,
    /// Name shown to other members.
    pub display_name: String,
}

impl Member {
    /// Create a member record.
    pub fn new(id: impl Into<MemberId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The member currently occupying the resource.
///
/// At most one holder exists per group at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    /// The occupying member.
    pub member: Member,
    /// When the holding period started (ms since epoch).
    pub acquired_at_ms: u128,
    /// When the holding period ends (ms since epoch).
    pub expires_at_ms: u128,
}

/// A member waiting for the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitEntry {
    /// The waiting member.
    pub member: Member,
    /// When the member joined the queue (ms since epoch).
    pub enqueued_at_ms: u128,
}

/// Role a member occupies after an acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Currently occupying the resource.
    Holder,
    /// Waiting in the FIFO queue.
    Queued,
}

/// Outcome of an acquire: the caller's role and, if queued, the 1-based
/// position in the waiting line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireOutcome {
    /// Role granted (or confirmed, when the call was an idempotent repeat).
    pub role: Role,
    /// 1-based queue position; `None` for the holder.
    pub position: Option<usize>,
}

/// Full mutable turn state for one group.
///
/// Persisted as a single record keyed by group id and mutated only through
/// `TurnScheduler` operations. Queue order is strictly FIFO by enqueue time,
/// ties broken by insertion order; there is no priority, per-member quota, or
/// anti-starvation beyond that ordering.
///
/// Usage counters live inside the record so their at-most-once increment per
/// holding period rides the same atomic commit that clears or promotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Current holder, if any.
    pub holder: Option<Holder>,
    /// Members waiting, head first.
    pub queue: Vec<WaitEntry>,
    /// Completed holding periods per member (informational).
    pub usage: BTreeMap<MemberId, u64>,
}

impl TurnState {
    /// Whether `member` is the current holder.
    #[must_use]
    pub fn is_holder(&self, member: &MemberId) -> bool {
        self.holder.as_ref().is_some_and(|h| &h.member.id == member)
    }

    /// 1-based queue position of `member`, if waiting.
    #[must_use]
    pub fn queue_position(&self, member: &MemberId) -> Option<usize> {
        self.queue
            .iter()
            .position(|e| &e.member.id == member)
            .map(|i| i + 1)
    }

    /// Whether `member` appears anywhere in holder or queue.
    #[must_use]
    pub fn contains(&self, member: &MemberId) -> bool {
        self.is_holder(member) || self.queue_position(member).is_some()
    }

    /// Role and position of `member`, if present.
    #[must_use]
    pub fn role_of(&self, member: &MemberId) -> Option<AcquireOutcome> {
        if self.is_holder(member) {
            return Some(AcquireOutcome {
                role: Role::Holder,
                position: None,
            });
        }
        self.queue_position(member).map(|position| AcquireOutcome {
            role: Role::Queued,
            position: Some(position),
        })
    }

    /// Seat `member` as holder for `hold` starting at `now_ms`.
    pub fn seat_holder(&mut self, member: Member, hold: Duration, now_ms: u128) {
        self.holder = Some(Holder {
            member,
            acquired_at_ms: now_ms,
            expires_at_ms: now_ms + hold.as_millis(),
        });
    }

    /// Append `member` to the queue tail and return the 1-based position.
    ///
    /// Callers must have checked `contains` first; this method does not
    /// deduplicate.
    pub fn enqueue(&mut self, member: Member, now_ms: u128) -> usize {
        self.queue.push(WaitEntry {
            member,
            enqueued_at_ms: now_ms,
        });
        self.queue.len()
    }

    /// Remove `member` from the queue if present, preserving relative order
    /// of the remaining entries. Returns whether an entry was removed.
    pub fn remove_from_queue(&mut self, member: &MemberId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| &e.member.id != member);
        self.queue.len() < before
    }

    /// Clear the holder and promote the queue head, if any, with a fresh
    /// expiry of `now_ms + hold`. Returns the promoted member.
    ///
    /// This is the single promotion step shared by release, expiry, and
    /// holder removal; promotion is never a separate, later commit.
    pub fn clear_and_promote(&mut self, hold: Duration, now_ms: u128) -> Option<Member> {
        self.holder = None;
        if self.queue.is_empty() {
            return None;
        }
        let next = self.queue.remove(0);
        self.seat_holder(next.member.clone(), hold, now_ms);
        Some(next.member)
    }

    /// Count one completed holding period for `member`.
    pub fn record_usage(&mut self, member: &MemberId) {
        *self.usage.entry(member.clone()).or_insert(0) += 1;
    }

    /// Completed holding periods for `member`.
    #[must_use]
    pub fn usage_of(&self, member: &MemberId) -> u64 {
        self.usage.get(member).copied().unwrap_or(0)
    }
}
