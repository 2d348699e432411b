//! API-facing view models for the UI collaborator.
//!
//! The scheduler defines no wire protocol of its own; these are the
//! serializable shapes a client renders from pushed turn states.

use serde::{Deserialize, Serialize};

use crate::core::state::TurnState;
use crate::util::ids::MemberId;

/// Current holder as rendered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderView {
    /// Holder's member id.
    pub member_id: MemberId,
    /// Holder's display name.
    pub display_name: String,
    /// When the holding period started (ms since epoch).
    pub acquired_at_ms: u128,
    /// When the holding period ends (ms since epoch).
    pub expires_at_ms: u128,
    /// Time left on the clock, zero once expired.
    pub remaining_ms: u128,
}

/// A waiting member as rendered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntryView {
    /// Waiter's member id.
    pub member_id: MemberId,
    /// Waiter's display name.
    pub display_name: String,
    /// 1-based position in the line.
    pub position: usize,
    /// When the member joined the queue (ms since epoch).
    pub enqueued_at_ms: u128,
}

/// Turn state as rendered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStateView {
    /// Current holder, if any.
    pub holder: Option<HolderView>,
    /// Waiting line, head first.
    pub queue: Vec<QueueEntryView>,
}

impl TurnStateView {
    /// Whether `member` appears anywhere in the view.
    ///
    /// A client whose own id disappears from here while the roster also
    /// dropped it should treat that as "removed while holding/queued".
    #[must_use]
    pub fn contains(&self, member: &MemberId) -> bool {
        self.holder.as_ref().is_some_and(|h| &h.member_id == member)
            || self.queue.iter().any(|e| &e.member_id == member)
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Render a committed turn state for display at `now_ms`.
#[must_use]
pub fn view_state(state: &TurnState, now_ms: u128) -> TurnStateView {
    TurnStateView {
        holder: state.holder.as_ref().map(|h| HolderView {
            member_id: h.member.id.clone(),
            display_name: h.member.display_name.clone(),
            acquired_at_ms: h.acquired_at_ms,
            expires_at_ms: h.expires_at_ms,
            remaining_ms: h.expires_at_ms.saturating_sub(now_ms),
        }),
        queue: state
            .queue
            .iter()
            .enumerate()
            .map(|(i, e)| QueueEntryView {
                member_id: e.member.id.clone(),
                display_name: e.member.display_name.clone(),
                position: i + 1,
                enqueued_at_ms: e.enqueued_at_ms,
            })
            .collect(),
    }
}

/// Return a health payload.
#[must_use]
pub const fn health() -> Health {
    Health { ok: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Member;
    use std::time::Duration;

    #[test]
    fn test_view_positions_and_remaining() {
        let mut s = TurnState::default();
        s.seat_holder(Member::new("a", "Alice"), Duration::from_secs(600), 1_000);
        s.enqueue(Member::new("b", "Bob"), 1_100);
        s.enqueue(Member::new("c", "Cleo"), 1_200);

        let view = view_state(&s, 101_000);
        let holder = view.holder.as_ref().unwrap();
        assert_eq!(holder.remaining_ms, 500_000);
        assert_eq!(view.queue[0].position, 1);
        assert_eq!(view.queue[1].position, 2);
        assert!(view.contains(&"b".into()));
        assert!(!view.contains(&"z".into()));
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let mut s = TurnState::default();
        s.seat_holder(Member::new("a", "Alice"), Duration::from_secs(1), 0);
        let view = view_state(&s, 10_000);
        assert_eq!(view.holder.unwrap().remaining_ms, 0);
    }
}
