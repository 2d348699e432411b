//! Change fan-out: deliver every committed turn state to subscribers.
//!
//! Delivery is per group, in commit order, at-least-once. Subscribers that
//! fall behind are resynchronized from the oldest retained commit rather than
//! seeing reordered values. Cancellation stops delivery; dropping the
//! subscription has the same effect.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::core::state::TurnState;
use crate::util::ids::GroupId;

/// Commits buffered per subscriber before lagged resync kicks in.
const CHANNEL_CAPACITY: usize = 256;

/// Fan-out of committed `TurnState` values to all subscribers of a group.
pub struct ChangeNotifier {
    channels: Mutex<HashMap<GroupId, broadcast::Sender<TurnState>>>,
}

impl ChangeNotifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Publish a committed state to all current subscribers of `group`.
    ///
    /// Callers must publish while still serializing commits for the group,
    /// otherwise the commit-order delivery guarantee is lost.
    pub fn publish(&self, group: &GroupId, state: &TurnState) {
        let channels = self.channels.lock();
        if let Some(sender) = channels.get(group) {
            // Send fails only when no subscriber is listening; that is fine.
            let _ = sender.send(state.clone());
        }
    }

    /// Open a subscription for `group`, seeded with the current state so the
    /// subscriber observes the latest value immediately.
    pub fn subscribe(&self, group: &GroupId, current: TurnState) -> Subscription {
        let mut channels = self.channels.lock();
        let sender = channels
            .entry(group.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Subscription {
            id: uuid::Uuid::new_v4(),
            group: group.clone(),
            pending: Some(current),
            rx: Some(sender.subscribe()),
        }
    }

    /// Number of live subscribers for `group`.
    #[must_use]
    pub fn subscriber_count(&self, group: &GroupId) -> usize {
        self.channels
            .lock()
            .get(group)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Long-lived, cancellable registration for one group's state changes.
pub struct Subscription {
    id: uuid::Uuid,
    group: GroupId,
    pending: Option<TurnState>,
    rx: Option<broadcast::Receiver<TurnState>>,
}

impl Subscription {
    /// A subscription that never delivers anything, for backends without a
    /// wired push channel.
    #[must_use]
    pub const fn detached(group: GroupId, id: uuid::Uuid) -> Self {
        Self {
            id,
            group,
            pending: None,
            rx: None,
        }
    }

    /// Unique id of this registration.
    #[must_use]
    pub const fn id(&self) -> uuid::Uuid {
        self.id
    }

    /// Group this subscription is scoped to.
    #[must_use]
    pub const fn group(&self) -> &GroupId {
        &self.group
    }

    /// Receive the next state, in commit order.
    ///
    /// The first call yields the state current at subscription time. Returns
    /// `None` once the subscription is cancelled or the notifier is gone.
    pub async fn recv(&mut self) -> Option<TurnState> {
        if let Some(seed) = self.pending.take() {
            return Some(seed);
        }
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(state) => return Some(state),
                // Fell behind: the channel resyncs to the oldest retained
                // commit, preserving order. Keep receiving.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        group = %self.group,
                        skipped,
                        "subscriber lagged, resyncing from retained commits"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop delivery. Further `recv` calls return `None`.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_usage(n: u64) -> TurnState {
        let mut s = TurnState::default();
        if n > 0 {
            s.usage.insert("a".into(), n);
        }
        s
    }

    #[tokio::test]
    async fn test_subscriber_sees_current_then_commits() {
        let notifier = ChangeNotifier::new();
        let group = GroupId::new("g");

        let mut sub = notifier.subscribe(&group, state_with_usage(0));
        notifier.publish(&group, &state_with_usage(1));
        notifier.publish(&group, &state_with_usage(2));

        assert_eq!(sub.recv().await.unwrap(), state_with_usage(0));
        assert_eq!(sub.recv().await.unwrap(), state_with_usage(1));
        assert_eq!(sub.recv().await.unwrap(), state_with_usage(2));
    }

    #[tokio::test]
    async fn test_cancel_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let group = GroupId::new("g");

        let mut sub = notifier.subscribe(&group, state_with_usage(0));
        sub.cancel();
        notifier.publish(&group, &state_with_usage(1));
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let notifier = ChangeNotifier::new();
        let g1 = GroupId::new("g1");
        let g2 = GroupId::new("g2");

        let mut sub1 = notifier.subscribe(&g1, state_with_usage(0));
        let _sub2 = notifier.subscribe(&g2, state_with_usage(0));
        notifier.publish(&g2, &state_with_usage(9));

        // g1 subscriber only ever sees its seed.
        assert_eq!(sub1.recv().await.unwrap(), state_with_usage(0));
        assert_eq!(notifier.subscriber_count(&g1), 1);
    }
}
