//! Client-local expiry watcher.
//!
//! Each client runs its own watcher per group: a single-shot timer armed from
//! the holder's expiry timestamp, re-armed whenever a delivered state carries
//! a different expiry, and cleared (not fired) when the holder goes away. On
//! firing it calls `expire_and_promote`, relying on that operation's
//! idempotence rather than any cross-client coordination - the watcher is a
//! best-effort trigger, never the source of truth.

use std::sync::Arc;
use std::time::Duration;

use crate::core::roster::Roster;
use crate::core::scheduler::TurnScheduler;
use crate::infra::store::TurnStore;
use crate::util::clock::now_ms;
use crate::util::ids::GroupId;

/// Handle to a running watcher. Cancelling (or dropping) aborts the watcher
/// task, which releases its store subscription and any armed timer.
pub struct WatcherHandle {
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop the watcher.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the watcher loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn an expiry watcher for `group`.
///
/// `hold` is the holding period granted to members promoted by the expiry
/// path. The watcher exits on its own when the subscription closes.
pub fn spawn_expiry_watcher<S, R>(
    scheduler: Arc<TurnScheduler<S, R>>,
    group: GroupId,
    hold: Duration,
) -> WatcherHandle
where
    S: TurnStore,
    R: Roster,
{
    let mut sub = scheduler.store().subscribe(&group);
    let task = tokio::spawn(async move {
        // Expiry timestamp the timer is currently armed for.
        let mut armed: Option<u128> = None;
        loop {
            tokio::select! {
                state = sub.recv() => {
                    let Some(state) = state else { break };
                    let expiry = state.holder.as_ref().map(|h| h.expires_at_ms);
                    if expiry != armed {
                        armed = expiry;
                        match armed {
                            Some(at) => tracing::debug!(group = %group, expires_at_ms = at, "armed expiry timer"),
                            None => tracing::debug!(group = %group, "cleared expiry timer"),
                        }
                    }
                }
                () = sleep_until_ms(armed.unwrap_or(0)), if armed.is_some() => {
                    armed = None;
                    if let Err(e) = scheduler.expire_and_promote(&group, hold, now_ms()).await {
                        tracing::warn!(group = %group, error = %e, "expiry trigger failed");
                    }
                }
            }
        }
        tracing::debug!(group = %group, "expiry watcher stopped");
    });
    WatcherHandle { task }
}

async fn sleep_until_ms(deadline_ms: u128) {
    let wait = deadline_ms.saturating_sub(now_ms());
    let wait = u64::try_from(wait).unwrap_or(u64::MAX);
    tokio::time::sleep(Duration::from_millis(wait)).await;
}
