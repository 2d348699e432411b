//! Integration tests for the expiry watcher against the in-memory store.
//!
//! These run in real time with short holding periods, polling for the
//! transitions the watcher is expected to trigger.

use std::sync::Arc;
use std::time::Duration;

use turnlock::config::RetryPolicy;
use turnlock::core::{InMemoryRoster, Member, TurnScheduler};
use turnlock::infra::store::memory::InMemoryTurnStore;
use turnlock::runtime::spawn_expiry_watcher;
use turnlock::util::clock::now_ms;
use turnlock::util::ids::{GroupId, MemberId};

const SHORT_HOLD: Duration = Duration::from_millis(150);

fn setup(members: &[&str]) -> (Arc<TurnScheduler<InMemoryTurnStore, InMemoryRoster>>, GroupId) {
    let group = GroupId::new("flat-3b");
    let roster = Arc::new(InMemoryRoster::new());
    for id in members {
        roster.add_member(&group, Member::new(*id, id.to_uppercase()));
    }
    let store = Arc::new(InMemoryTurnStore::new());
    let scheduler = Arc::new(TurnScheduler::new(store, roster, RetryPolicy::default()));
    (scheduler, group)
}

fn id(s: &str) -> MemberId {
    MemberId::new(s)
}

async fn wait_for<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_watcher_fires_expiry_and_rearms_for_promoted_holder() {
    let (scheduler, group) = setup(&["a", "b"]);
    let _watcher = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);

    scheduler
        .acquire(&group, &id("a"), SHORT_HOLD, now_ms())
        .await
        .unwrap();
    scheduler
        .acquire(&group, &id("b"), SHORT_HOLD, now_ms())
        .await
        .unwrap();

    // a expires and b is promoted without anyone calling release.
    let store = Arc::clone(scheduler.store());
    assert!(
        wait_for(|| store.snapshot(&group).is_holder(&id("b"))).await,
        "watcher did not promote the queue head on expiry"
    );

    // The watcher re-armed for b's fresh expiry and clears the slot too.
    assert!(
        wait_for(|| store.snapshot(&group).holder.is_none()).await,
        "watcher did not fire for the promoted holder"
    );

    let state = store.snapshot(&group);
    assert_eq!(state.usage_of(&id("a")), 1);
    assert_eq!(state.usage_of(&id("b")), 1);
}

#[tokio::test]
async fn test_cancelled_watcher_stops_firing() {
    let (scheduler, group) = setup(&["a"]);
    let watcher = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);
    watcher.cancel();

    scheduler
        .acquire(&group, &id("a"), SHORT_HOLD, now_ms())
        .await
        .unwrap();

    // Give a live watcher ample time to have fired.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let state = scheduler.store().snapshot(&group);
    assert!(state.is_holder(&id("a")), "cancelled watcher still fired");
    assert_eq!(state.usage_of(&id("a")), 0);
}

#[tokio::test]
async fn test_voluntary_release_clears_timer_without_expiry() {
    let (scheduler, group) = setup(&["a"]);
    let _watcher = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);

    // Long hold, released almost immediately: the timer must be cleared, not
    // fired, and usage counted once for the voluntary release alone.
    let hold = Duration::from_secs(600);
    scheduler.acquire(&group, &id("a"), hold, now_ms()).await.unwrap();
    scheduler.release(&group, &id("a"), hold, now_ms()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = scheduler.store().snapshot(&group);
    assert!(state.holder.is_none());
    assert_eq!(state.usage_of(&id("a")), 1);
}

#[tokio::test]
async fn test_multiple_watchers_race_without_double_counting() {
    let (scheduler, group) = setup(&["a", "b", "c"]);
    let _w1 = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);
    let _w2 = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);
    let _w3 = spawn_expiry_watcher(Arc::clone(&scheduler), group.clone(), SHORT_HOLD);

    scheduler
        .acquire(&group, &id("a"), SHORT_HOLD, now_ms())
        .await
        .unwrap();

    let store = Arc::clone(scheduler.store());
    assert!(wait_for(|| store.snapshot(&group).holder.is_none()).await);
    // Three racing watchers, one holding period, one increment.
    assert_eq!(store.snapshot(&group).usage_of(&id("a")), 1);
}
