//! Benchmarks for the turn scheduler.
//!
//! Benchmarks cover:
//! - Raw turn-state mutations (enqueue/promote)
//! - Full acquire/release cycles through the store
//! - Contended acquires across many members

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use turnlock::config::RetryPolicy;
use turnlock::core::{InMemoryRoster, Member, TurnScheduler, TurnState};
use turnlock::infra::store::memory::InMemoryTurnStore;
use turnlock::util::clock::now_ms;
use turnlock::util::ids::{GroupId, MemberId};

use tokio::runtime::Runtime;

const HOLD: Duration = Duration::from_secs(600);

fn build_scheduler(
    group: &GroupId,
    member_count: u64,
) -> Arc<TurnScheduler<InMemoryTurnStore, InMemoryRoster>> {
    let roster = Arc::new(InMemoryRoster::new());
    for i in 0..member_count {
        roster.add_member(group, Member::new(format!("m{i}"), format!("Member {i}")));
    }
    Arc::new(TurnScheduler::new(
        Arc::new(InMemoryTurnStore::new()),
        roster,
        RetryPolicy::default(),
    ))
}

// ============================================================================
// Turn-State Benchmarks
// ============================================================================

fn bench_state_enqueue_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_enqueue_promote");

    for size in [10u64, 100, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut state = TurnState::default();
                state.seat_holder(Member::new("m0", "Member 0"), HOLD, 0);
                for i in 1..size {
                    state.enqueue(Member::new(format!("m{i}"), format!("Member {i}")), i.into());
                }
                while state.holder.is_some() {
                    black_box(state.clear_and_promote(HOLD, 1_000));
                }
                black_box(state);
            });
        });
    }
    group.finish();
}

// ============================================================================
// Scheduler Benchmarks (Async)
// ============================================================================

fn bench_acquire_release_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_release_cycle");

    for cycles in [10u64, 100] {
        group.throughput(Throughput::Elements(cycles));
        group.bench_with_input(
            BenchmarkId::from_parameter(cycles),
            &cycles,
            |b, &cycles| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let gid = GroupId::new("bench-group");
                    let scheduler = build_scheduler(&gid, 1);
                    let member = MemberId::new("m0");
                    for _ in 0..cycles {
                        let outcome = scheduler
                            .acquire(&gid, &member, HOLD, now_ms())
                            .await
                            .unwrap();
                        black_box(outcome);
                        scheduler.release(&gid, &member, HOLD, now_ms()).await.unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_contended_acquires(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_acquires");

    for members in [8u64, 32] {
        group.throughput(Throughput::Elements(members));
        group.bench_with_input(
            BenchmarkId::from_parameter(members),
            &members,
            |b, &members| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let gid = GroupId::new("bench-group");
                    let scheduler = build_scheduler(&gid, members);

                    let mut handles = Vec::new();
                    for i in 0..members {
                        let scheduler = Arc::clone(&scheduler);
                        let gid = gid.clone();
                        handles.push(tokio::spawn(async move {
                            let member = MemberId::new(format!("m{i}"));
                            scheduler.acquire(&gid, &member, HOLD, now_ms()).await
                        }));
                    }
                    for h in handles {
                        black_box(h.await.unwrap().unwrap());
                    }
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(state_benches, bench_state_enqueue_promote);

criterion_group!(
    scheduler_benches,
    bench_acquire_release_cycle,
    bench_contended_acquires
);

criterion_main!(state_benches, scheduler_benches);
