//! # Turnlock
//!
//! A transactional turn scheduler for a single shared, time-boxed resource.
//!
//! This library governs which member of a small group currently holds an
//! exclusive resource, who is waiting for it, and how waiting members are
//! promoted when the holder's time expires or the holder releases
//! voluntarily. There is no central scheduler process: every client issues
//! operations independently, and correctness rests entirely on the atomic
//! read-modify-write contract of the backing store.
//!
//! ## Core Problem Solved
//!
//! Turn-taking over a shared resource is easy to get wrong under concurrency:
//!
//! - **Double occupancy**: two clients racing `acquire` into a freed slot
//! - **Queue jumping**: a late `acquire` slipping ahead of the rightful
//!   queue head if promotion is a separate, later write
//! - **Duplicate expiry**: every member's client runs its own countdown, so
//!   expiry handling fires N times for one holding period
//! - **Stale membership**: a kicked member lingering as holder or waiter
//!
//! All four are solved the same way: every mutation is a single transactional
//! function applied to the group's turn record, and the expiry path is
//! idempotent so redundant triggers collapse into one transition.
//!
//! ## TurnScheduler - Transactional Operations
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use turnlock::core::{InMemoryRoster, TurnScheduler};
//! use turnlock::config::RetryPolicy;
//! use turnlock::infra::store::memory::InMemoryTurnStore;
//! use turnlock::util::clock::now_ms;
//!
//! let store = Arc::new(InMemoryTurnStore::new());
//! let roster = Arc::new(InMemoryRoster::new());
//! let scheduler = TurnScheduler::new(store, roster, RetryPolicy::default());
//!
//! let hold = Duration::from_secs(600);
//! let outcome = scheduler.acquire(&group, &member, hold, now_ms()).await?;
//! // outcome.role is Role::Holder when the resource was free,
//! // Role::Queued with a 1-based position otherwise.
//! scheduler.release(&group, &member, hold, now_ms()).await?;
//! ```
//!
//! ## ExpiryWatcher - Client-Local Expiry Trigger
//!
//! Each client arms a single-shot timer from the holder's expiry timestamp
//! and calls `expire_and_promote` when it elapses. The watcher is best
//! effort by design; the authoritative check happens inside the store
//! transaction, so any number of racing watchers produce exactly one
//! promotion and exactly one usage-counter increment.
//!
//! For complete examples, see:
//! - `tests/turn_scheduler_test.rs` - Full integration tests
//! - `README.md` - Comprehensive documentation

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduler state machine, roster, and error taxonomy.
pub mod core;
/// Configuration models for hold durations, retries, and backends.
pub mod config;
/// Builders to construct scheduler components from configuration.
pub mod builders;
/// Infrastructure adapters for turn-state storage and change fan-out.
pub mod infra;
/// Runtime adapters (spawner, expiry watcher) and API view models.
pub mod runtime;
/// Shared utilities.
pub mod util;
