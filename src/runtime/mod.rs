//! Runtime adapters (spawner, expiry watcher) and API view models.

pub mod api;
pub mod expiry;
pub mod spawner;

pub use api::{health, view_state, TurnStateView};
pub use expiry::{spawn_expiry_watcher, WatcherHandle};
pub use spawner::TokioSpawner;
