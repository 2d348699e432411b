//! Infrastructure adapters for turn-state storage and change fan-out.

pub mod notify;
pub mod store;

pub use notify::{ChangeNotifier, Subscription};
pub use store::{InMemoryTurnStore, PostgresTurnStore, TurnStore};
