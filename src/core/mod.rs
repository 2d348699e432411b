//! Core scheduler state machine, roster, and error taxonomy.

pub mod audit;
pub mod error;
pub mod roster;
pub mod scheduler;
pub mod state;

pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink, PostgresAuditSink};
pub use error::{AppResult, SchedulerError};
pub use roster::{InMemoryRoster, Roster, RosterEvent};
pub use scheduler::{drive_removals, Spawn, TurnScheduler};
pub use state::{AcquireOutcome, Holder, Member, Role, TurnState, WaitEntry};
