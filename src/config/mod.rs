//! Configuration models for hold durations, retries, and backends.

pub mod scheduler;

pub use scheduler::{RetryPolicy, SchedulerConfig, StoreBackendConfig, DEFAULT_HOLD_SECS};
