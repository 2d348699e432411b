//! Scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default holding period: ten minutes.
pub const DEFAULT_HOLD_SECS: u64 = 600;

/// Store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackendConfig {
    /// In-memory store for development/testing.
    InMemory,
    /// Postgres record store.
    Postgres,
}

/// Bounded backoff applied to retryable transaction conflicts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts before the conflict surfaces to the caller.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 25,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub const fn delay_for(&self, attempt: u32) -> Duration {
        let shift = if attempt > 8 { 8 } else { attempt };
        Duration::from_millis(self.base_delay_ms << shift)
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Holding period granted on acquire and promotion, in seconds.
    pub hold_duration_secs: u64,
    /// Conflict retry policy.
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Store backend selection.
    pub store: StoreBackendConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            hold_duration_secs: DEFAULT_HOLD_SECS,
            retry: RetryPolicy::default(),
            store: StoreBackendConfig::InMemory,
        }
    }
}

impl SchedulerConfig {
    /// Holding period as a duration.
    #[must_use]
    pub const fn hold_duration(&self) -> Duration {
        Duration::from_secs(self.hold_duration_secs)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.hold_duration_secs == 0 {
            return Err("hold_duration_secs must be greater than 0".into());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the environment, reading `.env` first.
    ///
    /// `TURNLOCK_CONFIG` may carry the full JSON document; otherwise defaults
    /// apply with `TURNLOCK_HOLD_SECS` overriding the holding period.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        if let Ok(json) = std::env::var("TURNLOCK_CONFIG") {
            return Self::from_json_str(&json);
        }
        let mut cfg = Self::default();
        if let Ok(secs) = std::env::var("TURNLOCK_HOLD_SECS") {
            cfg.hold_duration_secs = secs
                .parse()
                .map_err(|e| format!("TURNLOCK_HOLD_SECS invalid: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
