//! Builders to construct turn schedulers from configuration.

use std::sync::Arc;

use crate::config::{SchedulerConfig, StoreBackendConfig};
use crate::core::error::{AppResult, SchedulerError};
use crate::core::roster::{InMemoryRoster, Roster};
use crate::core::scheduler::TurnScheduler;
use crate::infra::store::{InMemoryTurnStore, TurnStore};

/// Build a turn scheduler from validated configuration using a store factory.
pub fn build_scheduler<S, R, FS>(
    cfg: &SchedulerConfig,
    mut store_factory: FS,
    roster: Arc<R>,
) -> AppResult<TurnScheduler<S, R>>
where
    S: TurnStore,
    R: Roster,
    FS: FnMut(&SchedulerConfig) -> Result<Arc<S>, SchedulerError>,
{
    cfg.validate()
        .map_err(|e| anyhow::anyhow!("config invalid: {e}"))?;
    let store = store_factory(cfg)?;
    Ok(TurnScheduler::new(store, roster, cfg.retry))
}

/// Build a fully in-memory scheduler, the default development wiring.
///
/// Rejects configurations selecting a backend other than
/// [`StoreBackendConfig::InMemory`].
pub fn build_in_memory(
    cfg: &SchedulerConfig,
) -> AppResult<TurnScheduler<InMemoryTurnStore, InMemoryRoster>> {
    if !matches!(cfg.store, StoreBackendConfig::InMemory) {
        anyhow::bail!("build_in_memory requires the in_memory store backend");
    }
    build_scheduler(
        cfg,
        |_cfg| Ok(Arc::new(InMemoryTurnStore::new())),
        Arc::new(InMemoryRoster::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_in_memory_with_defaults() {
        let cfg = SchedulerConfig::default();
        let scheduler = build_in_memory(&cfg).unwrap();
        assert!(scheduler.roster().is_empty(&"g".into()));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let cfg = SchedulerConfig {
            hold_duration_secs: 0,
            ..SchedulerConfig::default()
        };
        assert!(build_in_memory(&cfg).is_err());
    }

    #[test]
    fn test_build_rejects_backend_mismatch() {
        let cfg = SchedulerConfig {
            store: StoreBackendConfig::Postgres,
            ..SchedulerConfig::default()
        };
        assert!(build_in_memory(&cfg).is_err());
    }
}
