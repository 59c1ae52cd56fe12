// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the concrete `Simulation`/`Scheduler`/`AgentPool` stack the `ojd`
//! binary runs, and drives the tick loop plus a periodic persistence pass
//! until shutdown.

use crate::config::DaemonConfig;
use crate::persistence;
use oj_adapters::AgentPool;
use oj_core::{StdRngSource, SystemClock, UuidIdGen};
use oj_engine::{EventBus, InstanceRegistry, Scheduler, SchedulerConfig, SchedulerError, Simulation};
use oj_storage::SnapshotStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

pub type DaemonSimulation = Simulation<SystemClock, UuidIdGen, StdRngSource>;

/// Every long-lived handle a running daemon holds. `ojd`'s `main` owns one
/// of these; tests construct their own against a temp directory.
pub struct Daemon {
    pub simulation: Arc<DaemonSimulation>,
    pub scheduler: Arc<Scheduler<SystemClock, UuidIdGen>>,
    pub pool: Arc<AgentPool>,
    pub store: SnapshotStore,
    pub config: DaemonConfig,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let registry = Arc::new(InstanceRegistry::new(SystemClock, UuidIdGen, event_bus));
        let store = SnapshotStore::new(config.state_dir.join("instances"));
        persistence::rehydrate_all(&registry, &store, SystemClock);

        let pool = Arc::new(AgentPool::new());
        let scheduler_config = SchedulerConfig { tick_rate: config.tick_rate, ..SchedulerConfig::default() };
        let scheduler = Scheduler::new(registry.clone(), pool.clone(), scheduler_config);
        let simulation = Arc::new(Simulation::new(registry, pool.clone(), StdRngSource::new(), UuidIdGen));

        Self { simulation, scheduler, pool, store, config }
    }

    /// Start the tick loop. Call `persist_all` on whatever cadence the
    /// caller chooses (`main` persists on every `TICK_RATE`-scaled
    /// interval via a second background task).
    pub fn start(&self) -> Result<(), DaemonError> {
        self.scheduler.start()?;
        info!(admin_token_set = !self.config.admin_token.is_empty(), tick_rate = ?self.config.tick_rate, "daemon started");
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), DaemonError> {
        self.scheduler.stop().await?;
        persistence::persist_all(&self.simulation, &self.store);
        info!("daemon shut down, final snapshot persisted");
        Ok(())
    }

    pub fn persist_now(&self) {
        persistence::persist_all(&self.simulation, &self.store);
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
