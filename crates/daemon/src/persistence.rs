// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic persistence: snapshot every instance to `oj-storage`. Lossy at
//! the granularity of however often the caller invokes this — durable
//! event replay between snapshots is an explicit non-goal, so a crash just
//! before a pass loses at most the ticks since the last one.

use oj_core::{Clock, IdGen, RngSource};
use oj_engine::{Instance, InstanceRegistry, InstanceStatus, Simulation, WorldState};
use oj_storage::{InstanceRecord, SnapshotStore};
use std::sync::Arc;
use tracing::warn;

pub fn persist_all<C: Clock + 'static, I: IdGen + 'static, R: RngSource>(simulation: &Simulation<C, I, R>, store: &SnapshotStore) {
    for instance in simulation.list_instances() {
        let state = instance.with_world(|world| world.snapshot());
        let active = instance.status() != InstanceStatus::Stopped;
        let record = InstanceRecord::new(instance.instance_id.clone(), instance.scenario_id.clone(), state, instance.player_ids(), active);
        if let Err(err) = store.save(&record) {
            warn!(instance_id = %instance.instance_id, error = %err, "failed to persist instance snapshot");
        }
    }
}

/// Rehydrate every persisted instance into `registry` — the daemon-restart
/// path. The persisted `active` bit collapses `Generating` and `Active`
/// into one flag, so a rehydrated instance always resumes as `Active` or
/// `Stopped`; there's no way to recover the `Generating` distinction from
/// disk alone.
pub fn rehydrate_all<C: Clock + 'static, I: IdGen + 'static>(registry: &InstanceRegistry<C, I>, store: &SnapshotStore, clock: C) {
    let ids = match store.list() {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "failed to list persisted instances");
            return;
        }
    };

    for instance_id in ids {
        match store.load(&instance_id) {
            Ok(Some(record)) => {
                let status = if record.active { InstanceStatus::Active } else { InstanceStatus::Stopped };
                let created_at_ms = record.created_at.timestamp_millis().max(0) as u64;
                let world = WorldState::restore(record.instance_id.clone(), registry.event_bus().clone(), clock.clone(), record.state);
                let instance = Arc::new(Instance::restore(
                    record.instance_id.clone(),
                    record.scenario_id,
                    world,
                    status,
                    record.players,
                    created_at_ms,
                ));
                if let Err(err) = registry.insert_restored(instance) {
                    warn!(instance_id = %instance_id, error = %err, "failed to rehydrate instance");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(instance_id = %instance_id, error = %err, "failed to load persisted instance"),
        }
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
