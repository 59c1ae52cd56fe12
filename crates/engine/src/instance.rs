// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A running scenario instance: its `WorldState`, joined players, and
//! lifecycle status. `InstanceRegistry` is the CRUD surface the rest of the
//! engine (Generator, Scheduler, the `Simulation` facade) uses to look
//! instances up; it never exposes the inner mutex directly so callers can't
//! accidentally hold a guard across an `.await`.

use crate::error::RegistryError;
use crate::event_bus::EventBus;
use crate::world::WorldState;
use oj_core::{Clock, EntityId, IdGen, InstanceId, ScenarioManager, ScenarioTemplate};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    /// The Generator hasn't finished populating the world yet; joins are
    /// rejected while in this state.
    Generating,
    Active,
    /// Flipped by `InstanceRegistry::stop`; the Scheduler drops it from its
    /// next tick's active set on observation.
    Stopped,
}

struct InstanceInner<C: Clock> {
    status: InstanceStatus,
    player_ids: Vec<EntityId>,
    world: WorldState<C>,
}

pub struct Instance<C: Clock> {
    pub instance_id: InstanceId,
    pub scenario_id: String,
    pub created_at_ms: u64,
    inner: Mutex<InstanceInner<C>>,
}

impl<C: Clock> Instance<C> {
    fn new(instance_id: InstanceId, scenario_id: String, world: WorldState<C>, created_at_ms: u64) -> Self {
        Self {
            instance_id,
            scenario_id,
            created_at_ms,
            inner: Mutex::new(InstanceInner { status: InstanceStatus::Generating, player_ids: Vec::new(), world }),
        }
    }

    /// Reconstruct an instance from persisted state (daemon-restart path),
    /// bypassing `new()`'s fresh-`Generating` default.
    pub fn restore(
        instance_id: InstanceId,
        scenario_id: String,
        world: WorldState<C>,
        status: InstanceStatus,
        player_ids: Vec<EntityId>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            instance_id,
            scenario_id,
            created_at_ms,
            inner: Mutex::new(InstanceInner { status, player_ids, world }),
        }
    }

    pub fn status(&self) -> InstanceStatus {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: InstanceStatus) {
        self.inner.lock().status = status;
    }

    pub fn player_ids(&self) -> Vec<EntityId> {
        self.inner.lock().player_ids.clone()
    }

    pub fn add_player(&self, player_id: EntityId) {
        let mut inner = self.inner.lock();
        if !inner.player_ids.contains(&player_id) {
            inner.player_ids.push(player_id);
        }
    }

    /// Run a closure against the world under the instance's lock. Keep this
    /// short and synchronous — never await while holding the returned
    /// reference, since the closure runs with the lock held.
    pub fn with_world<R>(&self, f: impl FnOnce(&mut WorldState<C>) -> R) -> R {
        f(&mut self.inner.lock().world)
    }
}

pub struct InstanceRegistry<C: Clock, I: IdGen> {
    instances: Mutex<HashMap<InstanceId, Arc<Instance<C>>>>,
    clock: C,
    id_gen: I,
    event_bus: Arc<EventBus>,
}

impl<C: Clock, I: IdGen> InstanceRegistry<C, I> {
    pub fn new(clock: C, id_gen: I, event_bus: Arc<EventBus>) -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            clock,
            id_gen,
            event_bus,
        }
    }

    pub fn create(&self, scenario_id: &str) -> Result<Arc<Instance<C>>, RegistryError> {
        let scenario: ScenarioTemplate = ScenarioManager::get_template(scenario_id)
            .ok_or_else(|| RegistryError::UnknownScenario(scenario_id.to_string()))?;
        let instance_id = InstanceId::new(self.id_gen.next());
        let world = WorldState::new(instance_id.clone(), &scenario, self.event_bus.clone(), self.clock.clone());
        let instance = Arc::new(Instance::new(instance_id.clone(), scenario_id.to_string(), world, self.clock.epoch_ms()));

        let mut instances = self.instances.lock();
        if instances.contains_key(&instance_id) {
            return Err(RegistryError::DuplicateInstance(instance_id.to_string()));
        }
        instances.insert(instance_id, instance.clone());
        Ok(instance)
    }

    pub fn get(&self, instance_id: &InstanceId) -> Result<Arc<Instance<C>>, RegistryError> {
        self.instances
            .lock()
            .get(instance_id)
            .cloned()
            .ok_or_else(|| RegistryError::InstanceNotFound(instance_id.to_string()))
    }

    pub fn list(&self) -> Vec<Arc<Instance<C>>> {
        self.instances.lock().values().cloned().collect()
    }

    /// The bus instances publish events to; the Scheduler drains per
    /// instance from this same handle.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Insert a rehydrated instance (daemon-restart path), bypassing
    /// `create`'s fresh scenario-template lookup.
    pub fn insert_restored(&self, instance: Arc<Instance<C>>) -> Result<(), RegistryError> {
        let mut instances = self.instances.lock();
        if instances.contains_key(&instance.instance_id) {
            return Err(RegistryError::DuplicateInstance(instance.instance_id.to_string()));
        }
        instances.insert(instance.instance_id.clone(), instance);
        Ok(())
    }

    /// The clock this registry was constructed with, for callers
    /// rehydrating a `WorldState` outside of `create`.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn stop(&self, instance_id: &InstanceId) -> Result<(), RegistryError> {
        let instance = self.get(instance_id)?;
        instance.set_status(InstanceStatus::Stopped);
        Ok(())
    }

    pub fn delete(&self, instance_id: &InstanceId) -> Result<(), RegistryError> {
        let mut instances = self.instances.lock();
        instances
            .remove(instance_id)
            .ok_or_else(|| RegistryError::InstanceNotFound(instance_id.to_string()))?;
        self.event_bus.clear_instance(instance_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
