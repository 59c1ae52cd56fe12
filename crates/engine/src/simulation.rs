// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The facade a caller embeds: the `oj` CLI's admin client today, real HTTP
//! routing tomorrow. Ties `InstanceRegistry`, `Generator`, `ActionEngine`,
//! and `SessionManager` behind the handful of operations a request handler
//! would call directly — `create_instance`, `join`, `submit_action`,
//! `stop_instance`, `delete_instance` — without this crate inventing a wire
//! protocol of its own.

use crate::action_engine::{ActionEngine, ActionOutcome};
use crate::error::{ActionError, RegistryError};
use crate::generator;
use crate::instance::{Instance, InstanceRegistry, InstanceStatus};
use crate::session::{SessionManager, SessionStatus};
use crate::world::WorldSnapshot;
use oj_adapters::AgentPool;
use oj_core::{Clock, Entity, EntityId, EntityKind, IdGen, InstanceId, RngSource, ScenarioManager};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error("no session for instance {instance_id} and player {player_id}")]
    NoSession { instance_id: String, player_id: String },
}

/// Owns the registry and agent pool handles a daemon wires up once at
/// startup; everything below is `Send + Sync` and cheap to clone via `Arc`.
pub struct Simulation<C: Clock + 'static, I: IdGen + 'static, R: RngSource> {
    registry: Arc<InstanceRegistry<C, I>>,
    pool: Arc<AgentPool>,
    sessions: Mutex<SessionManager>,
    action_engine: ActionEngine<R>,
    game_id_gen: I,
}

impl<C: Clock + 'static, I: IdGen + 'static, R: RngSource> Simulation<C, I, R> {
    pub fn new(registry: Arc<InstanceRegistry<C, I>>, pool: Arc<AgentPool>, rng: R, game_id_gen: I) -> Self {
        Self {
            registry,
            pool,
            sessions: Mutex::new(SessionManager::new()),
            action_engine: ActionEngine::new(rng),
            game_id_gen,
        }
    }

    pub fn registry(&self) -> &Arc<InstanceRegistry<C, I>> {
        &self.registry
    }

    pub fn pool(&self) -> &Arc<AgentPool> {
        &self.pool
    }

    /// `POST /scenarios/{id}/instances`. Registers the instance in
    /// `Generating` status and detaches the Generator as a background task;
    /// returns as soon as the instance exists, without waiting for
    /// population to finish.
    #[instrument(skip(self))]
    pub fn create_instance(&self, scenario_id: &str) -> Result<InstanceId, SimulationError> {
        let instance = self.registry.create(scenario_id)?;
        let scenario = ScenarioManager::get_template(scenario_id)
            .ok_or_else(|| RegistryError::UnknownScenario(scenario_id.to_string()))?;
        let pool = self.pool.clone();
        let spawned = instance.clone();
        tokio::spawn(async move {
            generator::generate(&spawned, &scenario, &pool).await;
        });
        Ok(instance.instance_id.clone())
    }

    /// `POST /scenarios/instances/{id}/join`. Rejects while the instance is
    /// still `Generating` or once it's `Stopped`; otherwise places the
    /// player in the world (if not already present, seeded from the
    /// scenario's starting position and gold) and opens a session.
    pub fn join(&self, instance_id: &InstanceId, player_id: EntityId) -> Result<String, SimulationError> {
        let instance = self.registry.get(instance_id)?;
        match instance.status() {
            InstanceStatus::Generating => return Err(RegistryError::StillGenerating.into()),
            InstanceStatus::Stopped => return Err(RegistryError::InstanceNotFound(instance_id.to_string()).into()),
            InstanceStatus::Active => {}
        }

        let scenario = ScenarioManager::get_template(&instance.scenario_id);
        instance.with_world(|world| {
            if world.entity(&player_id).is_some() {
                return;
            }
            let (x, y) = scenario.as_ref().map(|s| s.starting_position).unwrap_or((0.0, 0.0));
            let gold = scenario.as_ref().map(|s| s.starting_gold as u64).unwrap_or(0);
            let player = Entity::new(player_id.clone(), EntityKind::Player, x, y)
                .with_property("health", 100u64)
                .with_property("gold", gold);
            let _ = world.add_entity(player);
        });
        instance.add_player(player_id.clone());

        let game_id = self.game_id_gen.next();
        self.sessions.lock().create(game_id.clone(), instance_id.clone(), player_id);
        Ok(game_id)
    }

    /// `POST /scenarios/instances/{id}/action`, addressed by the same
    /// `(instance_id, player_id)` pair `SessionManager::get_by_instance_agent`
    /// indexes on. Requires a prior `join`. A stopped instance must not be
    /// observed, joined, or ticked (§3/§4.6) — `observe` is just another verb
    /// dispatched through here, so the same status gate covers it.
    #[instrument(skip(self, params))]
    pub fn submit_action(
        &self,
        instance_id: &InstanceId,
        player_id: &EntityId,
        verb: &str,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, SimulationError> {
        let instance = self.registry.get(instance_id)?;
        match instance.status() {
            InstanceStatus::Generating => return Err(RegistryError::StillGenerating.into()),
            InstanceStatus::Stopped => return Err(RegistryError::InstanceNotFound(instance_id.to_string()).into()),
            InstanceStatus::Active => {}
        }

        let mut sessions = self.sessions.lock();
        let session = sessions.get_by_instance_agent_mut(instance_id, player_id).ok_or_else(|| {
            SimulationError::NoSession {
                instance_id: instance_id.to_string(),
                player_id: player_id.to_string(),
            }
        })?;
        // A completed or failed session is frozen: the player entity already
        // reached a terminal state, so no further action should move its turn.
        if matches!(session.status, SessionStatus::Completed | SessionStatus::Failed) {
            return Err(ActionError::NotInProgress.into());
        }
        let turn = session.turn;

        let (outcome, next_turn) =
            instance.with_world(|world| self.action_engine.dispatch(world, player_id, turn, verb, params))?;
        session.record_action(verb, params.clone(), next_turn);

        if outcome.update.get("completed").and_then(|v| v.as_bool()) == Some(true) {
            session.status = SessionStatus::Completed;
        } else if let Some(0) = outcome.update.get("stats").and_then(|s| s.get("health")).and_then(|h| h.as_u64()) {
            session.status = SessionStatus::Failed;
        }

        Ok(outcome)
    }

    /// `POST /scenarios/instances/{id}/stop`.
    pub fn stop_instance(&self, instance_id: &InstanceId) -> Result<(), SimulationError> {
        Ok(self.registry.stop(instance_id)?)
    }

    /// `DELETE /scenarios/instances/{id}`.
    pub fn delete_instance(&self, instance_id: &InstanceId) -> Result<(), SimulationError> {
        Ok(self.registry.delete(instance_id)?)
    }

    pub fn snapshot(&self, instance_id: &InstanceId) -> Result<WorldSnapshot, SimulationError> {
        let instance = self.registry.get(instance_id)?;
        Ok(instance.with_world(|world| world.snapshot()))
    }

    pub fn instance_status(&self, instance_id: &InstanceId) -> Result<InstanceStatus, SimulationError> {
        Ok(self.registry.get(instance_id)?.status())
    }

    pub fn list_instances(&self) -> Vec<Arc<Instance<C>>> {
        self.registry.list()
    }
}

#[cfg(test)]
#[path = "simulation_tests.rs"]
mod tests;
