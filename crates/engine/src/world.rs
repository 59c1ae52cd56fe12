// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared, per-instance world: entities, a generic property bag
//! carrying scenario bounds and win conditions, and a bounded event log.
//! Mutated exclusively through `Instance`'s `parking_lot::Mutex`, never
//! held across an `.await` — callers clone what they need out before
//! awaiting anything.

use crate::event_bus::EventBus;
use indexmap::IndexMap;
use oj_core::{Clock, CoreError, Entity, EntityId, GameEvent, InstanceId, ScenarioTemplate, WorldLogEntry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Event log retains the last `EVENT_LOG_CAP` entries; `snapshot()` only
/// surfaces the most recent `SNAPSHOT_EVENT_WINDOW` of those.
const EVENT_LOG_CAP: usize = 200;
const SNAPSHOT_EVENT_WINDOW: usize = 10;

pub struct WorldState<C: Clock> {
    instance_id: InstanceId,
    event_bus: Arc<EventBus>,
    clock: C,
    entities: IndexMap<EntityId, Entity>,
    properties: HashMap<String, serde_json::Value>,
    log: Vec<WorldLogEntry>,
    turn: u32,
}

/// A read-only view of world state suitable for serialization to players,
/// AI agent context, and storage snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub entities: Vec<Entity>,
    pub properties: HashMap<String, serde_json::Value>,
    pub recent_events: Vec<WorldLogEntry>,
    pub turn: u32,
}

impl<C: Clock> WorldState<C> {
    pub fn new(instance_id: InstanceId, scenario: &ScenarioTemplate, event_bus: Arc<EventBus>, clock: C) -> Self {
        let mut properties = HashMap::new();
        properties.insert("world_width".to_string(), serde_json::json!(scenario.world_width));
        properties.insert("world_height".to_string(), serde_json::json!(scenario.world_height));
        properties.insert("scenario_id".to_string(), serde_json::json!(scenario.scenario_id));
        properties.insert("scenario_name".to_string(), serde_json::json!(scenario.name));
        properties.insert("max_turns".to_string(), serde_json::json!(scenario.max_turns));
        properties.insert(
            "allowed_actions".to_string(),
            serde_json::json!(scenario
                .allowed_actions
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()),
        );
        properties.insert(
            "starting_position".to_string(),
            serde_json::json!([scenario.starting_position.0, scenario.starting_position.1]),
        );

        Self {
            instance_id,
            event_bus,
            clock,
            entities: IndexMap::new(),
            properties,
            log: Vec::new(),
            turn: 0,
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn increment_turn(&mut self) -> u32 {
        self.turn += 1;
        self.turn
    }

    pub fn add_entity(&mut self, entity: Entity) -> Result<(), CoreError> {
        if self.entities.contains_key(&entity.id) {
            return Err(CoreError::DuplicateEntity(entity.id.to_string()));
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// No-op if `id` isn't present.
    pub fn remove_entity(&mut self, id: &EntityId) {
        self.entities.shift_remove(id);
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Stable insertion-order iteration — `ActionEngine::handle_move`'s
    /// first-match proximity scan depends on this order being deterministic.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Shallow patch: `x`/`y` update position, everything else merges into
    /// `properties`. No-op if `id` isn't present.
    pub fn update_entity(&mut self, id: &EntityId, patch: HashMap<String, serde_json::Value>) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        for (key, value) in patch {
            match key.as_str() {
                "x" => {
                    if let Some(x) = value.as_f64() {
                        entity.x = x;
                    }
                }
                "y" => {
                    if let Some(y) = value.as_f64() {
                        entity.y = y;
                    }
                }
                _ => {
                    entity.properties.insert(key, value);
                }
            }
        }
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn world_width(&self) -> f64 {
        self.property("world_width").and_then(|v| v.as_f64()).unwrap_or(800.0)
    }

    pub fn world_height(&self) -> f64 {
        self.property("world_height").and_then(|v| v.as_f64()).unwrap_or(600.0)
    }

    pub fn max_turns(&self) -> u32 {
        self.property("max_turns").and_then(|v| v.as_u64()).unwrap_or(150) as u32
    }

    /// Whether `verb` is in this scenario's `allowed_actions` list. Absent
    /// or unparseable `allowed_actions` defaults to permissive, since a
    /// restored snapshot or a hand-built test world may not carry it.
    pub fn is_action_allowed(&self, verb: &str) -> bool {
        self.property("allowed_actions")
            .and_then(|v| v.as_array())
            .map(|allowed| allowed.iter().any(|a| a.as_str() == Some(verb)))
            .unwrap_or(true)
    }

    pub fn target_item_id(&self) -> Option<String> {
        self.property("target_item_id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    /// Appends to the bounded in-memory log and publishes to the event bus.
    /// World coordinates resolve from `npc_id`/`target_npc_id` in `data`
    /// when the referenced entity exists, else default to the origin.
    pub fn log_event(&mut self, event_type: &str, data: HashMap<String, serde_json::Value>) {
        let (x, y) = data
            .get("npc_id")
            .or_else(|| data.get("target_npc_id"))
            .and_then(|v| v.as_str())
            .and_then(|id| self.entities.get(&EntityId::new(id)))
            .map(|e| (e.x, e.y))
            .unwrap_or((0.0, 0.0));

        let timestamp_ms = self.clock.epoch_ms();

        self.log.push(WorldLogEntry {
            turn: self.turn,
            event_type: event_type.to_string(),
            data: data.clone(),
            timestamp_ms,
        });
        if self.log.len() > EVENT_LOG_CAP {
            let excess = self.log.len() - EVENT_LOG_CAP;
            self.log.drain(..excess);
        }

        self.event_bus.publish(
            &self.instance_id,
            GameEvent {
                instance_id: self.instance_id.to_string(),
                event_type: event_type.to_string(),
                data,
                x,
                y,
                timestamp_ms,
            },
        );
    }

    /// Reconstruct a `WorldState` from a previously taken `WorldSnapshot` —
    /// the daemon-restart rehydration path. The bounded in-memory log only
    /// gets back `snapshot.recent_events`; older history doesn't round-trip,
    /// matching what `snapshot()` exposed in the first place.
    pub fn restore(instance_id: InstanceId, event_bus: Arc<EventBus>, clock: C, snapshot: WorldSnapshot) -> Self {
        let mut entities = IndexMap::new();
        for entity in snapshot.entities {
            entities.insert(entity.id.clone(), entity);
        }
        Self {
            instance_id,
            event_bus,
            clock,
            entities,
            properties: snapshot.properties,
            log: snapshot.recent_events,
            turn: snapshot.turn,
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let start = self.log.len().saturating_sub(SNAPSHOT_EVENT_WINDOW);
        WorldSnapshot {
            entities: self.entities.values().cloned().collect(),
            properties: self.properties.clone(),
            recent_events: self.log[start..].to_vec(),
            turn: self.turn,
        }
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
