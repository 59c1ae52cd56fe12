// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind the `test-support` feature.

use crate::entity::{Entity, EntityId, EntityKind};
use crate::event::GameEvent;
use std::collections::HashMap;

pub fn player_entity(id: &str, x: f64, y: f64) -> Entity {
    Entity::new(EntityId::new(id), EntityKind::Player, x, y)
        .with_property("health", 100u64)
        .with_property("gold", 500u64)
}

pub fn npc_entity(id: &str, job: &str, x: f64, y: f64) -> Entity {
    Entity::new(EntityId::new(id), EntityKind::Npc, x, y)
        .with_property("job", job)
        .with_property("trust", 0.5)
        .with_property("health", 100u64)
}

pub fn hazard_entity(id: &str, x: f64, y: f64, damage: u64, radius: f64) -> Entity {
    Entity::new(EntityId::new(id), EntityKind::Hazard, x, y)
        .with_property("damage", damage)
        .with_property("radius", radius)
}

pub fn npc_reaction_event(instance_id: &str, npc_id: &str, event_type: &str) -> GameEvent {
    let mut data = HashMap::new();
    data.insert("npc_id".to_string(), serde_json::json!(npc_id));
    GameEvent {
        instance_id: instance_id.to_string(),
        event_type: event_type.to_string(),
        data,
        x: 0.0,
        y: 0.0,
        timestamp_ms: 1_000_000,
    }
}
