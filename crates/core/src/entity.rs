// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! World entities: agents, NPCs, stores, hazards, and items placed in a
//! scenario instance's coordinate space.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a world entity (player, NPC, store, or hazard).
    pub struct EntityId;
}

/// Coarse classification of an entity's role in the world. Distinct from
/// `AgentRole` in [`crate::agent`] — an NPC entity is *driven by* an agent
/// worker of some role, but the entity record itself only needs to say
/// what it is for rendering, targeting, and collision purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A player-controlled agent.
    Player,
    /// A non-player character driven by an agent worker.
    Npc,
    /// A store that sells items.
    Store,
    /// An environmental hazard (trap) that can damage entities that enter
    /// its radius.
    Hazard,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Player => write!(f, "player"),
            EntityKind::Npc => write!(f, "npc"),
            EntityKind::Store => write!(f, "store"),
            EntityKind::Hazard => write!(f, "hazard"),
        }
    }
}

/// A single item instance: either sitting in a store's inventory or held by
/// an entity. Serializes to exactly the shape a mapping-style (NPC/store) or
/// sequence-style (player) inventory entry is stored as, so it round-trips
/// through `serde_json::Value` with no field renaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: String,
    pub name: String,
    pub value: f64,
    pub rarity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tradeable: Option<bool>,
}

impl ItemRecord {
    pub fn new(item_id: impl Into<String>, name: impl Into<String>, value: f64, rarity: impl Into<String>) -> Self {
        Self { item_id: item_id.into(), name: name.into(), value, rarity: rarity.into(), tradeable: None }
    }
}

/// An entity placed somewhere in the world. Properties beyond position and
/// kind are an open bag (`BTreeMap<String, Value>`) because each kind keeps
/// a different shape of data (health/gold for players, inventory/prices for
/// stores, damage/radius for hazards) and the schema is generated per
/// scenario instance rather than fixed at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, x: f64, y: f64) -> Self {
        Self {
            id,
            kind,
            x,
            y,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property_u64(&self, key: &str) -> Option<u64> {
        self.properties.get(key).and_then(|v| v.as_u64())
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(|v| v.as_f64())
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn distance_to(&self, other: &Entity) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Typed accessors for recognized properties. AI-generated or
    /// scenario-specific keys not listed here still go through
    /// `property_*`/`set_property` directly.
    pub fn health(&self) -> u64 {
        self.property_u64("health").unwrap_or(0)
    }

    pub fn set_health(&mut self, value: u64, max_health: u64) {
        self.set_property("health", value.min(max_health));
    }

    pub fn trust(&self) -> f64 {
        self.property_f64("trust").unwrap_or(0.0)
    }

    /// Add `delta` to trust, clamped to `[0.0, 1.0]`.
    pub fn adjust_trust(&mut self, delta: f64) {
        let next = (self.trust() + delta).clamp(0.0, 1.0);
        self.set_property("trust", next);
    }

    pub fn gold(&self) -> u64 {
        self.property_u64("gold").unwrap_or(0)
    }

    pub fn set_gold(&mut self, value: u64) {
        self.set_property("gold", value);
    }

    pub fn job(&self) -> Option<&str> {
        self.property_str("job")
    }

    pub fn name(&self) -> Option<&str> {
        self.property_str("name")
    }

    pub fn personality(&self) -> Option<&str> {
        self.property_str("personality")
    }

    pub fn mood(&self) -> Option<&str> {
        self.property_str("mood")
    }

    pub fn is_alive(&self) -> bool {
        self.health() > 0
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
