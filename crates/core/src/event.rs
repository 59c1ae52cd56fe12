// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types flowing through the EventBus and the per-instance world log.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An event published to the EventBus for the Scheduler's Reaction Phase to
/// pick up. `x`/`y` are best-effort world coordinates resolved from the
/// triggering NPC, defaulting to the origin when no NPC is resolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub instance_id: String,
    pub event_type: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    pub x: f64,
    pub y: f64,
    pub timestamp_ms: u64,
}

impl GameEvent {
    pub fn npc_id(&self) -> Option<&str> {
        self.data
            .get("npc_id")
            .or_else(|| self.data.get("target_npc_id"))
            .and_then(|v| v.as_str())
    }
}

/// A single entry in a WorldState's bounded event log (distinct from
/// [`GameEvent`]: this is the in-memory history kept for snapshots and
/// observation, not the bus's dispatch queue).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLogEntry {
    pub turn: u32,
    pub event_type: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    pub timestamp_ms: u64,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
