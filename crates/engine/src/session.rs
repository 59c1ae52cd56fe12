// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A player's per-instance play-through: turn counter, status, and action
//! history. A session doesn't own a `WorldState` — it's looked up from the
//! owning `Instance` for each action — but it does own the turn counter,
//! distinct from `WorldState::turn()` which tracks the world's own clock of
//! dispatched actions across every joined player.

use oj_core::{EntityId, InstanceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub turn: u32,
    pub action: String,
    pub params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub game_id: String,
    pub instance_id: InstanceId,
    pub player_id: EntityId,
    pub status: SessionStatus,
    pub turn: u32,
    pub action_log: Vec<ActionLogEntry>,
}

impl Session {
    pub fn new(game_id: impl Into<String>, instance_id: InstanceId, player_id: EntityId) -> Self {
        Self {
            game_id: game_id.into(),
            instance_id,
            player_id,
            status: SessionStatus::Started,
            turn: 0,
            action_log: Vec::new(),
        }
    }

    pub fn record_action(&mut self, action: impl Into<String>, params: HashMap<String, serde_json::Value>, new_turn: u32) {
        self.action_log.push(ActionLogEntry { turn: new_turn, action: action.into(), params });
        self.turn = new_turn;
        if self.status == SessionStatus::Started {
            self.status = SessionStatus::InProgress;
        }
    }
}

/// Tracks every session across every instance, indexed both by its
/// externally visible `game_id` and by `(instance_id, player_id)` so the
/// Scheduler and ActionEngine callers can look sessions up either way.
#[derive(Default)]
pub struct SessionManager {
    by_game_id: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, game_id: impl Into<String>, instance_id: InstanceId, player_id: EntityId) -> &mut Session {
        let game_id = game_id.into();
        self.by_game_id
            .entry(game_id.clone())
            .or_insert_with(|| Session::new(game_id, instance_id, player_id))
    }

    pub fn get_by_game_id(&self, game_id: &str) -> Option<&Session> {
        self.by_game_id.get(game_id)
    }

    pub fn get_by_game_id_mut(&mut self, game_id: &str) -> Option<&mut Session> {
        self.by_game_id.get_mut(game_id)
    }

    pub fn get_by_instance_agent(&self, instance_id: &InstanceId, player_id: &EntityId) -> Option<&Session> {
        self.by_game_id
            .values()
            .find(|s| s.instance_id == *instance_id && s.player_id == *player_id)
    }

    pub fn get_by_instance_agent_mut(&mut self, instance_id: &InstanceId, player_id: &EntityId) -> Option<&mut Session> {
        self.by_game_id
            .values_mut()
            .find(|s| s.instance_id == *instance_id && s.player_id == *player_id)
    }

    pub fn sessions_for_instance(&self, instance_id: &InstanceId) -> Vec<&Session> {
        self.by_game_id.values().filter(|s| s.instance_id == *instance_id).collect()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
