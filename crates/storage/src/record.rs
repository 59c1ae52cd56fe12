// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted shape of one instance: `{instance_id, scenario_id, state,
//! players, created_at, updated_at, active}`. `state` is exactly
//! `oj_engine::WorldSnapshot` — the same structure handed to players and AI
//! agent context, so persistence round-trips the identical shape rather
//! than a parallel one.

use chrono::{DateTime, Utc};
use oj_core::{EntityId, InstanceId};
use oj_engine::WorldSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: InstanceId,
    pub scenario_id: String,
    pub state: WorldSnapshot,
    pub players: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl InstanceRecord {
    pub fn new(instance_id: InstanceId, scenario_id: impl Into<String>, state: WorldSnapshot, players: Vec<EntityId>, active: bool) -> Self {
        let now = Utc::now();
        Self {
            instance_id,
            scenario_id: scenario_id.into(),
            state,
            players,
            created_at: now,
            updated_at: now,
            active,
        }
    }
}
