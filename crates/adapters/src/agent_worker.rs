// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The LLM provider contract. An `AgentWorker` answers one `AgentRequest` at
//! a time — no persistent session, no streaming — which is all the
//! Scheduler's per-tick dispatch needs from it.

use async_trait::async_trait;
use oj_core::InstanceId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The role a worker serves. `ScenarioGenerator` populates a fresh
/// instance's stores/NPCs/items; `NpcAdmin` answers in-world NPC reactions
/// and idle ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ScenarioGenerator,
    NpcAdmin,
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::ScenarioGenerator => write!(f, "scenario_generator"),
            AgentRole::NpcAdmin => write!(f, "npc_admin"),
        }
    }
}

/// A single call dispatched to a worker. `action` names what's being asked
/// (`generate_npcs`, `npc_reaction`, `npc_idle`, ...); `context` carries
/// whatever the caller needs the worker to see (world snapshot, event
/// data, scenario constraints).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub instance_id: InstanceId,
    pub action: String,
    pub context: HashMap<String, serde_json::Value>,
}

impl AgentRequest {
    pub fn new(instance_id: InstanceId, action: impl Into<String>) -> Self {
        Self {
            instance_id,
            action: action.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// A worker's reply. `payload` is the parsed structured update (entity
/// patches, generated entities, ...); callers that can't make sense of it
/// treat the request as failed rather than raising — a malformed or
/// unparseable LLM reply never crosses this trait boundary as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub payload: HashMap<String, serde_json::Value>,
}

impl AgentResponse {
    pub fn empty() -> Self {
        Self { payload: HashMap::new() }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("worker unavailable for role {0}")]
    Unavailable(String),
    #[error("request timed out")]
    Timeout,
    #[error("worker call failed: {0}")]
    CallFailed(String),
}

/// A connected LLM-backed (or deterministic, for tests) worker. A worker
/// carries its own connection lifecycle — `AgentPool::register` only keeps
/// it in rotation if `connect` reports success, and `unregister` always
/// calls `disconnect` on the way out.
#[async_trait]
pub trait AgentWorker: Send + Sync + 'static {
    fn role(&self) -> AgentRole;

    /// A display name for diagnostics (`GET /ai-agents/status/{name}` and
    /// friends); distinct from the `WorkerId` the pool indexes by.
    fn name(&self) -> &str;

    async fn handle_request(&self, request: AgentRequest) -> Result<AgentResponse, AgentError>;

    /// Establish the worker's connection (e.g. validate API credentials).
    /// Returns `false` to refuse registration. Defaults to always
    /// succeeding, for workers with nothing to connect to.
    async fn connect(&self) -> bool {
        true
    }

    /// Tear down the worker's connection. Called once on `unregister` or
    /// `AgentPool::shutdown`.
    async fn disconnect(&self) {}

    /// Whether the worker currently considers itself connected.
    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "agent_worker_tests.rs"]
mod tests;
