// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of connected `AgentWorker`s, round-robin per role. The critical
//! section is only the cursor read-and-advance; the actual dispatch happens
//! outside the lock so a slow LLM call never blocks registration or other
//! roles' requests.

use crate::agent_worker::{AgentError, AgentRequest, AgentResponse, AgentRole, AgentWorker};
use oj_core::WorkerId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct RoleState {
    workers: Vec<(WorkerId, Arc<dyn AgentWorker>)>,
    cursor: usize,
}

impl Default for RoleState {
    fn default() -> Self {
        Self { workers: Vec::new(), cursor: 0 }
    }
}

#[derive(Default)]
pub struct AgentPool {
    roles: Mutex<HashMap<AgentRole, RoleState>>,
}

impl AgentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects `worker` and, only if `connect()` reports success, appends
    /// it to its role's round-robin rotation. Returns whether it was
    /// registered.
    pub async fn register(&self, id: WorkerId, worker: Arc<dyn AgentWorker>) -> bool {
        if !worker.connect().await {
            return false;
        }
        let role = worker.role();
        let mut roles = self.roles.lock();
        roles.entry(role).or_default().workers.push((id, worker));
        true
    }

    /// Disconnects and removes the worker with `id` from every role's
    /// rotation (a worker only ever belongs to one, but this doesn't
    /// assume that). No-op if `id` isn't registered.
    pub async fn unregister(&self, id: &WorkerId) {
        let removed = {
            let mut roles = self.roles.lock();
            let mut removed = None;
            for state in roles.values_mut() {
                if let Some(pos) = state.workers.iter().position(|(worker_id, _)| worker_id == id) {
                    removed = Some(state.workers.remove(pos).1);
                }
                if state.cursor >= state.workers.len() {
                    state.cursor = 0;
                }
            }
            removed
        };
        if let Some(worker) = removed {
            worker.disconnect().await;
        }
    }

    pub fn worker_count(&self, role: AgentRole) -> usize {
        self.roles.lock().get(&role).map(|s| s.workers.len()).unwrap_or(0)
    }

    pub fn has_role(&self, role: AgentRole) -> bool {
        self.worker_count(role) > 0
    }

    /// Select the next worker for `role` via round-robin and dispatch
    /// `request` to it outside the lock. Returns `None` immediately if no
    /// worker is registered for the role.
    pub async fn request(&self, role: AgentRole, request: AgentRequest) -> Option<Result<AgentResponse, AgentError>> {
        let worker = self.select(role)?;
        Some(worker.handle_request(request).await)
    }

    /// Fan out `request` to every worker registered for `role`, collecting
    /// only the successes.
    pub async fn broadcast(&self, role: AgentRole, request: AgentRequest) -> Vec<AgentResponse> {
        let workers: Vec<_> = {
            let roles = self.roles.lock();
            roles.get(&role).map(|s| s.workers.iter().map(|(_, w)| w.clone()).collect()).unwrap_or_default()
        };

        let mut responses = Vec::new();
        for worker in workers {
            if let Ok(response) = worker.handle_request(request.clone()).await {
                responses.push(response);
            }
        }
        responses
    }

    /// Disconnect every registered worker across every role, then clear
    /// the pool.
    pub async fn shutdown(&self) {
        let workers: Vec<_> = {
            let mut roles = self.roles.lock();
            let all = roles.values().flat_map(|s| s.workers.iter().map(|(_, w)| w.clone())).collect();
            roles.clear();
            all
        };
        for worker in workers {
            worker.disconnect().await;
        }
    }

    /// Names and liveness of every worker registered for `role`, for
    /// `GET /ai-agents/list` / `GET /ai-agents/status/{name}`-style
    /// diagnostics.
    pub fn worker_statuses(&self, role: AgentRole) -> Vec<(String, bool)> {
        self.roles
            .lock()
            .get(&role)
            .map(|s| s.workers.iter().map(|(_, w)| (w.name().to_string(), w.is_connected())).collect())
            .unwrap_or_default()
    }

    fn select(&self, role: AgentRole) -> Option<Arc<dyn AgentWorker>> {
        let mut roles = self.roles.lock();
        let state = roles.get_mut(&role)?;
        if state.workers.is_empty() {
            return None;
        }
        let (_, worker) = &state.workers[state.cursor % state.workers.len()];
        let worker = worker.clone();
        state.cursor = (state.cursor + 1) % state.workers.len();
        Some(worker)
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
