// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic `AgentWorker` for tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::agent_worker::{AgentError, AgentRequest, AgentResponse, AgentRole, AgentWorker};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded call to a [`FakeAgentWorker`], for assertions on dispatch order
/// and parameters.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub action: String,
    pub context: HashMap<String, serde_json::Value>,
}

#[derive(Clone)]
pub struct FakeAgentWorker {
    role: AgentRole,
    name: String,
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    calls: Vec<RecordedRequest>,
    responses: VecDeque<AgentResponse>,
    errors: VecDeque<String>,
    connected: bool,
    refuse_connect: bool,
}

impl FakeAgentWorker {
    pub fn new(role: AgentRole) -> Self {
        Self::named(role, format!("fake-{role}"))
    }

    pub fn named(role: AgentRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            inner: Arc::new(Mutex::new(FakeState {
                calls: Vec::new(),
                responses: VecDeque::new(),
                errors: VecDeque::new(),
                connected: false,
                refuse_connect: false,
            })),
        }
    }

    /// Make the next `connect()` call return `false`, as if the worker
    /// rejected its credentials.
    pub fn refuse_connect(&self) {
        self.inner.lock().refuse_connect = true;
    }

    /// Queue the payload returned by the next `handle_request` call. Queued
    /// responses are consumed in FIFO order, one per call; once the queue is
    /// empty, calls fall back to `AgentResponse::empty()`.
    pub fn queue_response(&self, response: AgentResponse) {
        self.inner.lock().responses.push_back(response);
    }

    /// Queue a call failure for the next `handle_request` call, FIFO.
    pub fn queue_error(&self, message: impl Into<String>) {
        self.inner.lock().errors.push_back(message.into());
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[async_trait]
impl AgentWorker for FakeAgentWorker {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle_request(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RecordedRequest {
            action: request.action.clone(),
            context: request.context.clone(),
        });
        if let Some(message) = inner.errors.pop_front() {
            return Err(AgentError::CallFailed(message));
        }
        Ok(inner.responses.pop_front().unwrap_or_else(AgentResponse::empty))
    }

    async fn connect(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.refuse_connect {
            inner.refuse_connect = false;
            return false;
        }
        inner.connected = true;
        true
    }

    async fn disconnect(&self) {
        self.inner.lock().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
