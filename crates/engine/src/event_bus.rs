// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-instance event queue. `WorldState::log_event` publishes here
//! synchronously and non-blockingly; the Scheduler's Reaction Phase drains
//! it on its own tick. No durability — a crash loses whatever hasn't been
//! drained yet, which is acceptable since reactions are best-effort flavor,
//! not state-changing.

use oj_core::{GameEvent, InstanceId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

#[derive(Default)]
pub struct EventBus {
    queues: Mutex<HashMap<InstanceId, VecDeque<GameEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event for an instance. Never blocks on a reaction being
    /// computed — just appends to the in-memory queue. No upper bound by
    /// design: backpressure is the Scheduler's job, via dropped AI calls,
    /// not dropped events. Only `clear_instance` discards a queue.
    pub fn publish(&self, instance_id: &InstanceId, event: GameEvent) {
        let mut queues = self.queues.lock();
        queues.entry(instance_id.clone()).or_default().push_back(event);
    }

    /// Drain all events currently queued for an instance, in publish order.
    pub fn drain_instance(&self, instance_id: &InstanceId) -> Vec<GameEvent> {
        let mut queues = self.queues.lock();
        match queues.get_mut(instance_id) {
            Some(queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    /// Drop an instance's queue entirely. Called when an instance is
    /// deleted so its backlog doesn't linger in the map forever.
    pub fn clear_instance(&self, instance_id: &InstanceId) {
        self.queues.lock().remove(instance_id);
    }

    pub fn pending_count(&self, instance_id: &InstanceId) -> usize {
        self.queues
            .lock()
            .get(instance_id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    /// Instance ids that currently have at least one queued event, for the
    /// Scheduler's Reaction Phase to iterate over without draining instances
    /// it doesn't need to touch.
    pub fn all_pending(&self) -> Vec<InstanceId> {
        self.queues
            .lock()
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
