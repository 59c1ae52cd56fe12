// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tick loop — the hardest piece of this crate. Every tick it drains
//! each active instance's `EventBus` queue, batches events per target NPC,
//! and spawns one independent, deadline-capped task per NPC that calls
//! `AgentPool::request(npc_admin, ...)` and applies the reply to
//! `WorldState`. Nothing here is ever awaited by the tick itself — a tick
//! completes in bounded time regardless of how slow a worker is, and a
//! dropped or timed-out response is silent.

use crate::error::SchedulerError;
use crate::instance::{Instance, InstanceRegistry, InstanceStatus};
use oj_adapters::{AgentPool, AgentRequest, AgentRole};
use oj_core::{Clock, EntityId, EntityKind, GameEvent, IdGen};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Default tick interval (`TICK_RATE` env var in the daemon).
pub const DEFAULT_TICK_RATE: Duration = Duration::from_secs(1);
/// The Autonomous Phase fires every this many ticks.
pub const DEFAULT_IDLE_INTERVAL: u64 = 30;
/// Per-NPC dispatch deadline; a response arriving after this is dropped.
pub const DEFAULT_DISPATCH_DEADLINE: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub tick_rate: Duration,
    pub idle_interval: u64,
    pub dispatch_deadline: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            dispatch_deadline: DEFAULT_DISPATCH_DEADLINE,
        }
    }
}

/// Drives the Reaction and Autonomous phases for every `Active` instance in
/// `registry`, dispatching through `pool`. Holds no world state of its own —
/// everything it touches lives in the `Instance`s the registry owns, under
/// their own per-instance mutex.
pub struct Scheduler<C: Clock + 'static, I: IdGen + 'static> {
    registry: Arc<InstanceRegistry<C, I>>,
    pool: Arc<AgentPool>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock + 'static, I: IdGen + 'static> Scheduler<C, I> {
    pub fn new(registry: Arc<InstanceRegistry<C, I>>, pool: Arc<AgentPool>, config: SchedulerConfig) -> Arc<Self> {
        Arc::new(Self {
            registry,
            pool,
            config,
            state: Mutex::new(SchedulerState::Stopped),
            shutdown_tx: Mutex::new(None),
            join_handle: Mutex::new(None),
        })
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Spawn the tick loop on the current Tokio runtime. The loop itself
    /// never blocks on a dispatch — see [`Self::dispatch_tick`].
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        if *state == SchedulerState::Running {
            return Err(SchedulerError::AlreadyRunning);
        }
        *state = SchedulerState::Running;
        drop(state);

        let (tx, rx) = oneshot::channel();
        *self.shutdown_tx.lock() = Some(tx);

        let scheduler = self.clone();
        let handle = tokio::spawn(async move { scheduler.run_loop(rx).await });
        *self.join_handle.lock() = Some(handle);
        Ok(())
    }

    /// Signal the loop to exit and wait for it to return. In-flight NPC
    /// dispatch tasks are not cancelled — they may complete (or time out)
    /// after this returns; a caller that needs a fully quiescent state must
    /// also drop every `Arc` referencing the registry.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let tx = self.shutdown_tx.lock().take().ok_or(SchedulerError::NotRunning)?;
        let _ = tx.send(());

        let handle = self.join_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        *self.state.lock() = SchedulerState::Stopped;
        Ok(())
    }

    async fn run_loop(self: Arc<Self>, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.tick_rate);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tick += 1;
                    // Fire-and-forget: handles are dropped, never awaited here.
                    let _ = self.dispatch_tick(tick);
                }
                _ = &mut shutdown => {
                    info!("scheduler loop exiting");
                    break;
                }
            }
        }
    }

    /// Run one tick and await every task it dispatched before returning.
    /// Production code never calls this — `run_loop` calls
    /// [`Self::dispatch_tick`] directly and discards the handles so a slow
    /// NPC can never delay the next tick — but it gives tests a
    /// deterministic point to assert post-dispatch world state from.
    pub async fn tick_once(&self, tick: u64) -> usize {
        let handles = self.dispatch_tick(tick);
        let count = handles.len();
        for handle in handles {
            let _ = handle.await;
        }
        count
    }

    /// Reaction Phase for every active instance, plus the Autonomous Phase
    /// when `tick` lands on an `idle_interval` boundary. Returns the spawned
    /// tasks' handles without awaiting them — bounded wall time per tick is
    /// the whole point.
    #[instrument(skip(self))]
    fn dispatch_tick(&self, tick: u64) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        let has_npc_admin = self.pool.has_role(AgentRole::NpcAdmin);

        for instance in self.registry.list() {
            let status = instance.status();
            if status == InstanceStatus::Stopped {
                // A stopped instance's queue must be empty (invariant f); a
                // deleted instance is already cleared by the registry, but a
                // merely-stopped one keeps accumulating published events
                // until the Scheduler observes it here.
                self.registry.event_bus().clear_instance(&instance.instance_id);
                continue;
            }
            if status != InstanceStatus::Active || !has_npc_admin {
                continue;
            }

            let reacted = self.spawn_reaction_phase(&instance, &mut handles);

            if tick % self.config.idle_interval == 0 {
                self.spawn_autonomous_phase(&instance, &reacted, &mut handles);
            }
        }
        handles
    }

    /// Drain the instance's event queue, group by resolved live `npc`
    /// target (discarding events with no resolvable/live NPC), and spawn one
    /// `npc_reaction` dispatch per NPC with at least one event this tick.
    /// Returns the set of NPCs covered, so the Autonomous Phase can skip
    /// them.
    fn spawn_reaction_phase(&self, instance: &Arc<Instance<C>>, handles: &mut Vec<JoinHandle<()>>) -> HashSet<EntityId> {
        let events = self.registry.event_bus().drain_instance(&instance.instance_id);
        let mut batches: HashMap<EntityId, Vec<GameEvent>> = HashMap::new();
        for event in events {
            let Some(npc_id) = event.npc_id().map(EntityId::new) else {
                continue;
            };
            let is_live_npc =
                instance.with_world(|world| world.entity(&npc_id).map(|e| e.kind == EntityKind::Npc).unwrap_or(false));
            if !is_live_npc {
                continue;
            }
            batches.entry(npc_id).or_default().push(event);
        }

        let reacted: HashSet<EntityId> = batches.keys().cloned().collect();
        for (npc_id, events) in batches {
            if let Some(request) = self.build_reaction_request(instance, &npc_id, events) {
                handles.push(self.spawn_dispatch(instance.clone(), npc_id, request));
            }
        }
        reacted
    }

    /// Every `idle_interval` ticks, dispatch `npc_idle` to every `npc`
    /// entity the Reaction Phase didn't already cover this tick.
    fn spawn_autonomous_phase(&self, instance: &Arc<Instance<C>>, reacted: &HashSet<EntityId>, handles: &mut Vec<JoinHandle<()>>) {
        let idle_npcs: Vec<EntityId> = instance.with_world(|world| {
            world
                .entities()
                .filter(|e| e.kind == EntityKind::Npc && !reacted.contains(&e.id))
                .map(|e| e.id.clone())
                .collect()
        });

        for npc_id in idle_npcs {
            if let Some(request) = self.build_idle_request(instance, &npc_id) {
                handles.push(self.spawn_dispatch(instance.clone(), npc_id, request));
            }
        }
    }

    fn build_reaction_request(&self, instance: &Instance<C>, npc_id: &EntityId, events: Vec<GameEvent>) -> Option<AgentRequest> {
        instance.with_world(|world| {
            let npc = world.entity(npc_id)?;
            let mut request = AgentRequest::new(instance.instance_id.clone(), "npc_reaction")
                .with_context("npc_id", npc_id.to_string())
                .with_context("npc_trust", serde_json::json!(npc.trust()))
                .with_context("events", serde_json::json!(events))
                .with_context("instance_id", instance.instance_id.to_string());
            request = Self::with_npc_identity(request, npc);
            Some(request)
        })
    }

    fn build_idle_request(&self, instance: &Instance<C>, npc_id: &EntityId) -> Option<AgentRequest> {
        instance.with_world(|world| {
            let npc = world.entity(npc_id)?;
            let mut request = AgentRequest::new(instance.instance_id.clone(), "npc_idle")
                .with_context("npc_id", npc_id.to_string())
                .with_context("npc_trust", serde_json::json!(npc.trust()))
                .with_context("instance_id", instance.instance_id.to_string());
            request = Self::with_npc_identity(request, npc);
            Some(request)
        })
    }

    fn with_npc_identity(mut request: AgentRequest, npc: &oj_core::Entity) -> AgentRequest {
        if let Some(name) = npc.name() {
            request = request.with_context("npc_name", name.to_string());
        }
        if let Some(job) = npc.job() {
            request = request.with_context("npc_job", job.to_string());
        }
        if let Some(personality) = npc.personality() {
            request = request.with_context("npc_personality", personality.to_string());
        }
        request
    }

    fn spawn_dispatch(&self, instance: Arc<Instance<C>>, npc_id: EntityId, request: AgentRequest) -> JoinHandle<()> {
        let pool = self.pool.clone();
        let deadline = self.config.dispatch_deadline;
        let instance_id = instance.instance_id.clone();
        let action = request.action.clone();
        tokio::spawn(async move {
            let outcome = tokio::time::timeout(deadline, pool.request(AgentRole::NpcAdmin, request)).await;
            match outcome {
                Ok(Some(Ok(response))) => apply_npc_update(&instance, &npc_id, &response.payload),
                Ok(Some(Err(err))) => {
                    warn!(%instance_id, %npc_id, %action, error = %err, "npc dispatch failed");
                }
                Ok(None) => {}
                Err(_) => {
                    warn!(%instance_id, %npc_id, %action, "npc dispatch timed out, dropping response");
                }
            }
        })
    }
}

/// Apply a worker's reply to an NPC's properties: `trust_delta` (added,
/// clamped `[0,1]`), `mood`/`last_ai_message`/`patrol_target` (replace),
/// `health_delta` (added, clamped `[0, max_health]`). Unknown keys are
/// ignored. Runs inside `Instance::with_world`'s mutex, so the
/// read-modify-write is linearizable per NPC regardless of how many
/// concurrent dispatches are in flight for it.
pub fn apply_npc_update<C: Clock>(instance: &Instance<C>, npc_id: &EntityId, payload: &HashMap<String, serde_json::Value>) {
    instance.with_world(|world| {
        let Some(npc) = world.entity_mut(npc_id) else {
            return;
        };
        if let Some(delta) = payload.get("trust_delta").and_then(|v| v.as_f64()) {
            npc.adjust_trust(delta);
        }
        if let Some(mood) = payload.get("mood").and_then(|v| v.as_str()) {
            npc.set_property("mood", mood.to_string());
        }
        if let Some(message) = payload.get("last_ai_message").and_then(|v| v.as_str()) {
            npc.set_property("last_ai_message", message.to_string());
        }
        if let Some(patrol) = payload.get("patrol_target").and_then(|v| v.as_str()) {
            npc.set_property("patrol_target", patrol.to_string());
        }
        if let Some(delta) = payload.get("health_delta").and_then(|v| v.as_f64()) {
            let max_health = npc.property_u64("max_health").unwrap_or(100);
            let next = (npc.health() as f64 + delta).clamp(0.0, max_health as f64).round() as u64;
            npc.set_health(next, max_health);
        }
    });
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
