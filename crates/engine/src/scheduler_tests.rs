use super::*;
use crate::event_bus::EventBus;
use crate::instance::InstanceRegistry;
use async_trait::async_trait;
use oj_adapters::fake::FakeAgentWorker;
use oj_adapters::{AgentError, AgentResponse, AgentWorker};
use oj_core::{test_support, FakeClock, SequentialIdGen, WorkerId};

fn registry() -> Arc<InstanceRegistry<FakeClock, SequentialIdGen>> {
    Arc::new(InstanceRegistry::new(FakeClock::new(), SequentialIdGen::new("inst"), Arc::new(EventBus::new())))
}

fn active_instance(registry: &InstanceRegistry<FakeClock, SequentialIdGen>) -> Arc<Instance<FakeClock>> {
    let instance = registry.create("market_square").unwrap();
    instance.set_status(InstanceStatus::Active);
    instance
}

fn trust_delta_worker(delta: f64) -> Arc<FakeAgentWorker> {
    let worker = Arc::new(FakeAgentWorker::new(AgentRole::NpcAdmin));
    let mut response = AgentResponse::empty();
    response.payload.insert("trust_delta".to_string(), serde_json::json!(delta));
    worker.queue_response(response);
    worker
}

#[tokio::test]
async fn no_npc_admin_worker_skips_dispatch_entirely() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|w| w.log_event("talk", Default::default()));
    let pool = Arc::new(AgentPool::new());
    let scheduler = Scheduler::new(registry, pool, SchedulerConfig::default());

    let dispatched = scheduler.tick_once(1).await;
    assert_eq!(dispatched, 0);
}

#[tokio::test]
async fn generating_and_stopped_instances_are_skipped() {
    let registry = registry();
    let generating = registry.create("market_square").unwrap();
    let stopped = registry.create("market_square").unwrap();
    stopped.set_status(InstanceStatus::Stopped);
    let _ = &generating;

    let pool = Arc::new(AgentPool::new());
    pool.register(WorkerId::new("w1"), Arc::new(FakeAgentWorker::new(AgentRole::NpcAdmin))).await;
    let scheduler = Scheduler::new(registry, pool, SchedulerConfig::default());

    assert_eq!(scheduler.tick_once(1).await, 0);
}

/// Invariant (f): a stopped instance's event queue must be empty. Events
/// published after `stop()` (e.g. a race with an in-flight action) are
/// cleared the next time the tick loop observes the `Stopped` status.
#[tokio::test]
async fn stopped_instance_queue_is_cleared_on_next_tick() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|w| w.log_event("talk", Default::default()));
    instance.set_status(InstanceStatus::Stopped);
    assert_eq!(registry.event_bus().pending_count(&instance.instance_id), 1);

    let pool = Arc::new(AgentPool::new());
    let scheduler = Scheduler::new(registry.clone(), pool, SchedulerConfig::default());
    scheduler.tick_once(1).await;

    assert_eq!(registry.event_bus().pending_count(&instance.instance_id), 0);
}

/// End-to-end scenario 4: reaction fan-out. Three NPCs, two get events in
/// the same tick; after the tick, exactly those two trusts move and the
/// third is untouched.
#[tokio::test]
async fn reaction_fan_out_updates_only_npcs_with_events() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|world| {
        world.add_entity(test_support::npc_entity("npc-a", "shopkeeper", 10.0, 10.0)).unwrap();
        world.add_entity(test_support::npc_entity("npc-b", "guard", 20.0, 20.0)).unwrap();
        world.add_entity(test_support::npc_entity("npc-c", "merchant", 30.0, 30.0)).unwrap();
    });

    let mut talk = HashMap::new();
    talk.insert("npc_id".to_string(), serde_json::json!("npc-a"));
    instance.with_world(|w| w.log_event("talk", talk));
    let mut negotiate = HashMap::new();
    negotiate.insert("npc_id".to_string(), serde_json::json!("npc-b"));
    instance.with_world(|w| w.log_event("negotiate", negotiate));

    let pool = Arc::new(AgentPool::new());
    let worker = Arc::new(FakeAgentWorker::new(AgentRole::NpcAdmin));
    for _ in 0..2 {
        let mut response = AgentResponse::empty();
        response.payload.insert("trust_delta".to_string(), serde_json::json!(0.1));
        worker.queue_response(response);
    }
    pool.register(WorkerId::new("npc-admin-1"), worker.clone()).await;

    let scheduler = Scheduler::new(registry, pool, SchedulerConfig::default());
    let dispatched = scheduler.tick_once(1).await;

    assert_eq!(dispatched, 2);
    assert_eq!(worker.call_count(), 2);
    instance.with_world(|world| {
        assert!((world.entity(&EntityId::new("npc-a")).unwrap().trust() - 0.6).abs() < 1e-9);
        assert!((world.entity(&EntityId::new("npc-b")).unwrap().trust() - 0.6).abs() < 1e-9);
        assert!((world.entity(&EntityId::new("npc-c")).unwrap().trust() - 0.5).abs() < 1e-9);
    });
}

struct SlowWorker {
    delay: std::time::Duration,
}

#[async_trait]
impl AgentWorker for SlowWorker {
    fn role(&self) -> AgentRole {
        AgentRole::NpcAdmin
    }

    fn name(&self) -> &str {
        "slow-worker"
    }

    async fn handle_request(&self, _request: AgentRequest) -> Result<AgentResponse, AgentError> {
        tokio::time::sleep(self.delay).await;
        let mut response = AgentResponse::empty();
        response.payload.insert("trust_delta".to_string(), serde_json::json!(0.5));
        Ok(response)
    }
}

/// End-to-end scenario 5: timeout drop. A worker slower than the deadline
/// never gets its reply applied, and no error escapes the tick.
#[tokio::test]
async fn slow_worker_past_deadline_is_dropped_silently() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|world| {
        world.add_entity(test_support::npc_entity("npc-a", "shopkeeper", 10.0, 10.0)).unwrap();
    });
    let mut talk = HashMap::new();
    talk.insert("npc_id".to_string(), serde_json::json!("npc-a"));
    instance.with_world(|w| w.log_event("talk", talk));

    let pool = Arc::new(AgentPool::new());
    pool.register(
        WorkerId::new("slow"),
        Arc::new(SlowWorker { delay: std::time::Duration::from_millis(200) }),
    ).await;
    let config = SchedulerConfig { dispatch_deadline: std::time::Duration::from_millis(20), ..Default::default() };
    let scheduler = Scheduler::new(registry, pool, config);

    scheduler.tick_once(1).await;

    instance.with_world(|world| {
        assert!((world.entity(&EntityId::new("npc-a")).unwrap().trust() - 0.5).abs() < 1e-9);
    });
}

/// Events published to one instance never leak into another's dispatch.
#[tokio::test]
async fn instances_are_isolated() {
    let registry = registry();
    let instance_a = active_instance(&registry);
    let instance_b = active_instance(&registry);
    instance_a.with_world(|w| w.add_entity(test_support::npc_entity("npc-a", "guard", 0.0, 0.0)).unwrap());
    instance_b.with_world(|w| w.add_entity(test_support::npc_entity("npc-b", "guard", 0.0, 0.0)).unwrap());

    let mut data = HashMap::new();
    data.insert("npc_id".to_string(), serde_json::json!("npc-a"));
    instance_a.with_world(|w| w.log_event("talk", data));

    let pool = Arc::new(AgentPool::new());
    pool.register(WorkerId::new("w1"), trust_delta_worker(0.2)).await;
    let scheduler = Scheduler::new(registry, pool, SchedulerConfig::default());

    let dispatched = scheduler.tick_once(1).await;
    assert_eq!(dispatched, 1);
    instance_b.with_world(|world| {
        assert!((world.entity(&EntityId::new("npc-b")).unwrap().trust() - 0.5).abs() < 1e-9);
    });
}

/// Autonomous Phase: on an idle-interval tick, NPCs with no events this
/// tick still get an `npc_idle` dispatch.
#[tokio::test]
async fn autonomous_phase_covers_idle_npcs_on_boundary_tick() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|world| {
        world.add_entity(test_support::npc_entity("npc-a", "shopkeeper", 0.0, 0.0)).unwrap();
    });

    let pool = Arc::new(AgentPool::new());
    let worker = Arc::new(FakeAgentWorker::new(AgentRole::NpcAdmin));
    pool.register(WorkerId::new("w1"), worker.clone()).await;
    let config = SchedulerConfig { idle_interval: 1, ..Default::default() };
    let scheduler = Scheduler::new(registry, pool, config);

    let dispatched = scheduler.tick_once(1).await;
    assert_eq!(dispatched, 1);
    assert_eq!(worker.calls()[0].action, "npc_idle");
}

/// Off-boundary ticks with no queued events dispatch nothing.
#[tokio::test]
async fn non_boundary_tick_with_no_events_dispatches_nothing() {
    let registry = registry();
    let instance = active_instance(&registry);
    instance.with_world(|world| {
        world.add_entity(test_support::npc_entity("npc-a", "shopkeeper", 0.0, 0.0)).unwrap();
    });

    let pool = Arc::new(AgentPool::new());
    pool.register(WorkerId::new("w1"), Arc::new(FakeAgentWorker::new(AgentRole::NpcAdmin))).await;
    let config = SchedulerConfig { idle_interval: 30, ..Default::default() };
    let scheduler = Scheduler::new(registry, pool, config);

    assert_eq!(scheduler.tick_once(1).await, 0);
}

#[test]
fn apply_npc_update_clamps_trust_and_health() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    instance.with_world(|world| {
        let mut npc = test_support::npc_entity("npc-a", "guard", 0.0, 0.0);
        npc.set_property("trust", 0.95);
        npc.set_property("health", 10u64);
        world.add_entity(npc).unwrap();
    });

    let mut payload = HashMap::new();
    payload.insert("trust_delta".to_string(), serde_json::json!(0.5));
    payload.insert("health_delta".to_string(), serde_json::json!(-50.0));
    payload.insert("mood".to_string(), serde_json::json!("alarmed"));
    apply_npc_update(&instance, &EntityId::new("npc-a"), &payload);

    instance.with_world(|world| {
        let npc = world.entity(&EntityId::new("npc-a")).unwrap();
        assert!((npc.trust() - 1.0).abs() < 1e-9);
        assert_eq!(npc.health(), 0);
        assert_eq!(npc.mood(), Some("alarmed"));
    });
}

#[tokio::test]
async fn start_stop_lifecycle_transitions_state() {
    let registry = registry();
    let pool = Arc::new(AgentPool::new());
    let scheduler = Scheduler::new(registry, pool, SchedulerConfig { tick_rate: Duration::from_millis(5), ..Default::default() });

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    scheduler.start().unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Running);
    assert!(matches!(scheduler.start().unwrap_err(), SchedulerError::AlreadyRunning));

    scheduler.stop().await.unwrap();
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert!(matches!(scheduler.stop().await.unwrap_err(), SchedulerError::NotRunning));
}
