use super::*;

fn event(instance_id: &str, event_type: &str) -> GameEvent {
    GameEvent {
        instance_id: instance_id.to_string(),
        event_type: event_type.to_string(),
        data: Default::default(),
        x: 0.0,
        y: 0.0,
        timestamp_ms: 0,
    }
}

#[test]
fn publish_then_drain_in_order() {
    let bus = EventBus::new();
    let id = InstanceId::new("i1");
    bus.publish(&id, event("i1", "talk"));
    bus.publish(&id, event("i1", "steal_attempt"));

    assert_eq!(bus.pending_count(&id), 2);
    let drained = bus.drain_instance(&id);
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].event_type, "talk");
    assert_eq!(drained[1].event_type, "steal_attempt");
    assert_eq!(bus.pending_count(&id), 0);
}

#[test]
fn drain_unknown_instance_is_empty() {
    let bus = EventBus::new();
    let id = InstanceId::new("missing");
    assert!(bus.drain_instance(&id).is_empty());
}

#[test]
fn clear_instance_drops_backlog() {
    let bus = EventBus::new();
    let id = InstanceId::new("i1");
    bus.publish(&id, event("i1", "talk"));
    bus.clear_instance(&id);
    assert_eq!(bus.pending_count(&id), 0);
}

#[test]
fn all_pending_only_lists_nonempty_queues() {
    let bus = EventBus::new();
    let a = InstanceId::new("a");
    let b = InstanceId::new("b");
    bus.publish(&a, event("a", "talk"));
    bus.publish(&b, event("b", "talk"));
    bus.drain_instance(&b);

    let pending = bus.all_pending();
    assert_eq!(pending, vec![a]);
}

#[test]
fn backlog_has_no_upper_bound() {
    let bus = EventBus::new();
    let id = InstanceId::new("i1");
    let total = 2_000;
    for n in 0..total {
        bus.publish(&id, event("i1", &format!("event_{n}")));
    }
    assert_eq!(bus.pending_count(&id), total);
    let drained = bus.drain_instance(&id);
    assert_eq!(drained.len(), total);
    assert_eq!(drained[0].event_type, "event_0");
}
