use super::*;
use oj_core::{FakeClock, SequentialIdGen};

fn registry() -> InstanceRegistry<FakeClock, SequentialIdGen> {
    InstanceRegistry::new(FakeClock::new(), SequentialIdGen::new("inst"), Arc::new(EventBus::new()))
}

#[test]
fn create_starts_in_generating_status() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    assert_eq!(instance.status(), InstanceStatus::Generating);
}

#[test]
fn create_unknown_scenario_errors() {
    let registry = registry();
    let err = registry.create("not_a_scenario").unwrap_err();
    assert!(matches!(err, RegistryError::UnknownScenario(_)));
}

#[test]
fn get_after_create_round_trips() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    let fetched = registry.get(&instance.instance_id).unwrap();
    assert_eq!(fetched.instance_id, instance.instance_id);
}

#[test]
fn get_unknown_instance_errors() {
    let registry = registry();
    let err = registry.get(&InstanceId::new("ghost")).unwrap_err();
    assert!(matches!(err, RegistryError::InstanceNotFound(_)));
}

#[test]
fn stop_flips_status() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    registry.stop(&instance.instance_id).unwrap();
    assert_eq!(instance.status(), InstanceStatus::Stopped);
}

#[test]
fn delete_removes_instance_and_clears_event_bus() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    instance.with_world(|world| {
        world.log_event("spawn", HashMap::new());
    });
    registry.delete(&instance.instance_id).unwrap();

    assert!(registry.get(&instance.instance_id).is_err());
    assert_eq!(registry.event_bus.pending_count(&instance.instance_id), 0);
}

#[test]
fn list_reflects_all_created_instances() {
    let registry = registry();
    registry.create("market_square").unwrap();
    registry.create("market_square").unwrap();
    assert_eq!(registry.list().len(), 2);
}

#[test]
fn restored_instance_can_be_inserted_and_looked_up() {
    let registry = registry();
    let scenario = oj_core::ScenarioTemplate::market_square();
    let world = crate::world::WorldState::new(InstanceId::new("restored-1"), &scenario, Arc::new(EventBus::new()), FakeClock::new());
    let restored = Arc::new(Instance::restore(
        InstanceId::new("restored-1"),
        "market_square".to_string(),
        world,
        InstanceStatus::Active,
        vec![EntityId::new("p1")],
        123,
    ));

    registry.insert_restored(restored.clone()).unwrap();
    let fetched = registry.get(&InstanceId::new("restored-1")).unwrap();
    assert_eq!(fetched.status(), InstanceStatus::Active);
    assert_eq!(fetched.player_ids(), vec![EntityId::new("p1")]);
}

#[test]
fn insert_restored_rejects_duplicate_id() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    let scenario = oj_core::ScenarioTemplate::market_square();
    let world = crate::world::WorldState::new(instance.instance_id.clone(), &scenario, Arc::new(EventBus::new()), FakeClock::new());
    let duplicate = Arc::new(Instance::restore(instance.instance_id.clone(), "market_square".to_string(), world, InstanceStatus::Active, vec![], 0));

    let err = registry.insert_restored(duplicate).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateInstance(_)));
}

#[test]
fn add_player_is_idempotent() {
    let registry = registry();
    let instance = registry.create("market_square").unwrap();
    instance.add_player(EntityId::new("p1"));
    instance.add_player(EntityId::new("p1"));
    assert_eq!(instance.player_ids().len(), 1);
}
