use super::*;
use crate::event_bus::EventBus;
use oj_core::test_support::{hazard_entity, npc_entity, player_entity};
use oj_core::{FakeClock, FixedRngSource};
use std::sync::Arc;

fn world_with(entities: Vec<oj_core::Entity>) -> WorldState<FakeClock> {
    let scenario = ScenarioTemplate::market_square();
    let mut world = WorldState::new(
        InstanceId::new("i1"),
        &scenario,
        Arc::new(EventBus::new()),
        FakeClock::new(),
    );
    for entity in entities {
        world.add_entity(entity).unwrap();
    }
    world
}

fn params(pairs: &[(&str, serde_json::Value)]) -> HashMap<String, serde_json::Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn unknown_verb_does_not_increment_turn() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![player_entity("p1", 400.0, 300.0)]);
    let err = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "teleport", &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, ActionError::UnknownVerb(_)));
    assert_eq!(world.turn(), 0);
}

#[test]
fn known_verb_that_fails_validation_still_advances_turn() {
    // An invalid direction is a soft failure on a *recognized* verb: dispatch
    // still returns Ok with success == false, and the turn still advances.
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![player_entity("p1", 400.0, 300.0)]);
    let (outcome, turn) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "move", &params(&[("direction", serde_json::json!("sideways"))]))
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(turn, 1);
    assert_eq!(world.turn(), 1);
}

#[test]
fn move_out_of_bounds_fails_but_still_increments() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![player_entity("p1", 2.0, 2.0)]);
    let (outcome, turn) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "move",
            &params(&[("direction", serde_json::json!("left")), ("distance", serde_json::json!(10.0))]),
        )
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(turn, 1);
}

#[test]
fn move_into_hazard_deals_damage() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![
        player_entity("p1", 100.0, 100.0),
        hazard_entity("h1", 100.0, 110.0, 25, 15.0),
    ]);
    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "move",
            &params(&[("direction", serde_json::json!("down")), ("distance", serde_json::json!(10.0))]),
        )
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(world.entity(&EntityId::new("p1")).unwrap().health(), 75);
}

#[test]
fn move_into_hazard_can_eliminate_player() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![
        player_entity("p1", 100.0, 100.0),
        hazard_entity("h1", 100.0, 110.0, 500, 15.0),
    ]);
    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "move",
            &params(&[("direction", serde_json::json!("down")), ("distance", serde_json::json!(10.0))]),
        )
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.contains("Eliminated"));
    assert_eq!(world.entity(&EntityId::new("p1")).unwrap().health(), 0);
}

#[test]
fn move_into_exit_marks_complete_with_score() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut exit = hazard_entity("e1", 100.0, 110.0, 0, 15.0);
    exit.kind = EntityKind::Store;
    exit.set_property("exit_marker", true);
    let mut world = world_with(vec![player_entity("p1", 100.0, 100.0), exit]);
    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "move",
            &params(&[("direction", serde_json::json!("down")), ("distance", serde_json::json!(10.0))]),
        )
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.update.get("completed"), Some(&serde_json::json!(true)));
}

#[test]
fn move_into_hazard_is_not_masked_by_a_closer_npc() {
    // An NPC sitting right at the destination point used to win the blocker
    // scan's `find` by being first in iteration order, hiding the hazard
    // that's also within range. The scan must skip non-hazard/non-exit
    // entities entirely so the hazard is still found.
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![
        player_entity("p1", 100.0, 100.0),
        npc_entity("npc-bystander", "merchant", 100.0, 110.0),
        hazard_entity("h1", 100.0, 110.0, 25, 15.0),
    ]);
    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "move",
            &params(&[("direction", serde_json::json!("down")), ("distance", serde_json::json!(10.0))]),
        )
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(world.entity(&EntityId::new("p1")).unwrap().health(), 75);
}

#[test]
fn verb_outside_scenarios_allowed_actions_is_rejected_but_still_advances_turn() {
    // market_square's allowed_actions omits `interact`; recognized verbs
    // outside that list soft-fail rather than panic or silently no-op, same
    // as any other known-but-invalid verb.
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![player_entity("p1", 400.0, 300.0)]);
    let (outcome, turn) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "interact", &params(&[("entity_id", serde_json::json!("p1"))]))
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(turn, 1);
    assert_eq!(world.turn(), 1);
}

#[test]
fn steal_success_governed_by_rng_and_guard_count() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut store = npc_entity("s1", "shopkeeper", 0.0, 0.0);
    store.kind = EntityKind::Store;
    store.set_property(
        "inventory",
        serde_json::json!({"ring": {"name": "Ring", "value": 100}}),
    );
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), store]);

    let (outcome, _) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "steal", &params(&[("store_id", serde_json::json!("s1")), ("item_id", serde_json::json!("ring"))]))
        .unwrap();
    assert!(outcome.success);
    let store = world.entity(&EntityId::new("s1")).unwrap();
    assert!(store.properties.get("inventory").unwrap().get("ring").is_none());
    let player = world.entity(&EntityId::new("p1")).unwrap();
    let inventory = player.properties.get("inventory").unwrap().as_array().unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].get("item_id").and_then(|v| v.as_str()), Some("ring"));
}

#[test]
fn steal_fails_when_rng_rolls_above_chance() {
    let engine = ActionEngine::new(FixedRngSource::always_fails());
    let mut store = npc_entity("s1", "shopkeeper", 0.0, 0.0);
    store.kind = EntityKind::Store;
    store.set_property(
        "inventory",
        serde_json::json!({"ring": {"name": "Ring", "value": 100}}),
    );
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), store]);

    let (outcome, _) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "steal", &params(&[("store_id", serde_json::json!("s1")), ("item_id", serde_json::json!("ring"))]))
        .unwrap();
    assert!(!outcome.success);
    // Failed theft costs the player health and leaves the item in the store.
    assert_eq!(world.entity(&EntityId::new("p1")).unwrap().health(), 80);
    let store = world.entity(&EntityId::new("s1")).unwrap();
    assert!(store.properties.get("inventory").unwrap().get("ring").is_some());
}

#[test]
fn negotiate_accepts_above_threshold() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut npc = npc_entity("n1", "merchant", 0.0, 0.0);
    npc.set_property("inventory", serde_json::json!({"vase": {"name": "Vase", "value": 100}}));
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), npc]);

    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "negotiate",
            &params(&[
                ("npc_id", serde_json::json!("n1")),
                ("item_id", serde_json::json!("vase")),
                ("offered_price", serde_json::json!(85.0)),
            ]),
        )
        .unwrap();
    assert!(outcome.success);
}

#[test]
fn negotiate_rejects_below_threshold() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut npc = npc_entity("n1", "merchant", 0.0, 0.0);
    npc.set_property("inventory", serde_json::json!({"vase": {"name": "Vase", "value": 100}}));
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), npc]);

    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "negotiate",
            &params(&[
                ("npc_id", serde_json::json!("n1")),
                ("item_id", serde_json::json!("vase")),
                ("offered_price", serde_json::json!(50.0)),
            ]),
        )
        .unwrap();
    assert!(!outcome.success);
}

#[test]
fn buy_deducts_gold_and_transfers_item() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut store = npc_entity("s1", "shopkeeper", 0.0, 0.0);
    store.kind = EntityKind::Store;
    store.set_property("inventory", serde_json::json!({"ring": {"name": "Ring", "value": 100}}));
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), store]);

    let (outcome, _) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "buy", &params(&[("store_id", serde_json::json!("s1")), ("item_id", serde_json::json!("ring"))]))
        .unwrap();
    assert!(outcome.success);
    assert_eq!(world.entity(&EntityId::new("p1")).unwrap().gold(), 400);
}

#[test]
fn buy_insufficient_gold_fails() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut player = player_entity("p1", 0.0, 0.0);
    player.set_gold(10);
    let mut store = npc_entity("s1", "shopkeeper", 0.0, 0.0);
    store.kind = EntityKind::Store;
    store.set_property("inventory", serde_json::json!({"ring": {"name": "Ring", "value": 100}}));
    let mut world = world_with(vec![player, store]);

    let (outcome, _) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "buy", &params(&[("store_id", serde_json::json!("s1")), ("item_id", serde_json::json!("ring"))]))
        .unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.contains("insufficient gold"));
}

#[test]
fn buy_target_item_completes_scenario() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut store = npc_entity("s1", "shopkeeper", 0.0, 0.0);
    store.kind = EntityKind::Store;
    store.set_property("inventory", serde_json::json!({"crown": {"name": "Crown", "value": 50}}));
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0), store]);
    world.set_property("target_item_id", "crown");

    let (outcome, _) = engine
        .dispatch(&mut world, &EntityId::new("p1"), 0, "buy", &params(&[("store_id", serde_json::json!("s1")), ("item_id", serde_json::json!("crown"))]))
        .unwrap();
    assert_eq!(outcome.update.get("completed"), Some(&serde_json::json!(true)));
}

#[test]
fn trade_accepts_when_fair_and_swaps_items() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut player = player_entity("p1", 0.0, 0.0);
    player.set_property("inventory", serde_json::json!([{"item_id": "dagger", "name": "Dagger", "value": 90}]));
    let mut npc = npc_entity("n1", "merchant", 0.0, 0.0);
    npc.set_property("inventory", serde_json::json!({"vase": {"name": "Vase", "value": 100}}));
    let mut world = world_with(vec![player, npc]);

    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "trade",
            &params(&[
                ("npc_id", serde_json::json!("n1")),
                ("give_item_id", serde_json::json!("dagger")),
                ("receive_item_id", serde_json::json!("vase")),
            ]),
        )
        .unwrap();
    assert!(outcome.success);

    let player = world.entity(&EntityId::new("p1")).unwrap();
    let inventory = player.properties.get("inventory").unwrap().as_array().unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].get("item_id").and_then(|v| v.as_str()), Some("vase"));

    let npc = world.entity(&EntityId::new("n1")).unwrap();
    let npc_inventory = npc.properties.get("inventory").unwrap().as_object().unwrap();
    assert!(npc_inventory.contains_key("dagger"));
    assert!(!npc_inventory.contains_key("vase"));
}

#[test]
fn trade_rejects_when_unfair() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut player = player_entity("p1", 0.0, 0.0);
    player.set_property("inventory", serde_json::json!([{"item_id": "pebble", "name": "Pebble", "value": 50}]));
    let mut npc = npc_entity("n1", "merchant", 0.0, 0.0);
    npc.set_property("inventory", serde_json::json!({"vase": {"name": "Vase", "value": 100}}));
    let mut world = world_with(vec![player, npc]);

    let (outcome, _) = engine
        .dispatch(
            &mut world,
            &EntityId::new("p1"),
            0,
            "trade",
            &params(&[
                ("npc_id", serde_json::json!("n1")),
                ("give_item_id", serde_json::json!("pebble")),
                ("receive_item_id", serde_json::json!("vase")),
            ]),
        )
        .unwrap();
    assert!(!outcome.success);
    // Declined trade leaves both inventories untouched.
    let player = world.entity(&EntityId::new("p1")).unwrap();
    let inventory = player.properties.get("inventory").unwrap().as_array().unwrap();
    assert_eq!(inventory[0].get("item_id").and_then(|v| v.as_str()), Some("pebble"));
}

#[test]
fn observe_returns_entities_sorted_by_distance() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![
        player_entity("p1", 0.0, 0.0),
        npc_entity("far", "merchant", 100.0, 0.0),
        npc_entity("near", "merchant", 10.0, 0.0),
    ]);
    let (outcome, _) = engine.dispatch(&mut world, &EntityId::new("p1"), 0, "observe", &HashMap::new()).unwrap();
    let entities = outcome.update.get("entities").unwrap().as_array().unwrap();
    assert_eq!(entities[0]["id"], serde_json::json!("near"));
    assert_eq!(entities[1]["id"], serde_json::json!("far"));
}

#[test]
fn talk_without_target_is_a_soft_failure() {
    let engine = ActionEngine::new(FixedRngSource::always_succeeds());
    let mut world = world_with(vec![player_entity("p1", 0.0, 0.0)]);
    let (outcome, turn) = engine.dispatch(&mut world, &EntityId::new("p1"), 0, "talk", &HashMap::new()).unwrap();
    assert!(!outcome.success);
    assert_eq!(turn, 1);
}
