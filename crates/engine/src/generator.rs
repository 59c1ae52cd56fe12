// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Populates a freshly created instance's world. Tries the
//! `scenario_generator` role via the `AgentPool` first; on any failure or
//! an unparseable reply, falls back to a deterministic built-in population
//! so the invariants in the test suite are exercisable without a live LLM
//! connected.

use crate::action_engine::insert_inventory_item;
use crate::instance::{Instance, InstanceStatus};
use oj_core::{Clock, Entity, EntityId, EntityKind, ItemRecord, ScenarioTemplate};
use oj_adapters::{AgentPool, AgentRequest, AgentRole};
use tracing::warn;

/// Drive generation for `instance`, which must currently be in the
/// `Generating` status. Always ends with `status == Active` — there's no
/// retry path, only fallback.
///
/// Dispatches the four-action sequence `generate_stores`, `generate_npcs`,
/// `generate_items`, `generate_target_item`, feeding each result into the
/// world: stores and NPCs become entities, items are attached to the
/// generated stores' inventories, and the target item's id lands at
/// `world.target_item_id`. Any step failing or returning an unparseable
/// reply falls the *entire* population back to [`fallback_population`] —
/// a partial AI population with a hand-built remainder would mix two
/// generators' ids and is not worth the complexity.
pub async fn generate<C: Clock>(instance: &Instance<C>, scenario: &ScenarioTemplate, pool: &AgentPool) {
    let stores = dispatch_entities(instance, pool, scenario, "generate_stores").await;
    let npcs = dispatch_entities(instance, pool, scenario, "generate_npcs").await;

    let (mut entities, target_item_id, fell_back) = match (stores, npcs) {
        (Some(mut stores), Some(npcs)) => {
            let items = dispatch_items(instance, pool, scenario).await;
            match items {
                Some(items) => {
                    attach_items_to_stores(&mut stores, items);
                    let target = dispatch_target_item(instance, pool, scenario)
                        .await
                        .unwrap_or_else(|| FALLBACK_TARGET_ITEM_ID.to_string());
                    let entities = stores.into_iter().chain(npcs).collect();
                    (entities, target, false)
                }
                None => (fallback_population(scenario), FALLBACK_TARGET_ITEM_ID.to_string(), true),
            }
        }
        _ => (fallback_population(scenario), FALLBACK_TARGET_ITEM_ID.to_string(), true),
    };

    instance.with_world(|world| {
        for entity in entities.drain(..) {
            // Generator output may legitimately collide on ids across retries;
            // a duplicate is dropped rather than treated as fatal.
            let _ = world.add_entity(entity);
        }
        world.set_property("target_item_id", target_item_id);
        if fell_back {
            world.log_event("generation_fallback", Default::default());
        }
        world.log_event("scenario_generated", Default::default());
    });

    instance.set_status(InstanceStatus::Active);
}

/// Dispatch one `scenario_generator` action and parse its `entities` array.
/// A connection failure, an error reply, or a shape mismatch all collapse
/// to `None` — the caller can't distinguish why, only that this step isn't
/// usable.
async fn dispatch_entities<C: Clock>(
    instance: &Instance<C>,
    pool: &AgentPool,
    scenario: &ScenarioTemplate,
    action: &'static str,
) -> Option<Vec<Entity>> {
    let request = AgentRequest::new(instance.instance_id.clone(), action)
        .with_context("scenario_id", scenario.scenario_id.clone())
        .with_context("num_stores", serde_json::json!(scenario.num_stores))
        .with_context("num_npcs", serde_json::json!(scenario.num_npcs))
        .with_context("num_items", serde_json::json!(scenario.num_items));

    match pool.request(AgentRole::ScenarioGenerator, request).await {
        Some(Ok(response)) => parse_generated_world(&response.payload),
        Some(Err(err)) => {
            warn!(instance_id = %instance.instance_id, error = %err, action, "scenario_generator call failed, falling back");
            None
        }
        None => None,
    }
}

/// Dispatch `generate_items`, parsed as a flat list of `(store_id, item)`
/// pairs — each item must carry its own `store_id` so it can be routed to
/// the right store after the stores themselves were already generated.
async fn dispatch_items<C: Clock>(
    instance: &Instance<C>,
    pool: &AgentPool,
    scenario: &ScenarioTemplate,
) -> Option<Vec<(String, ItemRecord)>> {
    let request = AgentRequest::new(instance.instance_id.clone(), "generate_items")
        .with_context("scenario_id", scenario.scenario_id.clone())
        .with_context("num_items", serde_json::json!(scenario.num_items));

    let response = match pool.request(AgentRole::ScenarioGenerator, request).await {
        Some(Ok(response)) => response,
        Some(Err(err)) => {
            warn!(instance_id = %instance.instance_id, error = %err, "generate_items call failed, falling back");
            return None;
        }
        None => return None,
    };

    let raw_items = response.payload.get("items")?.as_array()?;
    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        let store_id = raw.get("store_id")?.as_str()?.to_string();
        let item: ItemRecord = serde_json::from_value(raw.clone()).ok()?;
        items.push((store_id, item));
    }
    Some(items)
}

async fn dispatch_target_item<C: Clock>(
    instance: &Instance<C>,
    pool: &AgentPool,
    scenario: &ScenarioTemplate,
) -> Option<String> {
    let request = AgentRequest::new(instance.instance_id.clone(), "generate_target_item")
        .with_context("scenario_id", scenario.scenario_id.clone());
    match pool.request(AgentRole::ScenarioGenerator, request).await {
        Some(Ok(response)) => response.payload.get("target_item_id").and_then(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}

/// Interpret a scenario_generator reply's payload as a list of entities
/// under an `entities` key. Any shape mismatch is treated as a parse
/// failure (`None`), not a panic.
fn parse_generated_world(payload: &std::collections::HashMap<String, serde_json::Value>) -> Option<Vec<Entity>> {
    let raw_entities = payload.get("entities")?.as_array()?;
    let mut entities = Vec::with_capacity(raw_entities.len());
    for raw in raw_entities {
        entities.push(serde_json::from_value(raw.clone()).ok()?);
    }
    Some(entities)
}

/// Insert each generated item into its named store's inventory. An item
/// whose `store_id` doesn't match any generated store is dropped — the
/// scenario_generator's own bug, not something to invent a store for.
fn attach_items_to_stores(stores: &mut [Entity], items: Vec<(String, ItemRecord)>) {
    for (store_id, item) in items {
        if let Some(store) = stores.iter_mut().find(|s| s.id.to_string() == store_id) {
            let item_id = item.item_id.clone();
            let value = serde_json::to_value(&item).unwrap_or_else(|_| serde_json::json!({}));
            insert_inventory_item(store, &item_id, value);
        }
    }
}

/// A hand-built population grounded in the `market_square` template: two
/// stores, three NPCs (guard, shopkeeper, merchant), a handful of items
/// split across inventories, and a target item to acquire.
fn fallback_population(scenario: &ScenarioTemplate) -> Vec<Entity> {
    let (cx, cy) = scenario.starting_position;

    let mut general_store = Entity::new(EntityId::new("store-general"), EntityKind::Store, cx - 120.0, cy + 40.0)
        .with_property("name", "The Dusty Satchel")
        .with_property("pricing_multiplier", 1.0);
    insert_inventory_item(&mut general_store, "bread", serde_json::to_value(ItemRecord::new("bread", "Loaf of Bread", 5.0, "common")).unwrap());
    insert_inventory_item(&mut general_store, "rope", serde_json::to_value(ItemRecord::new("rope", "Coil of Rope", 12.0, "common")).unwrap());

    let mut curio_store = Entity::new(EntityId::new("store-curio"), EntityKind::Store, cx + 140.0, cy - 60.0)
        .with_property("name", "Vel's Curiosities")
        .with_property("pricing_multiplier", 1.4);
    insert_inventory_item(
        &mut curio_store,
        FALLBACK_TARGET_ITEM_ID,
        serde_json::to_value(ItemRecord::new(FALLBACK_TARGET_ITEM_ID, "Signet Ring", 220.0, "rare")).unwrap(),
    );

    let guard = Entity::new(EntityId::new("npc-guard"), EntityKind::Npc, cx + 150.0, cy - 55.0)
        .with_property("job", "guard")
        .with_property("name", "Garrick")
        .with_property("health", 100u64)
        .with_property("trust", 0.3);

    let shopkeeper = Entity::new(EntityId::new("npc-shopkeeper"), EntityKind::Npc, cx - 115.0, cy + 35.0)
        .with_property("job", "shopkeeper")
        .with_property("name", "Mira")
        .with_property("health", 100u64)
        .with_property("trust", 0.5);

    let merchant = Entity::new(EntityId::new("npc-merchant"), EntityKind::Npc, cx, cy + 10.0)
        .with_property("job", "merchant")
        .with_property("name", "Thom")
        .with_property("health", 100u64)
        .with_property("trust", 0.5);

    vec![general_store, curio_store, guard, shopkeeper, merchant]
}

/// The target item a built-in-generated instance expects the player to
/// acquire, matched to `fallback_population`'s curio store inventory.
pub const FALLBACK_TARGET_ITEM_ID: &str = "signet_ring";

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
