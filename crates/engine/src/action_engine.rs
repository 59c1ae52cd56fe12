// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatches a player's action verb against a `WorldState`, mutating it and
//! returning an outcome. Stateless itself beyond the injected randomness
//! source `steal` needs — every call takes the world and session turn it
//! operates on as arguments.

use crate::error::ActionError;
use crate::world::WorldState;
use oj_core::{Clock, EntityId, EntityKind, RngSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of a single dispatched action: a `(success, message, update)`
/// triple, plus an optional condensed summary a caller can forward into
/// logging/observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub update: HashMap<String, serde_json::Value>,
    /// Set when the params carried a `prompt_summary` field — a hook for
    /// callers that want to record what prompted this action, without the
    /// engine itself owning a feed/store (explicitly out of scope).
    pub prompt_summary: Option<String>,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>, update: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            update,
            prompt_summary: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            update: HashMap::new(),
            prompt_summary: None,
        }
    }
}

pub struct ActionEngine<R: RngSource> {
    rng: R,
}

impl<R: RngSource> ActionEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Dispatch `verb` with `params` against `world` for `player_id`, at
    /// the given player's current `turn`. Returns the outcome and the new
    /// turn value the caller should persist on the session — the caller
    /// owns the turn counter (a session property, not the world's).
    ///
    /// Only a syntactically unknown verb is rejected with `Err` before the
    /// turn advances. Once a verb is recognized, every failure mode inside
    /// its handler (missing params, target not found, insufficient gold,
    /// ...) comes back as `Ok` with `ActionOutcome::success == false` — the
    /// turn still counts; only unknown verbs skip it.
    pub fn dispatch<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        turn: u32,
        verb: &str,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<(ActionOutcome, u32), ActionError> {
        use oj_core::ActionVerb;

        let Some(action) = ActionVerb::parse(verb) else {
            return Err(ActionError::UnknownVerb(verb.to_string()));
        };

        let next_turn = turn + 1;
        world.increment_turn();

        if !world.is_action_allowed(action.as_str()) {
            let mut outcome = ActionOutcome::fail(format!("'{}' is not allowed in this scenario", action.as_str()));
            let health = world.entity(player_id).map(|e| e.health());
            outcome.update.insert(
                "stats".to_string(),
                serde_json::json!({
                    "turn": next_turn,
                    "health": health,
                }),
            );
            return Ok((outcome, next_turn));
        }

        let result = match action {
            ActionVerb::Move => self.handle_move(world, player_id, params),
            ActionVerb::Observe => self.handle_observe(world, player_id, params),
            ActionVerb::Talk => self.handle_talk(world, params),
            ActionVerb::Negotiate => self.handle_negotiate(world, params),
            ActionVerb::Buy => self.handle_buy(world, player_id, params),
            ActionVerb::Hire => self.handle_hire(world, player_id, params),
            ActionVerb::Steal => self.handle_steal(world, player_id, params),
            ActionVerb::Trade => self.handle_trade(world, player_id, params),
            ActionVerb::Interact => self.handle_interact(world, params),
        };
        let mut outcome = result.unwrap_or_else(|err| ActionOutcome::fail(err.to_string()));

        if let Some(summary) = params.get("prompt_summary").and_then(|v| v.as_str()) {
            outcome.prompt_summary = Some(summary.to_string());
        }

        let health = world.entity(player_id).map(|e| e.health());
        outcome.update.insert(
            "stats".to_string(),
            serde_json::json!({
                "turn": next_turn,
                "health": health,
            }),
        );

        Ok((outcome, next_turn))
    }

    fn resolve_target<C: Clock>(
        world: &WorldState<C>,
        params: &HashMap<String, serde_json::Value>,
    ) -> Option<EntityId> {
        ["npc_id", "store_id", "entity_id"]
            .iter()
            .find_map(|key| params.get(*key).and_then(|v| v.as_str()))
            .map(EntityId::new)
            .filter(|id| world.entity(id).is_some())
    }

    fn handle_move<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let direction = params
            .get("direction")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("direction"))?;
        let (dx, dy) = match direction {
            "up" => (0.0, -1.0),
            "down" => (0.0, 1.0),
            "left" => (-1.0, 0.0),
            "right" => (1.0, 0.0),
            other => return Err(ActionError::InvalidDirection(other.to_string())),
        };
        let distance = params.get("distance").and_then(|v| v.as_f64()).unwrap_or(10.0);

        let (current_x, current_y) = {
            let player = world.entity(player_id).ok_or(ActionError::PlayerNotFound)?;
            (player.x, player.y)
        };
        let new_x = current_x + dx * distance;
        let new_y = current_y + dy * distance;

        if new_x < 0.0 || new_x > world.world_width() || new_y < 0.0 || new_y > world.world_height() {
            return Ok(ActionOutcome::fail("Movement out of world bounds"));
        }

        // Only hazards and scenario exits can block a move; an NPC, store, or
        // other player standing in range must not mask one of those that's
        // also in range, so the scan is filtered before taking the first hit.
        let blocker = world
            .entities()
            .find(|entity| {
                entity.id != *player_id
                    && (entity.kind == EntityKind::Hazard || entity.property_str("exit_marker").is_some())
                    && ((new_x - entity.x).powi(2) + (new_y - entity.y).powi(2)).sqrt()
                        < entity.property_f64("radius").unwrap_or(15.0)
            })
            .map(|entity| (entity.id.clone(), entity.kind));

        if let Some((entity_id, kind)) = blocker {
            if kind == EntityKind::Hazard {
                let damage = world.entity(&entity_id).and_then(|e| e.property_u64("damage")).unwrap_or(10);
                let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
                let max_health = player.property_u64("max_health").unwrap_or(100);
                let new_health = player.health().saturating_sub(damage);
                player.set_health(new_health, max_health);

                let mut data = HashMap::new();
                data.insert("entity_id".to_string(), serde_json::json!(entity_id.to_string()));
                data.insert("damage".to_string(), serde_json::json!(damage));
                world.log_event("hazard_hit", data);

                if new_health == 0 {
                    return Ok(ActionOutcome::fail(format!(
                        "Eliminated by hazard '{entity_id}'. Health reached 0."
                    )));
                }
                return Ok(ActionOutcome::fail(format!(
                    "Hit hazard '{entity_id}'! Health: {new_health}"
                )));
            }

            // Scenario-authored exits are stores tagged `exit_marker`; oj_core's
            // EntityKind only covers the four kinds entities actually need to be.
            let is_exit = world
                .entity(&entity_id)
                .map(|e| e.property_str("exit_marker").is_some())
                .unwrap_or(false);
            if is_exit {
                let turns_used = world.turn();
                let max_turns = world.max_turns().max(1);
                let score = (100.0 - (turns_used as f64 / max_turns as f64) * 50.0).max(0.0);

                let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
                player.x = new_x;
                player.y = new_y;
                player.set_property("score", score);

                let mut data = HashMap::new();
                data.insert("entity_id".to_string(), serde_json::json!(entity_id.to_string()));
                data.insert("score".to_string(), serde_json::json!(score));
                world.log_event("exit_reached", data);

                let mut update = HashMap::new();
                update.insert("score".to_string(), serde_json::json!(score));
                let mut outcome = ActionOutcome::ok(format!("Exit reached via '{entity_id}'! Scenario complete."), update);
                outcome.update.insert("completed".to_string(), serde_json::json!(true));
                return Ok(outcome);
            }
        }

        let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
        player.x = new_x;
        player.y = new_y;
        let mut update = HashMap::new();
        update.insert("position".to_string(), serde_json::json!({"x": new_x, "y": new_y}));
        Ok(ActionOutcome::ok(format!("Moved {direction} to ({new_x}, {new_y})"), update))
    }

    fn handle_observe<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let radius = params.get("radius").and_then(|v| v.as_f64()).unwrap_or(150.0);
        let (px, py) = {
            let player = world.entity(player_id).ok_or(ActionError::PlayerNotFound)?;
            (player.x, player.y)
        };

        let mut nearby: Vec<_> = world
            .entities()
            .filter(|e| e.id != *player_id)
            .map(|e| {
                let dist = ((e.x - px).powi(2) + (e.y - py).powi(2)).sqrt();
                (dist, e)
            })
            .filter(|(dist, _)| *dist <= radius)
            .collect();
        nearby.sort_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let entities: Vec<serde_json::Value> = nearby
            .iter()
            .map(|(dist, e)| {
                serde_json::json!({
                    "id": e.id.to_string(),
                    "type": e.kind.to_string(),
                    "distance": (*dist * 10.0).round() / 10.0,
                    "position": {"x": e.x, "y": e.y},
                    "properties": e.properties,
                })
            })
            .collect();

        let mut update = HashMap::new();
        let count = entities.len();
        update.insert("entities".to_string(), serde_json::json!(entities));
        update.insert("agent_position".to_string(), serde_json::json!({"x": px, "y": py}));
        Ok(ActionOutcome::ok(format!("Observed {count} entities within radius {radius}"), update))
    }

    fn handle_talk<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let npc_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let message = params.get("message").and_then(|v| v.as_str()).unwrap_or("");

        let mut data = HashMap::new();
        data.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        data.insert("message".to_string(), serde_json::json!(message));
        world.log_event("talk", data);

        let npc = world.entity(&npc_id).ok_or(ActionError::TargetNotFound)?;
        let response = npc
            .property_str("default_response")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} acknowledges you.", npc.property_str("name").unwrap_or(npc_id.as_str())));

        let mut update = HashMap::new();
        update.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        update.insert("npc_response".to_string(), serde_json::json!(response));
        Ok(ActionOutcome::ok(response, update))
    }

    fn handle_negotiate<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let npc_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let item_id = params
            .get("item_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("item_id"))?;
        let offered_price = params
            .get("offered_price")
            .and_then(|v| v.as_f64())
            .ok_or(ActionError::MissingParam("offered_price"))?;

        let mut data = HashMap::new();
        data.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        data.insert("item_id".to_string(), serde_json::json!(item_id));
        data.insert("offered_price".to_string(), serde_json::json!(offered_price));
        world.log_event("negotiate", data);

        let npc = world.entity(&npc_id).ok_or(ActionError::TargetNotFound)?;
        let multiplier = npc.property_f64("pricing_multiplier").unwrap_or(1.0);
        let base = inventory_item_value(npc, item_id).ok_or_else(|| ActionError::ItemNotFound(item_id.to_string()))? * multiplier;
        let accepted = offered_price >= base * 0.8;

        let mut update = HashMap::new();
        update.insert("accepted".to_string(), serde_json::json!(accepted));
        update.insert("item_id".to_string(), serde_json::json!(item_id));
        update.insert("counter_price".to_string(), serde_json::json!(base.round()));
        let message = if accepted {
            format!("Offer accepted at {offered_price} gold.")
        } else {
            format!("Offer refused. Counter-price: {} gold.", base.round())
        };
        Ok(ActionOutcome { success: accepted, message, update, prompt_summary: None })
    }

    fn handle_buy<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let store_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let item_id = params
            .get("item_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("item_id"))?
            .to_string();

        let (price, item_value) = {
            let store = world.entity(&store_id).ok_or(ActionError::TargetNotFound)?;
            let multiplier = store.property_f64("pricing_multiplier").unwrap_or(1.0);
            let value = inventory_item_value(store, &item_id).ok_or_else(|| ActionError::ItemNotFound(item_id.clone()))?;
            ((value * multiplier).round() as u64, value)
        };

        let gold = world.entity(player_id).ok_or(ActionError::PlayerNotFound)?.gold();
        if gold < price {
            return Err(ActionError::InsufficientGold { need: price, have: gold });
        }

        let item = remove_inventory_item(world.entity_mut(&store_id).ok_or(ActionError::TargetNotFound)?, &item_id)
            .ok_or_else(|| ActionError::ItemNotFound(item_id.clone()))?;

        let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
        player.set_gold(gold - price);
        append_inventory_item(player, &item_id, item.clone());

        let mut data = HashMap::new();
        data.insert("store_id".to_string(), serde_json::json!(store_id.to_string()));
        data.insert("item_id".to_string(), serde_json::json!(item_id));
        data.insert("price".to_string(), serde_json::json!(price));
        world.log_event("buy", data);

        let target = world.target_item_id();
        let mut completed = false;
        if target.as_deref() == Some(item_id.as_str()) {
            let max_turns = world.max_turns().max(1);
            let turn = world.turn();
            let score = (100.0 - (turn as f64 / max_turns as f64) * 30.0).max(0.0);
            let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
            player.set_property("score", score);
            completed = true;
        }
        let _ = item_value;

        let gold_remaining = world.entity(player_id).map(|e| e.gold()).unwrap_or(0);
        let mut update = HashMap::new();
        update.insert("item".to_string(), item.clone());
        update.insert("gold_remaining".to_string(), serde_json::json!(gold_remaining));
        update.insert("completed".to_string(), serde_json::json!(completed));
        let name = item.get("name").and_then(|v| v.as_str()).unwrap_or(&item_id).to_string();
        Ok(ActionOutcome::ok(format!("Bought '{name}' for {price} gold."), update))
    }

    fn handle_hire<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let npc_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let cost = world
            .entity(&npc_id)
            .and_then(|e| e.property_u64("hiring_cost"))
            .ok_or_else(|| ActionError::NotHireable(npc_id.to_string()))?;

        let gold = world.entity(player_id).ok_or(ActionError::PlayerNotFound)?.gold();
        if gold < cost {
            return Err(ActionError::InsufficientGold { need: cost, have: gold });
        }

        world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?.set_gold(gold - cost);
        let player_id_str = player_id.to_string();
        world.entity_mut(&npc_id).ok_or(ActionError::TargetNotFound)?.set_property("hired_by", player_id_str);

        let mut data = HashMap::new();
        data.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        data.insert("cost".to_string(), serde_json::json!(cost));
        world.log_event("hire", data);

        let name = world
            .entity(&npc_id)
            .and_then(|e| e.property_str("name"))
            .unwrap_or(npc_id.as_str())
            .to_string();
        let gold_remaining = world.entity(player_id).map(|e| e.gold()).unwrap_or(0);
        let mut update = HashMap::new();
        update.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        update.insert("gold_remaining".to_string(), serde_json::json!(gold_remaining));
        Ok(ActionOutcome::ok(format!("Hired '{name}' for {cost} gold."), update))
    }

    fn handle_steal<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let store_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let item_id = params
            .get("item_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("item_id"))?
            .to_string();

        let (store_x, store_y) = {
            let store = world.entity(&store_id).ok_or(ActionError::TargetNotFound)?;
            if inventory_item_value(store, &item_id).is_none() {
                return Err(ActionError::ItemNotFound(item_id));
            }
            (store.x, store.y)
        };

        let guards = world
            .entities()
            .filter(|e| {
                e.kind == EntityKind::Npc
                    && e.job() == Some("guard")
                    && ((e.x - store_x).powi(2) + (e.y - store_y).powi(2)).sqrt() < 100.0
            })
            .count();
        let success_chance: f64 = (0.7 - guards as f64 * 0.2).max(0.1);
        let success = self.rng.roll_success(success_chance);

        let mut data = HashMap::new();
        data.insert("store_id".to_string(), serde_json::json!(store_id.to_string()));
        data.insert("item_id".to_string(), serde_json::json!(item_id.clone()));
        data.insert("success".to_string(), serde_json::json!(success));
        data.insert("guards_nearby".to_string(), serde_json::json!(guards));
        world.log_event("steal_attempt", data);

        let mut update = HashMap::new();
        update.insert("success".to_string(), serde_json::json!(success));
        update.insert("item_id".to_string(), serde_json::json!(item_id.clone()));

        if !success {
            let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
            let max_health = player.property_u64("max_health").unwrap_or(100);
            let new_health = player.health().saturating_sub(20);
            player.set_health(new_health, max_health);
            update.insert("health".to_string(), serde_json::json!(new_health));
            return Ok(ActionOutcome { success: false, message: format!("Theft of '{item_id}' was noticed and foiled."), update, prompt_summary: None });
        }

        let item = remove_inventory_item(world.entity_mut(&store_id).ok_or(ActionError::TargetNotFound)?, &item_id)
            .ok_or_else(|| ActionError::ItemNotFound(item_id.clone()))?;
        let player = world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?;
        append_inventory_item(player, &item_id, item);

        Ok(ActionOutcome::ok(format!("Stole '{item_id}' without being caught."), update))
    }

    /// `give_item_id` comes from the player's own inventory (an ordered
    /// sequence), `receive_item_id` from the NPC's (a mapping keyed by
    /// item id). Accept iff `give.value >= 0.8 * receive.value`; on
    /// accept, swap the two items between inventories so no item is ever
    /// duplicated or lost.
    fn handle_trade<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        player_id: &EntityId,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let npc_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let give_item_id = params
            .get("give_item_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("give_item_id"))?
            .to_string();
        let receive_item_id = params
            .get("receive_item_id")
            .and_then(|v| v.as_str())
            .ok_or(ActionError::MissingParam("receive_item_id"))?
            .to_string();

        let give_value = {
            let player = world.entity(player_id).ok_or(ActionError::PlayerNotFound)?;
            player_inventory_item_value(player, &give_item_id).ok_or_else(|| ActionError::ItemNotFound(give_item_id.clone()))?
        };
        let receive_value = {
            let npc = world.entity(&npc_id).ok_or(ActionError::TargetNotFound)?;
            inventory_item_value(npc, &receive_item_id).ok_or_else(|| ActionError::ItemNotFound(receive_item_id.clone()))?
        };

        let accepted = give_value >= receive_value * 0.8;

        let mut data = HashMap::new();
        data.insert("npc_id".to_string(), serde_json::json!(npc_id.to_string()));
        data.insert("give_item_id".to_string(), serde_json::json!(give_item_id));
        data.insert("receive_item_id".to_string(), serde_json::json!(receive_item_id));
        data.insert("accepted".to_string(), serde_json::json!(accepted));
        world.log_event("trade", data);

        let mut update = HashMap::new();
        update.insert("accepted".to_string(), serde_json::json!(accepted));
        if !accepted {
            return Ok(ActionOutcome {
                success: false,
                message: "Trade declined — not a fair exchange.".to_string(),
                update,
                prompt_summary: None,
            });
        }

        let given = remove_player_inventory_item(world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?, &give_item_id)
            .ok_or_else(|| ActionError::ItemNotFound(give_item_id.clone()))?;
        let received = remove_inventory_item(world.entity_mut(&npc_id).ok_or(ActionError::TargetNotFound)?, &receive_item_id)
            .ok_or_else(|| ActionError::ItemNotFound(receive_item_id.clone()))?;

        insert_inventory_item(world.entity_mut(&npc_id).ok_or(ActionError::TargetNotFound)?, &give_item_id, given);
        append_inventory_item(world.entity_mut(player_id).ok_or(ActionError::PlayerNotFound)?, &receive_item_id, received);

        Ok(ActionOutcome::ok("Trade accepted.".to_string(), update))
    }

    fn handle_interact<C: Clock>(
        &self,
        world: &mut WorldState<C>,
        params: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let entity_id = Self::resolve_target(world, params).ok_or(ActionError::TargetNotFound)?;
        let mut data = HashMap::new();
        data.insert("entity_id".to_string(), serde_json::json!(entity_id.to_string()));
        world.log_event("interact", data);

        let mut update = HashMap::new();
        update.insert("entity_id".to_string(), serde_json::json!(entity_id.to_string()));
        Ok(ActionOutcome::ok(format!("Interacted with '{entity_id}'."), update))
    }
}

fn inventory_item_value(entity: &oj_core::Entity, item_id: &str) -> Option<f64> {
    entity
        .properties
        .get("inventory")?
        .get(item_id)?
        .get("value")
        .and_then(|v| v.as_f64())
        .or(Some(100.0))
}

fn remove_inventory_item(entity: &mut oj_core::Entity, item_id: &str) -> Option<serde_json::Value> {
    let inventory = entity.properties.get_mut("inventory")?.as_object_mut()?;
    inventory.remove(item_id)
}

/// Append an item record to the player's ordered-sequence inventory,
/// stamping `item_id` so later lookups (trade, resale) can find it again —
/// a mapping-style inventory's key doesn't otherwise survive the move.
fn append_inventory_item(entity: &mut oj_core::Entity, item_id: &str, mut item: serde_json::Value) {
    if let Some(obj) = item.as_object_mut() {
        obj.insert("item_id".to_string(), serde_json::json!(item_id));
    }
    let inventory = entity
        .properties
        .entry("inventory".to_string())
        .or_insert_with(|| serde_json::json!([]));
    if let Some(arr) = inventory.as_array_mut() {
        arr.push(item);
    } else {
        *inventory = serde_json::json!([item]);
    }
}

/// Insert an item record into a mapping-style inventory (NPC/store), keyed
/// by `item_id`. Mirrors `remove_inventory_item`'s shape.
pub(crate) fn insert_inventory_item(entity: &mut oj_core::Entity, item_id: &str, item: serde_json::Value) {
    let inventory = entity
        .properties
        .entry("inventory".to_string())
        .or_insert_with(|| serde_json::json!({}));
    if !inventory.is_object() {
        *inventory = serde_json::json!({});
    }
    if let Some(obj) = inventory.as_object_mut() {
        obj.insert(item_id.to_string(), item);
    }
}

/// Item value lookup against the player's ordered-sequence inventory
/// (distinct from `inventory_item_value`, which reads a mapping-style
/// inventory for NPCs/stores).
fn player_inventory_item_value(entity: &oj_core::Entity, item_id: &str) -> Option<f64> {
    let arr = entity.properties.get("inventory")?.as_array()?;
    let item = arr
        .iter()
        .find(|item| item.get("item_id").and_then(|v| v.as_str()) == Some(item_id))?;
    item.get("value").and_then(|v| v.as_f64()).or(Some(100.0))
}

/// Remove and return an item record from the player's ordered-sequence
/// inventory by `item_id`. `None` if not present.
fn remove_player_inventory_item(entity: &mut oj_core::Entity, item_id: &str) -> Option<serde_json::Value> {
    let arr = entity.properties.get_mut("inventory")?.as_array_mut()?;
    let index = arr
        .iter()
        .position(|item| item.get("item_id").and_then(|v| v.as_str()) == Some(item_id))?;
    Some(arr.remove(index))
}

#[cfg(test)]
#[path = "action_engine_tests.rs"]
mod tests;
