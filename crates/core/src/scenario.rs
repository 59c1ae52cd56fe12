// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario templates: generation constraints an AI scenario-generator
//! agent uses to populate a fresh instance, plus the one built-in template
//! (`market_square`) the Generator falls back to when no agent is
//! available or the agent's output can't be parsed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Actions a player (or NPC acting through the same engine) can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVerb {
    Move,
    Observe,
    Talk,
    Negotiate,
    Buy,
    Hire,
    Steal,
    Trade,
    Interact,
}

impl ActionVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionVerb::Move => "move",
            ActionVerb::Observe => "observe",
            ActionVerb::Talk => "talk",
            ActionVerb::Negotiate => "negotiate",
            ActionVerb::Buy => "buy",
            ActionVerb::Hire => "hire",
            ActionVerb::Steal => "steal",
            ActionVerb::Trade => "trade",
            ActionVerb::Interact => "interact",
        }
    }

    /// Parse a verb string, returning `None` for anything unrecognized.
    /// Callers use this to distinguish "unknown verb" (no turn increment)
    /// from "known verb that failed validation" (turn still increments).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "move" => Some(ActionVerb::Move),
            "observe" => Some(ActionVerb::Observe),
            "talk" => Some(ActionVerb::Talk),
            "negotiate" => Some(ActionVerb::Negotiate),
            "buy" => Some(ActionVerb::Buy),
            "hire" => Some(ActionVerb::Hire),
            "steal" => Some(ActionVerb::Steal),
            "trade" => Some(ActionVerb::Trade),
            "interact" => Some(ActionVerb::Interact),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Generation constraints and rules for a scenario type. An AI scenario-
/// generator agent produces the concrete stores, NPCs, and items for an
/// instance within these bounds; the Generator falls back to a built-in
/// population (see [`ScenarioTemplate::market_square`]) when it can't.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    pub scenario_id: String,
    pub name: String,
    pub description: String,
    pub difficulty: String,
    pub world_width: f64,
    pub world_height: f64,
    pub max_turns: u32,
    pub starting_gold: u32,
    pub num_stores: (u32, u32),
    pub num_npcs: (u32, u32),
    pub num_items: (u32, u32),
    pub possible_npc_jobs: Vec<String>,
    pub item_rarity_distribution: HashMap<String, f64>,
    pub allowed_actions: Vec<ActionVerb>,
    pub starting_position: (f64, f64),
}

impl ScenarioTemplate {
    /// The one built-in scenario type: a market where the player must
    /// acquire a target item via negotiation, purchase, theft, or trade.
    pub fn market_square() -> Self {
        let mut item_rarity_distribution = HashMap::new();
        item_rarity_distribution.insert("common".to_string(), 0.5);
        item_rarity_distribution.insert("uncommon".to_string(), 0.3);
        item_rarity_distribution.insert("rare".to_string(), 0.15);
        item_rarity_distribution.insert("legendary".to_string(), 0.05);

        Self {
            scenario_id: "market_square".to_string(),
            name: "Dynamic Market Acquisition".to_string(),
            description: "Acquire a valuable item through negotiation, purchase, theft, \
                or trade in an AI-generated market of unique stores and NPCs."
                .to_string(),
            difficulty: "medium".to_string(),
            world_width: 800.0,
            world_height: 600.0,
            max_turns: 150,
            starting_gold: 500,
            num_stores: (3, 6),
            num_npcs: (4, 8),
            num_items: (10, 20),
            possible_npc_jobs: vec![
                "shopkeeper".to_string(),
                "guard".to_string(),
                "thief".to_string(),
                "merchant".to_string(),
                "information_broker".to_string(),
                "bouncer".to_string(),
                "wealthy_collector".to_string(),
                "fence".to_string(),
            ],
            item_rarity_distribution,
            allowed_actions: vec![
                ActionVerb::Move,
                ActionVerb::Talk,
                ActionVerb::Negotiate,
                ActionVerb::Buy,
                ActionVerb::Hire,
                ActionVerb::Steal,
                ActionVerb::Trade,
                ActionVerb::Observe,
            ],
            starting_position: (400.0, 300.0),
        }
    }
}

/// Registry of available scenario templates. Just `market_square` today;
/// additional templates would register here as further match arms.
pub struct ScenarioManager;

impl ScenarioManager {
    pub fn get_template(scenario_id: &str) -> Option<ScenarioTemplate> {
        match scenario_id {
            "market_square" => Some(ScenarioTemplate::market_square()),
            _ => None,
        }
    }

    pub fn template_exists(scenario_id: &str) -> bool {
        scenario_id == "market_square"
    }

    pub fn all_templates() -> Vec<ScenarioTemplate> {
        vec![ScenarioTemplate::market_square()]
    }
}

#[cfg(test)]
#[path = "scenario_tests.rs"]
mod tests;
