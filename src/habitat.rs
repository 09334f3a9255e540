use log::warn;
use serde::Serialize;

use crate::{
    catalog::{Quantities, RecipeCatalog, UsageState},
    conversion,
    events::{GameEvent, Reserve, Severity},
    inventory::{Inventory, ResourceLevel},
    mission::{MissionTracker, PartyProgress},
    scenario::{RecipeReuse, ReservesConfig, ResourcePolicy},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitatRules {
    pub resource_policy: ResourcePolicy,
    pub recipe_reuse: RecipeReuse,
    pub reserves: ReservesConfig,
}

/// All core game state. Mutated only through the conversion engine, the
/// tick systems and the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habitat {
    pub(crate) inventory: Inventory,
    pub(crate) catalog: RecipeCatalog,
    pub(crate) mission: MissionTracker,
    pub(crate) rules: HabitatRules,
    sol: u64,
    events: Vec<GameEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    pub input: Quantities,
    pub output: Quantities,
    pub power_cost: u64,
    pub water_cost: u64,
    pub usage: UsageState,
    pub produced: u64,
    pub can_execute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitatSnapshot {
    pub scenario: String,
    pub sol: u64,
    pub power: u64,
    pub water: u64,
    pub waste: Vec<ResourceLevel>,
    pub products: Vec<ResourceLevel>,
    pub recipes: Vec<RecipeView>,
    pub mission_started: bool,
    pub mission_completed: bool,
    pub party: PartyProgress,
}

impl Habitat {
    pub fn new(
        inventory: Inventory,
        catalog: RecipeCatalog,
        mission: MissionTracker,
        rules: HabitatRules,
    ) -> Self {
        Self {
            inventory,
            catalog,
            mission,
            rules,
            sol: 1,
            events: Vec::new(),
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn mission(&self) -> &MissionTracker {
        &self.mission
    }

    pub fn rules(&self) -> &HabitatRules {
        &self.rules
    }

    pub fn sol(&self) -> u64 {
        self.sol
    }

    pub(crate) fn advance_sol(&mut self) -> u64 {
        self.sol += 1;
        self.sol
    }

    pub fn party_progress(&self) -> PartyProgress {
        self.mission.party_progress(&self.inventory.products)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn extend_events(&mut self, events: impl IntoIterator<Item = GameEvent>) {
        self.events.extend(events);
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queues a warning for each reserve under a threshold. Cosmetic
    /// reserves never warn.
    pub(crate) fn check_reserves(&mut self) {
        if self.rules.resource_policy == ResourcePolicy::Cosmetic {
            return;
        }
        let levels = [
            (Reserve::Power, self.inventory.power()),
            (Reserve::Water, self.inventory.water()),
        ];
        for (resource, level) in levels {
            let severity = if level < self.rules.reserves.critical_warning {
                Severity::Critical
            } else if level < self.rules.reserves.low_warning {
                Severity::Low
            } else {
                continue;
            };
            warn!("{resource} reserve at {level} ({severity:?})");
            self.events.push(GameEvent::ResourceWarning {
                severity,
                resource,
                level,
            });
        }
    }

    pub fn snapshot(&self, scenario: &str) -> HabitatSnapshot {
        let recipes = self
            .catalog
            .list()
            .iter()
            .map(|recipe| {
                let definition = recipe.definition();
                RecipeView {
                    id: definition.id.clone(),
                    name: definition.name.clone(),
                    description: definition.description.clone(),
                    process: definition.process.clone(),
                    benefit: definition.benefit.clone(),
                    input: definition.input.clone(),
                    output: definition.output.clone(),
                    power_cost: definition.power_cost,
                    water_cost: definition.water_cost,
                    usage: recipe.usage(),
                    produced: recipe.produced(),
                    can_execute: conversion::can_execute(self, recipe.id()),
                }
            })
            .collect();
        HabitatSnapshot {
            scenario: scenario.to_string(),
            sol: self.sol,
            power: self.inventory.power(),
            water: self.inventory.water(),
            waste: self.inventory.waste.levels(),
            products: self.inventory.products.levels(),
            recipes,
            mission_started: self.mission.started(),
            mission_completed: self.mission.completed(),
            party: self.party_progress(),
        }
    }
}
