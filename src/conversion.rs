use log::{debug, error, info};
use serde::Serialize;

use crate::{
    catalog::{Recipe, RecipeDefinition, UsageState},
    error::{ConversionError, Shortfall},
    events::GameEvent,
    habitat::Habitat,
    inventory::{Inventory, ResourceLevel},
    scenario::{RecipeReuse, ResourcePolicy},
};

/// What a successful conversion moved, for the caller to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub recipe_id: String,
    pub recipe_name: String,
    pub consumed: Vec<ResourceLevel>,
    pub produced: Vec<ResourceLevel>,
    pub power_spent: u64,
    pub water_spent: u64,
    pub units_produced: u64,
}

/// Every requirement `recipe` currently fails. Empty means it may run.
pub fn shortfalls(habitat: &Habitat, recipe: &Recipe) -> Vec<Shortfall> {
    let mut missing = Vec::new();
    let definition = recipe.definition();

    if habitat.rules.recipe_reuse == RecipeReuse::Once && recipe.usage() == UsageState::Used {
        missing.push(Shortfall::AlreadyUsed);
    }

    for (resource, required) in definition.input.iter() {
        let available = habitat.inventory.waste(resource);
        if available < required {
            missing.push(Shortfall::Waste {
                resource: resource.to_string(),
                required,
                available,
            });
        }
    }

    if habitat.rules.resource_policy == ResourcePolicy::Gated {
        let power = habitat.inventory.power();
        if power < definition.power_cost {
            missing.push(Shortfall::Power {
                required: definition.power_cost,
                available: power,
            });
        }
        let water = habitat.inventory.water();
        if water < definition.water_cost {
            missing.push(Shortfall::Water {
                required: definition.water_cost,
                available: water,
            });
        }
    }

    missing
}

pub fn can_execute(habitat: &Habitat, recipe_id: &str) -> bool {
    habitat
        .catalog
        .find(recipe_id)
        .map(|recipe| shortfalls(habitat, recipe).is_empty())
        .unwrap_or(false)
}

/// Runs one conversion. Either every effect lands or none does: ineligible
/// and unknown recipes leave the habitat untouched and queue no events.
pub fn execute(habitat: &mut Habitat, recipe_id: &str) -> Result<Conversion, ConversionError> {
    let (definition, missing) = match habitat.catalog.find(recipe_id) {
        Some(recipe) => (recipe.definition().clone(), shortfalls(habitat, recipe)),
        None => {
            debug!("conversion requested for unknown recipe '{recipe_id}'");
            return Err(ConversionError::RecipeNotFound(recipe_id.to_string()));
        }
    };
    if !missing.is_empty() {
        let err = ConversionError::Ineligible {
            recipe_id: recipe_id.to_string(),
            shortfalls: missing,
        };
        debug!("{err}");
        return Err(err);
    }

    let gated = habitat.rules.resource_policy == ResourcePolicy::Gated;
    let mut next = habitat.inventory.clone();
    if let Err(err) = consume(&mut next, &definition, gated) {
        error!("conversion '{recipe_id}' aborted: {err}");
        return Err(err);
    }
    for (product, amount) in definition.output.iter() {
        next.add_product(product, amount);
    }
    habitat.inventory = next;

    let units_produced = definition.units_per_run();
    habitat.catalog.mark_used(recipe_id, units_produced);

    let summary = definition.output_summary();
    info!("{} produced {summary}", definition.name);
    habitat.push_event(GameEvent::ConversionSucceeded {
        recipe_id: definition.id.clone(),
        recipe_name: definition.name.clone(),
        summary,
    });

    let fired = habitat.mission.evaluate(&habitat.inventory.products);
    habitat.extend_events(fired);
    if gated {
        habitat.check_reserves();
    }

    Ok(Conversion {
        recipe_id: definition.id,
        recipe_name: definition.name,
        consumed: definition.input.levels(),
        produced: definition.output.levels(),
        power_spent: if gated { definition.power_cost } else { 0 },
        water_spent: if gated { definition.water_cost } else { 0 },
        units_produced,
    })
}

fn consume(
    inventory: &mut Inventory,
    definition: &RecipeDefinition,
    gated: bool,
) -> Result<(), ConversionError> {
    for (resource, amount) in definition.input.iter() {
        inventory.subtract_waste(resource, amount)?;
    }
    if gated {
        inventory.spend_power(definition.power_cost)?;
        inventory.spend_water(definition.water_cost)?;
    }
    Ok(())
}
