use std::{collections::HashSet, fmt};

use serde::{
    de::{self, MapAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{error::ScenarioError, inventory::ResourceLevel};

/// Resource amounts in the order the recipe declares them. Written as a
/// plain mapping in scenario files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quantities {
    entries: Vec<(String, u64)>,
}

impl Quantities {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, amount)| *amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|(name, amount)| (name.as_str(), *amount))
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|(_, amount)| *amount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn levels(&self) -> Vec<ResourceLevel> {
        self.iter()
            .map(|(name, count)| ResourceLevel {
                name: name.to_string(),
                count,
            })
            .collect()
    }

    fn insert(&mut self, name: String, amount: u64) -> bool {
        if self.get(&name).is_some() {
            return false;
        }
        self.entries.push((name, amount));
        true
    }
}

/// Repeated names are summed into the first occurrence.
impl<S: Into<String>> FromIterator<(S, u64)> for Quantities {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut quantities = Self::default();
        for (name, amount) in iter {
            let name = name.into();
            match quantities.entries.iter_mut().find(|(entry, _)| *entry == name) {
                Some((_, existing)) => *existing += amount,
                None => quantities.entries.push((name, amount)),
            }
        }
        quantities
    }
}

impl Serialize for Quantities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Quantities {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantitiesVisitor;

        impl<'de> Visitor<'de> for QuantitiesVisitor {
            type Value = Quantities;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of resource names to amounts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Quantities, A::Error> {
                let mut quantities = Quantities::default();
                while let Some((name, amount)) = map.next_entry::<String, u64>()? {
                    if !quantities.insert(name.clone(), amount) {
                        return Err(de::Error::custom(format!("resource '{name}' listed twice")));
                    }
                }
                Ok(quantities)
            }
        }

        deserializer.deserialize_map(QuantitiesVisitor)
    }
}

/// Static description of a recycling system as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    pub input: Quantities,
    pub output: Quantities,
    #[serde(default)]
    pub power_cost: u64,
    #[serde(default)]
    pub water_cost: u64,
}

impl RecipeDefinition {
    pub fn with_flavor(mut self, process: &str, benefit: &str) -> Self {
        self.process = Some(process.to_string());
        self.benefit = Some(benefit.to_string());
        self
    }

    pub fn units_per_run(&self) -> u64 {
        self.output.values().sum()
    }

    /// Human readable output list in declaration order, e.g. `"3 partyContainers"`.
    pub fn output_summary(&self) -> String {
        self.output
            .iter()
            .map(|(product, amount)| format!("{amount} {product}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageState {
    Available,
    Used,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    definition: RecipeDefinition,
    usage: UsageState,
    produced: u64,
}

impl Recipe {
    fn new(definition: RecipeDefinition) -> Self {
        Self {
            definition,
            usage: UsageState::Available,
            produced: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &RecipeDefinition {
        &self.definition
    }

    pub fn usage(&self) -> UsageState {
        self.usage
    }

    /// Total units this recipe has produced across every successful run.
    pub fn produced(&self) -> u64 {
        self.produced
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new(
        definitions: Vec<RecipeDefinition>,
        waste_names: &[String],
        product_names: &[String],
    ) -> Result<Self, ScenarioError> {
        validate_recipes(&definitions, waste_names, product_names)?;
        Ok(Self {
            recipes: definitions.into_iter().map(Recipe::new).collect(),
        })
    }

    /// Every recipe, in definition order.
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn find(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.id() == id)
    }

    /// Flags the recipe as used and adds to its running total. Returns false
    /// for unknown ids.
    pub fn mark_used(&mut self, id: &str, units_produced: u64) -> bool {
        match self.recipes.iter_mut().find(|recipe| recipe.id() == id) {
            Some(recipe) => {
                recipe.usage = UsageState::Used;
                recipe.produced = recipe.produced.saturating_add(units_produced);
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        for recipe in &mut self.recipes {
            recipe.usage = UsageState::Available;
            recipe.produced = 0;
        }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

pub(crate) fn validate_recipes(
    definitions: &[RecipeDefinition],
    waste_names: &[String],
    product_names: &[String],
) -> Result<(), ScenarioError> {
    let mut seen = HashSet::new();
    for recipe in definitions {
        if recipe.id.trim().is_empty() {
            return Err(ScenarioError::Validation(
                "recipe id must not be empty".to_string(),
            ));
        }
        if !seen.insert(recipe.id.as_str()) {
            return Err(ScenarioError::Validation(format!(
                "recipe id '{}' defined more than once",
                recipe.id
            )));
        }
        if recipe.input.is_empty() || recipe.output.is_empty() {
            return Err(ScenarioError::Validation(format!(
                "recipe '{}' needs at least one input and one output",
                recipe.id
            )));
        }
        for (resource, amount) in recipe.input.iter() {
            if !waste_names.iter().any(|name| name == resource) {
                return Err(ScenarioError::Validation(format!(
                    "recipe '{}' consumes unknown waste '{resource}'",
                    recipe.id
                )));
            }
            if amount == 0 {
                return Err(ScenarioError::Validation(format!(
                    "recipe '{}' input '{resource}' must be positive",
                    recipe.id
                )));
            }
        }
        for (product, amount) in recipe.output.iter() {
            if !product_names.iter().any(|name| name == product) {
                return Err(ScenarioError::Validation(format!(
                    "recipe '{}' produces unknown product '{product}'",
                    recipe.id
                )));
            }
            if amount == 0 {
                return Err(ScenarioError::Validation(format!(
                    "recipe '{}' output '{product}' must be positive",
                    recipe.id
                )));
            }
        }
    }
    Ok(())
}
