use std::{
    fs,
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{validate_recipes, Quantities, RecipeCatalog, RecipeDefinition},
    error::ScenarioError,
    habitat::{Habitat, HabitatRules},
    inventory::{Inventory, ResourceCounts},
    mission::MissionTracker,
};

fn default_true() -> bool {
    true
}

fn default_daily_waste_min() -> u64 {
    1
}

fn default_daily_waste_max() -> u64 {
    2
}

fn default_collect_min() -> u64 {
    1
}

fn default_collect_max() -> u64 {
    3
}

fn default_interval_secs() -> u64 {
    10
}

fn default_reserve_initial() -> u64 {
    100
}

fn default_reserve_ceiling() -> u64 {
    100
}

fn default_power_floor() -> u64 {
    95
}

fn default_water_floor() -> u64 {
    90
}

fn default_low_warning() -> u64 {
    20
}

fn default_critical_warning() -> u64 {
    10
}

fn default_product_threshold() -> u64 {
    3
}

fn default_distinct_products() -> usize {
    3
}

fn default_announce_delay_ms() -> u64 {
    2_000
}

fn default_party_items() -> Vec<String> {
    vec![
        "birthdayDecorations".to_string(),
        "partyContainers".to_string(),
        "partyBalloons".to_string(),
    ]
}

/// Whether power and water gate conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourcePolicy {
    #[default]
    Gated,
    Cosmetic,
}

/// Whether a recipe may run again after its first successful conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeReuse {
    #[default]
    Once,
    Repeatable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickConfig {
    #[serde(default = "default_daily_waste_min")]
    pub daily_waste_min: u64,
    #[serde(default = "default_daily_waste_max")]
    pub daily_waste_max: u64,
    #[serde(default = "default_collect_min")]
    pub collect_min: u64,
    #[serde(default = "default_collect_max")]
    pub collect_max: u64,
    #[serde(default = "default_interval_secs")]
    pub waste_interval_secs: u64,
    #[serde(default = "default_interval_secs")]
    pub day_interval_secs: u64,
}

impl TickConfig {
    pub fn daily_waste_range(&self) -> RangeInclusive<u64> {
        self.daily_waste_min..=self.daily_waste_max
    }

    pub fn collect_range(&self) -> RangeInclusive<u64> {
        self.collect_min..=self.collect_max
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            daily_waste_min: default_daily_waste_min(),
            daily_waste_max: default_daily_waste_max(),
            collect_min: default_collect_min(),
            collect_max: default_collect_max(),
            waste_interval_secs: default_interval_secs(),
            day_interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveBand {
    #[serde(default = "default_reserve_initial")]
    pub initial: u64,
    pub floor: u64,
    #[serde(default = "default_reserve_ceiling")]
    pub ceiling: u64,
}

impl ReserveBand {
    pub fn bounds(&self) -> (u64, u64) {
        (self.floor, self.ceiling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservesConfig {
    #[serde(default = "default_power_band")]
    pub power: ReserveBand,
    #[serde(default = "default_water_band")]
    pub water: ReserveBand,
    #[serde(default = "default_low_warning")]
    pub low_warning: u64,
    #[serde(default = "default_critical_warning")]
    pub critical_warning: u64,
}

fn default_power_band() -> ReserveBand {
    ReserveBand {
        initial: default_reserve_initial(),
        floor: default_power_floor(),
        ceiling: default_reserve_ceiling(),
    }
}

fn default_water_band() -> ReserveBand {
    ReserveBand {
        initial: default_reserve_initial(),
        floor: default_water_floor(),
        ceiling: default_reserve_ceiling(),
    }
}

impl Default for ReservesConfig {
    fn default() -> Self {
        Self {
            power: default_power_band(),
            water: default_water_band(),
            low_warning: default_low_warning(),
            critical_warning: default_critical_warning(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionConfig {
    #[serde(default = "default_product_threshold")]
    pub product_threshold: u64,
    #[serde(default = "default_distinct_products")]
    pub distinct_products: usize,
    #[serde(default = "default_announce_delay_ms")]
    pub announce_delay_ms: u64,
    #[serde(default = "default_party_items")]
    pub party_items: Vec<String>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            product_threshold: default_product_threshold(),
            distinct_products: default_distinct_products(),
            announce_delay_ms: default_announce_delay_ms(),
            party_items: default_party_items(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    pub waste: Vec<String>,
    pub products: Vec<String>,
    pub recipes: Vec<RecipeDefinition>,
    #[serde(default)]
    pub resource_policy: ResourcePolicy,
    #[serde(default)]
    pub recipe_reuse: RecipeReuse,
    /// Start evaluating the mission immediately instead of waiting for
    /// `start_mission`.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    #[serde(default)]
    pub ticks: TickConfig,
    #[serde(default)]
    pub reserves: ReservesConfig,
    #[serde(default)]
    pub mission: MissionConfig,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define a name".to_string(),
            ));
        }
        if self.waste.is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define at least one waste resource".to_string(),
            ));
        }
        check_unique("waste", &self.waste)?;
        check_unique("product", &self.products)?;
        if self.recipes.is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define at least one recipe".to_string(),
            ));
        }
        validate_recipes(&self.recipes, &self.waste, &self.products)?;

        if self.ticks.daily_waste_min > self.ticks.daily_waste_max {
            return Err(ScenarioError::Validation(format!(
                "daily waste range {}..={} is empty",
                self.ticks.daily_waste_min, self.ticks.daily_waste_max
            )));
        }
        if self.ticks.collect_min == 0 || self.ticks.collect_min > self.ticks.collect_max {
            return Err(ScenarioError::Validation(format!(
                "collect range {}..={} must be non-empty and positive",
                self.ticks.collect_min, self.ticks.collect_max
            )));
        }
        if self.ticks.waste_interval_secs == 0 || self.ticks.day_interval_secs == 0 {
            return Err(ScenarioError::Validation(
                "tick intervals must be greater than zero".to_string(),
            ));
        }

        for (label, band) in [("power", self.reserves.power), ("water", self.reserves.water)] {
            if band.floor > band.ceiling {
                return Err(ScenarioError::Validation(format!(
                    "{label} floor {} exceeds ceiling {}",
                    band.floor, band.ceiling
                )));
            }
            if band.initial > band.ceiling {
                return Err(ScenarioError::Validation(format!(
                    "{label} starts above its ceiling ({} > {})",
                    band.initial, band.ceiling
                )));
            }
        }
        if self.reserves.critical_warning > self.reserves.low_warning {
            return Err(ScenarioError::Validation(
                "critical warning threshold must not exceed the low threshold".to_string(),
            ));
        }

        if self.mission.distinct_products == 0 || self.mission.product_threshold == 0 {
            return Err(ScenarioError::Validation(
                "mission thresholds must be greater than zero".to_string(),
            ));
        }
        for item in &self.mission.party_items {
            if !self.products.contains(item) {
                return Err(ScenarioError::Validation(format!(
                    "party item '{item}' is not a declared product"
                )));
            }
        }
        Ok(())
    }

    pub fn build_habitat(&self) -> Result<Habitat, ScenarioError> {
        self.validate()?;
        let inventory = Inventory::new(
            ResourceCounts::with_names(self.waste.iter().cloned()),
            ResourceCounts::with_names(self.products.iter().cloned()),
            self.reserves.power.initial,
            self.reserves.water.initial,
        );
        let catalog = RecipeCatalog::new(self.recipes.clone(), &self.waste, &self.products)?;
        let mut mission = MissionTracker::new(self.mission.clone());
        if self.auto_start {
            mission.start();
        }
        let rules = HabitatRules {
            resource_policy: self.resource_policy,
            recipe_reuse: self.recipe_reuse,
            reserves: self.reserves.clone(),
        };
        Ok(Habitat::new(inventory, catalog, mission, rules))
    }

    /// The habitat the game ships with: four waste streams and eight
    /// recycling systems, three of them feeding the birthday party.
    pub fn mars_base() -> Self {
        let waste = ["fabric", "packaging", "eva", "foam"];
        let products = [
            "insulation",
            "wipes",
            "panels",
            "containers",
            "composites",
            "tools",
            "cushioning",
            "dustTraps",
            "airFilters",
            "solarCells",
            "waterRecyclers",
            "communicationDevices",
            "birthdayDecorations",
            "partyContainers",
            "partyBalloons",
        ];
        let recipes = vec![
            recipe(
                "fabric-to-dust-trap",
                "Electrostatic Dust Trap Maker",
                "Transform woolen cloth into electrostatic dust trap wipes",
                &[("fabric", 1)],
                &[("dustTraps", 1)],
                (2, 0),
            )
            .with_flavor(
                "Embed copper/aluminum filaments and charge with static current",
                "Active dust-attracting cleaning cloth for Mars environment",
            ),
            recipe(
                "old-cloth-to-birthday-decoration",
                "Birthday Decoration Maker",
                "Transform old cloth into festive birthday decorations",
                &[("fabric", 1)],
                &[("birthdayDecorations", 1)],
                (1, 0),
            )
            .with_flavor(
                "Cut, dye, and shape old cloth into colorful party decorations",
                "Boost crew morale with celebratory decorations for special occasions",
            ),
            recipe(
                "packaging-to-party-containers",
                "Party Container Fabricator",
                "Transform old packaging into food containers for birthday celebrations",
                &[("packaging", 2)],
                &[("partyContainers", 3)],
                (3, 1),
            )
            .with_flavor(
                "Wash → Shred → Melt → Extrude packaging materials into festive food containers",
                "Create colorful party food containers to enhance crew birthday celebrations and boost morale",
            ),
            recipe(
                "foam-to-party-balloons",
                "Party Balloon Maker",
                "Transform foam into festive party balloons for birthday celebrations",
                &[("foam", 2)],
                &[("partyBalloons", 4)],
                (2, 0),
            )
            .with_flavor(
                "Shape → Heat → Inflate foam materials into colorful party balloons",
                "Create cheerful balloons to enhance birthday party atmosphere and crew morale",
            ),
            recipe(
                "eva-to-composites",
                "Composite Processor",
                "Convert EVA waste into structural composites",
                &[("eva", 2)],
                &[("composites", 1)],
                (10, 2),
            ),
            recipe(
                "foam-to-cushioning",
                "Foam Reprocessor",
                "Reprocess foam into tool cushioning",
                &[("foam", 3)],
                &[("cushioning", 4)],
                (4, 0),
            ),
            recipe(
                "eva-to-air-filter",
                "Atmospheric Purification System",
                "Transform EVA suit materials into advanced air filtration units",
                &[("eva", 2)],
                &[("airFilters", 1)],
                (6, 1),
            )
            .with_flavor(
                "Extract micro-fiber layers and integrate with activated carbon compounds",
                "Critical air purification for maintaining breathable atmosphere in habitat",
            ),
            recipe(
                "foam-to-water-recycler",
                "Hydration Recovery Unit",
                "Combine foam and fabric into water reclamation systems",
                &[("foam", 2), ("fabric", 1)],
                &[("waterRecyclers", 1)],
                (5, 0),
            )
            .with_flavor(
                "Create multi-layer filtration using foam absorption and fabric membrane technology",
                "Essential water recovery from atmospheric moisture and waste processing",
            ),
        ];

        Self {
            name: "mars_base".to_string(),
            description: Some("Eight-person habitat recycling inorganic mission waste".to_string()),
            seed: 42,
            waste: waste.iter().map(|s| s.to_string()).collect(),
            products: products.iter().map(|s| s.to_string()).collect(),
            recipes,
            resource_policy: ResourcePolicy::default(),
            recipe_reuse: RecipeReuse::default(),
            auto_start: true,
            ticks: TickConfig::default(),
            reserves: ReservesConfig::default(),
            mission: MissionConfig::default(),
        }
    }
}

fn recipe(
    id: &str,
    name: &str,
    description: &str,
    input: &[(&str, u64)],
    output: &[(&str, u64)],
    (power_cost, water_cost): (u64, u64),
) -> RecipeDefinition {
    RecipeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        process: None,
        benefit: None,
        input: to_quantities(input),
        output: to_quantities(output),
        power_cost,
        water_cost,
    }
}

fn to_quantities(pairs: &[(&str, u64)]) -> Quantities {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn check_unique(label: &str, names: &[String]) -> Result<(), ScenarioError> {
    for (index, name) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ScenarioError::Validation(format!(
                "{label} resource names must not be empty"
            )));
        }
        if names[..index].contains(name) {
            return Err(ScenarioError::Validation(format!(
                "{label} resource '{name}' defined more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_scenario_is_valid() {
        let scenario = Scenario::mars_base();
        scenario.validate().expect("built-in scenario validates");
        let habitat = scenario.build_habitat().unwrap();
        assert_eq!(habitat.catalog().len(), 8);
        assert_eq!(habitat.sol(), 1);
        assert_eq!(habitat.inventory().power(), 100);
        assert!(habitat.mission().started());
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let yaml = r#"
name: tiny
seed: 9
waste: [fabric]
products: [insulation, birthdayDecorations, partyContainers, partyBalloons]
recipes:
  - id: r1
    name: Insulator
    input: { fabric: 3 }
    output: { insulation: 2 }
    power_cost: 5
"#;
        let scenario: Scenario = serde_yaml::from_str(yaml).unwrap();
        scenario.validate().unwrap();
        assert_eq!(scenario.resource_policy, ResourcePolicy::Gated);
        assert_eq!(scenario.recipe_reuse, RecipeReuse::Once);
        assert!(scenario.auto_start);
        assert_eq!(scenario.ticks.daily_waste_range(), 1..=2);
        assert_eq!(scenario.ticks.collect_range(), 1..=3);
        assert_eq!(scenario.reserves.power.floor, 95);
        assert_eq!(scenario.reserves.water.floor, 90);
        assert_eq!(scenario.mission.product_threshold, 3);
        assert_eq!(scenario.recipes[0].water_cost, 0);
    }

    #[test]
    fn party_items_must_be_products() {
        let mut scenario = Scenario::mars_base();
        scenario.mission.party_items = vec!["cake".to_string()];
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn inverted_bands_are_rejected() {
        let mut scenario = Scenario::mars_base();
        scenario.reserves.water.floor = 120;
        assert!(scenario.validate().is_err());

        let mut scenario = Scenario::mars_base();
        scenario.ticks.daily_waste_min = 5;
        assert!(scenario.validate().is_err());
    }
}
