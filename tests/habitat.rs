use std::collections::BTreeMap;

use mars_recycler::{
    catalog::{RecipeDefinition, UsageState},
    error::{ConversionError, Shortfall},
    events::{GameEvent, Reserve, Severity},
    inventory::{Inventory, ResourceCounts, ResourceLevel},
    rng::RngManager,
    scenario::{MissionConfig, RecipeReuse, ReserveBand, ResourcePolicy, Scenario, TickConfig},
    Session,
};

fn recipe(id: &str, input: &[(&str, u64)], output: &[(&str, u64)], power_cost: u64) -> RecipeDefinition {
    RecipeDefinition {
        id: id.to_string(),
        name: id.to_uppercase(),
        description: String::new(),
        process: None,
        benefit: None,
        input: input.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        output: output.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        power_cost,
        water_cost: 0,
    }
}

/// Small habitat where every manual collection yields exactly one unit and
/// crew activity produces nothing.
fn lab(recipes: Vec<RecipeDefinition>, reuse: RecipeReuse) -> Scenario {
    Scenario {
        name: "lab".to_string(),
        description: None,
        seed: 3,
        waste: vec!["fabric".into(), "packaging".into(), "eva".into(), "foam".into()],
        products: vec!["insulation".into(), "a".into(), "b".into(), "c".into(), "d".into()],
        recipes,
        recipe_reuse: reuse,
        ticks: TickConfig {
            daily_waste_min: 0,
            daily_waste_max: 0,
            collect_min: 1,
            collect_max: 1,
            ..TickConfig::default()
        },
        mission: MissionConfig {
            party_items: Vec::new(),
            ..MissionConfig::default()
        },
        ..Scenario::mars_base()
    }
}

fn insulator() -> Scenario {
    lab(
        vec![recipe("r1", &[("fabric", 3)], &[("insulation", 2)], 5)],
        RecipeReuse::Once,
    )
}

fn collect(session: &mut Session, resource: &str, times: usize) {
    for _ in 0..times {
        session.collect_waste(resource).unwrap();
    }
}

fn counts(levels: &[ResourceLevel]) -> BTreeMap<String, u64> {
    levels.iter().map(|l| (l.name.clone(), l.count)).collect()
}

#[test]
fn manual_collection_stays_in_range() {
    let mut session = Session::from_scenario(&Scenario::mars_base()).unwrap();
    assert_eq!(session.habitat().inventory().waste("fabric"), 0);
    collect(&mut session, "fabric", 3);
    let fabric = session.habitat().inventory().waste("fabric");
    assert!((3..=9).contains(&fabric), "fabric = {fabric}");
}

#[test]
fn short_on_waste_changes_nothing() {
    let mut session = Session::from_scenario(&insulator()).unwrap();
    collect(&mut session, "fabric", 2);
    session.drain_events();
    let before = session.habitat().clone();

    assert!(!session.can_execute("r1"));
    let err = session.execute("r1").unwrap_err();
    assert_eq!(
        err,
        ConversionError::Ineligible {
            recipe_id: "r1".into(),
            shortfalls: vec![Shortfall::Waste {
                resource: "fabric".into(),
                required: 3,
                available: 2
            }],
        }
    );
    assert_eq!(session.habitat(), &before);
    assert!(session.drain_events().is_empty());
}

#[test]
fn exact_waste_runs_the_recipe() {
    let mut session = Session::from_scenario(&insulator()).unwrap();
    collect(&mut session, "fabric", 3);
    assert_eq!(session.habitat().inventory().power(), 100);

    assert!(session.can_execute("r1"));
    session.execute("r1").unwrap();

    let habitat = session.habitat();
    assert_eq!(habitat.inventory().waste("fabric"), 0);
    assert_eq!(habitat.inventory().product("insulation"), 2);
    assert_eq!(habitat.inventory().power(), 95);
    let recipe = habitat.catalog().find("r1").unwrap();
    assert_eq!(recipe.usage(), UsageState::Used);
    assert_eq!(recipe.produced(), 2);
}

#[test]
fn mission_completes_once() {
    let scenario = lab(
        vec![
            recipe("ra", &[("fabric", 1)], &[("a", 1)], 0),
            recipe("rb", &[("fabric", 1)], &[("b", 1)], 0),
            recipe("rc", &[("fabric", 1)], &[("c", 1)], 0),
            recipe("rd", &[("fabric", 1)], &[("d", 1)], 0),
        ],
        RecipeReuse::Repeatable,
    );
    let mut session = Session::from_scenario(&scenario).unwrap();
    collect(&mut session, "fabric", 12);
    session.drain_events();

    for id in ["ra", "ra", "ra", "rb", "rb", "rb", "rc", "rc"] {
        session.execute(id).unwrap();
    }
    assert!(!session.habitat().mission().completed());
    assert!(!session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::MissionCompleted { .. })));

    session.execute("rc").unwrap();
    assert!(session.habitat().mission().completed());
    let completions = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::MissionCompleted { .. }))
        .count();
    assert_eq!(completions, 1);

    for _ in 0..3 {
        session.execute("rd").unwrap();
        assert!(session.habitat().mission().completed());
    }
    assert!(!session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::MissionCompleted { .. })));
}

#[test]
fn five_sols_add_five_draws_per_waste() {
    let scenario = Scenario::mars_base();
    let mut session = Session::from_scenario(&scenario).unwrap();
    for _ in 0..5 {
        session.advance_sol().unwrap();
    }
    assert_eq!(session.sol(), 6);

    let mut replica = RngManager::new(scenario.seed);
    let range = scenario.ticks.daily_waste_range();
    let mut expected: BTreeMap<String, u64> = BTreeMap::new();
    for _ in 0..5 {
        let mut stream = replica.stream("waste_generation");
        for name in &scenario.waste {
            *expected.entry(name.clone()).or_default() += stream.amount(&range);
        }
    }
    for name in &scenario.waste {
        let count = session.habitat().inventory().waste(name);
        assert!((5..=10).contains(&count), "{name} = {count}");
        assert_eq!(count, expected[name]);
    }
}

#[test]
fn conversions_conserve_resources() {
    let mut scenario = Scenario::mars_base();
    scenario.recipe_reuse = RecipeReuse::Repeatable;
    let mut session = Session::from_scenario(&scenario).unwrap();

    for _ in 0..15 {
        session.on_waste_tick().unwrap();
        for recipe in scenario.recipes.iter() {
            if !session.can_execute(&recipe.id) {
                continue;
            }
            let before = session.snapshot();
            let conversion = session.execute(&recipe.id).unwrap();
            let after = session.snapshot();

            let (waste_before, waste_after) = (counts(&before.waste), counts(&after.waste));
            for (name, count) in &waste_before {
                let used = recipe.input.get(name).unwrap_or(0);
                assert_eq!(count - waste_after[name], used, "{} on {name}", recipe.id);
            }
            let (made_before, made_after) = (counts(&before.products), counts(&after.products));
            for (name, count) in &made_after {
                let made = recipe.output.get(name).unwrap_or(0);
                assert_eq!(count - made_before[name], made, "{} on {name}", recipe.id);
            }
            assert_eq!(before.power - after.power, recipe.power_cost);
            assert_eq!(before.water - after.water, recipe.water_cost);
            assert_eq!(conversion.units_produced, recipe.output.values().sum::<u64>());
        }
        session.on_day_tick().unwrap();
    }
}

#[test]
fn ineligible_recipes_leave_the_habitat_alone() {
    let mut session = Session::from_scenario(&Scenario::mars_base()).unwrap();
    for _ in 0..6 {
        session.advance_sol().unwrap();
        for recipe in Scenario::mars_base().recipes {
            let before = session.habitat().clone();
            if session.can_execute(&recipe.id) {
                session.execute(&recipe.id).unwrap();
            } else {
                assert!(session.execute(&recipe.id).is_err());
                assert_eq!(session.habitat(), &before);
            }
        }
    }
}

#[test]
fn counters_refuse_to_go_negative() {
    let mut inventory = Inventory::new(
        ResourceCounts::with_names(["fabric"]),
        ResourceCounts::default(),
        3,
        0,
    );
    inventory.add_waste("fabric", 2);
    let err = inventory.subtract_waste("fabric", 5).unwrap_err();
    assert_eq!(
        err,
        ConversionError::InvariantViolation {
            resource: "fabric".into(),
            requested: 5,
            available: 2
        }
    );
    assert_eq!(inventory.waste("fabric"), 2);
    assert!(inventory.spend_power(4).is_err());
    assert!(inventory.spend_water(1).is_err());
    assert_eq!((inventory.power(), inventory.water()), (3, 0));
}

#[test]
fn lookup_returns_the_same_recipe() {
    let session = Session::from_scenario(&Scenario::mars_base()).unwrap();
    let catalog = session.habitat().catalog();
    let first = catalog.find("foam-to-cushioning").unwrap();
    let second = catalog.find("foam-to-cushioning").unwrap();
    assert!(std::ptr::eq(first, second));
    assert!(catalog.find("unknown").is_none());
}

#[test]
fn party_can_fire_again_after_acknowledge() {
    let mut scenario = Scenario::mars_base();
    scenario.ticks.collect_min = 1;
    scenario.ticks.collect_max = 1;
    let mut session = Session::from_scenario(&scenario).unwrap();
    collect(&mut session, "fabric", 2);
    collect(&mut session, "packaging", 2);
    collect(&mut session, "foam", 2);

    session.execute("old-cloth-to-birthday-decoration").unwrap();
    session.execute("packaging-to-party-containers").unwrap();
    assert!(!session.party_progress().triggered);
    session.execute("foam-to-party-balloons").unwrap();
    assert!(session.party_progress().triggered);
    let fired = session
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::PartyReady { .. }))
        .count();
    assert_eq!(fired, 1);

    session.acknowledge_party();
    assert!(!session.party_progress().triggered);
    assert!(session.party_progress().is_ready());

    session.execute("fabric-to-dust-trap").unwrap();
    assert!(session.party_progress().triggered);
    assert!(session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::PartyReady { .. })));
}

#[test]
fn single_use_recipes_come_back_after_reset() {
    let mut scenario = insulator();
    scenario.recipes[0].power_cost = 0;
    let mut session = Session::from_scenario(&scenario).unwrap();
    collect(&mut session, "fabric", 6);
    session.execute("r1").unwrap();
    assert!(!session.can_execute("r1"));

    session.reset_recipes();
    let recipe = session.habitat().catalog().find("r1").unwrap();
    assert_eq!(recipe.usage(), UsageState::Available);
    assert_eq!(recipe.produced(), 0);
    assert!(session.can_execute("r1"));
    session.execute("r1").unwrap();
    assert_eq!(session.habitat().inventory().product("insulation"), 4);
}

#[test]
fn cosmetic_reserves_stay_put() {
    let mut scenario = Scenario::mars_base();
    scenario.resource_policy = ResourcePolicy::Cosmetic;
    let mut session = Session::from_scenario(&scenario).unwrap();
    for _ in 0..4 {
        session.advance_sol().unwrap();
        for recipe in &scenario.recipes {
            if session.can_execute(&recipe.id) {
                session.execute(&recipe.id).unwrap();
            }
        }
    }
    assert_eq!(session.habitat().inventory().power(), 100);
    assert_eq!(session.habitat().inventory().water(), 100);
    assert!(!session
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::ResourceWarning { .. })));
}

#[test]
fn low_reserves_warn_after_conversion_and_day_tick() {
    let mut scenario = Scenario::mars_base();
    scenario.ticks.collect_min = 1;
    scenario.ticks.collect_max = 1;
    scenario.reserves.power = ReserveBand {
        initial: 25,
        floor: 0,
        ceiling: 100,
    };
    let mut session = Session::from_scenario(&scenario).unwrap();
    collect(&mut session, "eva", 4);
    session.drain_events();

    session.execute("eva-to-composites").unwrap();
    assert_eq!(session.habitat().inventory().power(), 15);
    let events = session.drain_events();
    assert!(matches!(events[0], GameEvent::ConversionSucceeded { .. }));
    assert_eq!(
        events[1..],
        [GameEvent::ResourceWarning {
            severity: Severity::Low,
            resource: Reserve::Power,
            level: 15,
        }]
    );

    session.execute("eva-to-air-filter").unwrap();
    let events = session.drain_events();
    assert_eq!(
        events.last(),
        Some(&GameEvent::ResourceWarning {
            severity: Severity::Critical,
            resource: Reserve::Power,
            level: 9,
        })
    );

    session.on_day_tick().unwrap();
    assert_eq!(session.habitat().inventory().power(), 9);
    assert_eq!(
        session.drain_events(),
        vec![
            GameEvent::ResourceWarning {
                severity: Severity::Critical,
                resource: Reserve::Power,
                level: 9,
            },
            GameEvent::SolAdvanced { sol: 2 },
        ]
    );
}
