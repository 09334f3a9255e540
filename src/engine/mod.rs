use std::ops::RangeInclusive;

use anyhow::{Context, Result};
use log::{debug, error, info};

use crate::{
    conversion::{self, Conversion},
    error::ConversionError,
    events::GameEvent,
    habitat::{Habitat, HabitatSnapshot},
    mission::PartyProgress,
    rng::{RngManager, SystemRng},
    scenario::Scenario,
    systems::{SolCycleSystem, WasteGenerationSystem},
};

const COLLECT_STREAM: &str = "collect";

pub struct SessionSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub collect_range: RangeInclusive<u64>,
}

impl SessionSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            collect_range: scenario.ticks.collect_range(),
        }
    }
}

pub struct SessionBuilder {
    settings: SessionSettings,
    habitat: Habitat,
    systems: Vec<Box<dyn TickSystem>>,
}

impl SessionBuilder {
    pub fn new(settings: SessionSettings, habitat: Habitat) -> Self {
        Self {
            settings,
            habitat,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl TickSystem + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Session {
        Session {
            rng: RngManager::new(self.settings.seed),
            habitat: self.habitat,
            systems: self.systems,
            settings: self.settings,
        }
    }
}

/// One game: the habitat plus everything that mutates it. The presentation
/// layer talks only to this.
pub struct Session {
    habitat: Habitat,
    rng: RngManager,
    systems: Vec<Box<dyn TickSystem>>,
    settings: SessionSettings,
}

impl Session {
    /// Session with the standard waste and sol systems.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self> {
        let habitat = scenario
            .build_habitat()
            .with_context(|| format!("Failed to build habitat for '{}'", scenario.name))?;
        Ok(
            SessionBuilder::new(SessionSettings::from_scenario(scenario), habitat)
                .with_system(WasteGenerationSystem::new(scenario.ticks.daily_waste_range()))
                .with_system(SolCycleSystem::new())
                .build(),
        )
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    pub fn habitat(&self) -> &Habitat {
        &self.habitat
    }

    pub fn sol(&self) -> u64 {
        self.habitat.sol()
    }

    pub fn can_execute(&self, recipe_id: &str) -> bool {
        conversion::can_execute(&self.habitat, recipe_id)
    }

    pub fn execute(&mut self, recipe_id: &str) -> Result<Conversion, ConversionError> {
        conversion::execute(&mut self.habitat, recipe_id)
    }

    /// Manual "collect waste" action. Only declared waste streams can be
    /// collected.
    pub fn collect_waste(&mut self, resource: &str) -> Result<u64, ConversionError> {
        if !self.habitat.inventory.waste_counts().contains(resource) {
            return Err(ConversionError::UnknownResource(resource.to_string()));
        }
        let amount = self
            .rng
            .stream(COLLECT_STREAM)
            .amount(&self.settings.collect_range);
        self.habitat.inventory.add_waste(resource, amount);
        info!("collected {amount} {resource}");
        self.habitat.push_event(GameEvent::WasteCollected {
            resource: resource.to_string(),
            amount,
        });
        Ok(amount)
    }

    pub fn on_waste_tick(&mut self) -> Result<()> {
        self.run_phase(TickPhase::Waste)
    }

    pub fn on_day_tick(&mut self) -> Result<()> {
        self.run_phase(TickPhase::Day)
    }

    /// Both ticks back to back, waste first.
    pub fn advance_sol(&mut self) -> Result<()> {
        self.on_waste_tick()?;
        self.on_day_tick()
    }

    pub fn start_mission(&mut self) -> bool {
        let started = self.habitat.mission.start();
        if started {
            info!("mission started on sol {}", self.habitat.sol());
            self.habitat.push_event(GameEvent::MissionStarted);
        }
        started
    }

    /// Closes the party celebration so it can fire again later.
    pub fn acknowledge_party(&mut self) {
        self.habitat.mission.acknowledge_party();
    }

    pub fn reset_recipes(&mut self) {
        info!("recycling systems reset");
        self.habitat.catalog.reset();
    }

    pub fn party_progress(&self) -> PartyProgress {
        self.habitat.party_progress()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.habitat.drain_events()
    }

    pub fn snapshot(&self) -> HabitatSnapshot {
        self.habitat.snapshot(&self.settings.scenario_name)
    }

    fn run_phase(&mut self, phase: TickPhase) -> Result<()> {
        for system in self.systems.iter_mut().filter(|s| s.phase() == phase) {
            let ctx = TickContext { sol: self.habitat.sol() };
            let mut rng_stream = self.rng.stream(system.name());
            debug!("running {} on sol {}", system.name(), ctx.sol);
            if let Err(err) = system.run(&ctx, &mut self.habitat, &mut rng_stream) {
                error!("tick system '{}' failed: {err:#}", system.name());
                return Err(err).with_context(|| format!("tick system '{}'", system.name()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Waste,
    Day,
}

/// What a tick system may know about the tick it runs in.
pub struct TickContext {
    pub sol: u64,
}

pub trait TickSystem: Send {
    fn name(&self) -> &str;
    fn phase(&self) -> TickPhase;
    fn run(
        &mut self,
        ctx: &TickContext,
        habitat: &mut Habitat,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
