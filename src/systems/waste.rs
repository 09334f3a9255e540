use std::ops::RangeInclusive;

use anyhow::Result;
use log::debug;

use crate::{
    engine::{TickContext, TickPhase, TickSystem},
    events::GameEvent,
    habitat::Habitat,
    inventory::ResourceLevel,
    rng::SystemRng,
};

/// Passive waste from crew activity: every declared waste stream grows by a
/// random amount each tick.
pub struct WasteGenerationSystem {
    per_tick: RangeInclusive<u64>,
}

impl WasteGenerationSystem {
    pub fn new(per_tick: RangeInclusive<u64>) -> Self {
        Self { per_tick }
    }
}

impl Default for WasteGenerationSystem {
    fn default() -> Self {
        Self::new(1..=2)
    }
}

impl TickSystem for WasteGenerationSystem {
    fn name(&self) -> &str {
        "waste_generation"
    }

    fn phase(&self) -> TickPhase {
        TickPhase::Waste
    }

    fn run(
        &mut self,
        ctx: &TickContext,
        habitat: &mut Habitat,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let names: Vec<String> = habitat
            .inventory
            .waste_counts()
            .names()
            .map(str::to_string)
            .collect();
        let mut amounts = Vec::with_capacity(names.len());
        for name in names {
            let count = rng.amount(&self.per_tick);
            habitat.inventory.add_waste(&name, count);
            amounts.push(ResourceLevel { name, count });
        }
        debug!("sol {}: crew generated {:?}", ctx.sol, amounts);
        habitat.push_event(GameEvent::WasteGenerated {
            sol: ctx.sol,
            amounts,
        });
        Ok(())
    }
}
