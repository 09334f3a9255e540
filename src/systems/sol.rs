use anyhow::Result;
use log::debug;

use crate::{
    engine::{TickContext, TickPhase, TickSystem},
    events::GameEvent,
    habitat::Habitat,
    rng::SystemRng,
    scenario::ResourcePolicy,
};

/// Advances the sol counter and, when reserves are gated, pulls power and
/// water back into their configured band.
pub struct SolCycleSystem;

impl SolCycleSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SolCycleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSystem for SolCycleSystem {
    fn name(&self) -> &str {
        "sol_cycle"
    }

    fn phase(&self) -> TickPhase {
        TickPhase::Day
    }

    fn run(
        &mut self,
        _ctx: &TickContext,
        habitat: &mut Habitat,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let sol = habitat.advance_sol();
        if habitat.rules.resource_policy == ResourcePolicy::Gated {
            let power = habitat.rules.reserves.power.bounds();
            let water = habitat.rules.reserves.water.bounds();
            habitat.inventory.settle_reserves(power, water);
            habitat.check_reserves();
        }
        debug!(
            "sol {sol} begins: power {} water {}",
            habitat.inventory.power(),
            habitat.inventory.water()
        );
        habitat.push_event(GameEvent::SolAdvanced { sol });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{engine::Session, scenario::Scenario};

    use super::*;

    #[test]
    fn day_tick_restores_reserve_floor() {
        let mut session = Session::from_scenario(&Scenario::mars_base()).unwrap();
        for _ in 0..3 {
            session.collect_waste("eva").unwrap();
        }
        session.execute("eva-to-composites").unwrap();
        assert_eq!(session.habitat().inventory().power(), 90);
        assert_eq!(session.habitat().inventory().water(), 98);

        session.on_day_tick().unwrap();
        assert_eq!(session.sol(), 2);
        assert_eq!(session.habitat().inventory().power(), 95);
        assert_eq!(session.habitat().inventory().water(), 98);
        assert!(session
            .drain_events()
            .contains(&GameEvent::SolAdvanced { sol: 2 }));
    }

    #[test]
    fn cosmetic_reserves_are_left_alone() {
        let mut scenario = Scenario::mars_base();
        scenario.resource_policy = ResourcePolicy::Cosmetic;
        scenario.reserves.power.initial = 40;
        let mut session = Session::from_scenario(&scenario).unwrap();
        session.on_day_tick().unwrap();
        assert_eq!(session.habitat().inventory().power(), 40);
    }
}
