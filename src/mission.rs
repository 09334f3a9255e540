use log::info;
use serde::Serialize;

use crate::{
    events::GameEvent,
    inventory::{ResourceCounts, ResourceLevel},
    scenario::MissionConfig,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyItem {
    pub name: String,
    pub count: u64,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyProgress {
    pub items: Vec<PartyItem>,
    pub triggered: bool,
}

impl PartyProgress {
    pub fn ready_count(&self) -> usize {
        self.items.iter().filter(|item| item.ready).count()
    }

    pub fn is_ready(&self) -> bool {
        self.items.iter().all(|item| item.ready)
    }

    pub fn missing(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| !item.ready)
            .map(|item| item.name.as_str())
            .collect()
    }
}

/// Tracks the general mission goal and the party sub-goal.
///
/// The mission flag is terminal. The party flag stays set until the
/// presentation layer acknowledges the celebration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionTracker {
    config: MissionConfig,
    started: bool,
    completed: bool,
    party_triggered: bool,
}

impl MissionTracker {
    pub fn new(config: MissionConfig) -> Self {
        Self {
            config,
            started: false,
            completed: false,
            party_triggered: false,
        }
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Returns true only on the call that actually starts the mission.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        true
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn party_triggered(&self) -> bool {
        self.party_triggered
    }

    pub fn acknowledge_party(&mut self) {
        self.party_triggered = false;
    }

    /// Distinct products currently at or above the mission threshold.
    pub fn qualifying_products(&self, products: &ResourceCounts) -> usize {
        products
            .iter()
            .filter(|(_, count)| *count >= self.config.product_threshold)
            .count()
    }

    pub fn party_progress(&self, products: &ResourceCounts) -> PartyProgress {
        let items = self
            .config
            .party_items
            .iter()
            .map(|name| {
                let count = products.get(name);
                PartyItem {
                    name: name.clone(),
                    count,
                    ready: count >= 1,
                }
            })
            .collect();
        PartyProgress {
            items,
            triggered: self.party_triggered,
        }
    }

    /// Runs both checks against post-conversion product counts and returns
    /// whatever fired.
    pub fn evaluate(&mut self, products: &ResourceCounts) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.started && !self.completed {
            let qualifying = self.qualifying_products(products);
            if qualifying >= self.config.distinct_products {
                self.completed = true;
                info!("mission completed with {qualifying} qualifying products");
                events.push(GameEvent::MissionCompleted {
                    announce_after_ms: self.config.announce_delay_ms,
                });
            }
        }

        if !self.party_triggered && !self.config.party_items.is_empty() {
            let progress = self.party_progress(products);
            if progress.is_ready() {
                self.party_triggered = true;
                info!("party supplies ready");
                events.push(GameEvent::PartyReady {
                    items: progress
                        .items
                        .into_iter()
                        .map(|item| ResourceLevel {
                            name: item.name,
                            count: item.count,
                        })
                        .collect(),
                });
            }
        }

        events
    }
}
