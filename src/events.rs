use std::fmt;

use serde::Serialize;

use crate::inventory::ResourceLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reserve {
    Power,
    Water,
}

impl fmt::Display for Reserve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reserve::Power => write!(f, "power"),
            Reserve::Water => write!(f, "water"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Critical,
}

/// Notifications for the presentation layer. None of these carry core state;
/// they describe something that already happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    ConversionSucceeded {
        recipe_id: String,
        recipe_name: String,
        summary: String,
    },
    ResourceWarning {
        severity: Severity,
        resource: Reserve,
        level: u64,
    },
    /// `announce_after_ms` lets earlier toasts finish before the success
    /// screen appears.
    MissionCompleted {
        announce_after_ms: u64,
    },
    PartyReady {
        items: Vec<ResourceLevel>,
    },
    MissionStarted,
    WasteGenerated {
        sol: u64,
        amounts: Vec<ResourceLevel>,
    },
    WasteCollected {
        resource: String,
        amount: u64,
    },
    SolAdvanced {
        sol: u64,
    },
}
