use std::fmt;

use thiserror::Error;

/// A single unmet requirement reported by an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortfall {
    Waste {
        resource: String,
        required: u64,
        available: u64,
    },
    Power {
        required: u64,
        available: u64,
    },
    Water {
        required: u64,
        available: u64,
    },
    AlreadyUsed,
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortfall::Waste {
                resource,
                required,
                available,
            } => write!(f, "{resource}: need {required}, have {available}"),
            Shortfall::Power {
                required,
                available,
            } => write!(f, "power: need {required}, have {available}"),
            Shortfall::Water {
                required,
                available,
            } => write!(f, "water: need {required}, have {available}"),
            Shortfall::AlreadyUsed => write!(f, "already used"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown recipe '{0}'")]
    RecipeNotFound(String),

    #[error("recipe '{recipe_id}' cannot run: {}", join_shortfalls(.shortfalls))]
    Ineligible {
        recipe_id: String,
        shortfalls: Vec<Shortfall>,
    },

    /// A subtraction would have taken a counter below zero. Always a caller
    /// ordering bug; the counter is left untouched.
    #[error("invariant violation: cannot take {requested} {resource} from {available}")]
    InvariantViolation {
        resource: String,
        requested: u64,
        available: u64,
    },

    #[error("unknown waste resource '{0}'")]
    UnknownResource(String),
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario validation error: {0}")]
    Validation(String),
}

fn join_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
