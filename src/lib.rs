pub mod catalog;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod events;
pub mod habitat;
pub mod inventory;
pub mod mission;
pub mod rng;
pub mod runtime;
pub mod scenario;
pub mod systems;

pub use conversion::Conversion;
pub use engine::{Session, SessionBuilder, SessionSettings};
pub use error::{ConversionError, ScenarioError, Shortfall};
pub use events::GameEvent;
pub use habitat::{Habitat, HabitatSnapshot};
pub use scenario::{Scenario, ScenarioLoader};
