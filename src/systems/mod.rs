mod sol;
mod waste;

pub use sol::SolCycleSystem;
pub use waste::WasteGenerationSystem;
