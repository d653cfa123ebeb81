mod in_flight;
mod tracker;
mod walker;

// Public API of the cooking subsystem.
pub use crate::error::CookingError;
pub use in_flight::{InFlight, InFlightGuard};
pub use tracker::{CookingTracker, StatusWatch};
pub use walker::{Completion, StepWalker, WalkerSettings, WalkerView};
