//! Systems - logic that operates on components

mod misfire;
mod propellant;

pub use misfire::*;
pub use propellant::*;
