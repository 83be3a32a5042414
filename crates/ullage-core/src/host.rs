//! Capability interfaces the ullage code consumes.
//!
//! Ullage sets never inspect concrete part types. They reach reservoirs
//! through a [`ResourceRouter`] and tank properties through [`TankLookup`].
//! The ECS world implements both (see [`crate::router`]); tests may supply
//! their own.

use hecs::Entity;

use crate::components::Propellant;

/// A resource reservoir reachable by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Reservoir {
    pub resource: String,
    pub amount: f64,
    pub max_amount: f64,
    /// Part that holds the reservoir.
    pub tank: Entity,
    pub flow_enabled: bool,
    pub transfer_supports_pump: bool,
}

/// Finds the reservoirs a consumer may draw a propellant from, following the
/// propellant's flow mode.
pub trait ResourceRouter {
    fn find_reservoirs(&self, consumer: Entity, propellant: &Propellant) -> Vec<Reservoir>;
}

/// Tank capability of a part.
pub trait Tank {
    /// Force-fed: ullage does not matter for engines drawing from it.
    fn highly_pressurized(&self) -> bool;
    /// Boiloff venting, tonnes per second.
    fn boiloff_mass_rate(&self) -> f64;
}

/// Access to the tank capability of a part, if it has one.
pub trait TankLookup {
    fn with_tank<R>(&self, part: Entity, f: impl FnOnce(&dyn Tank) -> R) -> Option<R>;
}
