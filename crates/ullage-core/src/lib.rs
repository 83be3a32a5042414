//! Ullage Core - per-engine propellant stability for simulated vehicles
//!
//! Tracks where the liquid sits inside each engine's tanks as a vehicle
//! thrusts, coasts and tumbles, and decides whether an engine that lights
//! gets clean liquid or gas in its feed line.
//!
//! # Architecture
//!
//! The host side uses an Entity Component System (ECS) via `hecs`:
//! - **Entities**: Vessels and their parts
//! - **Components**: Pure data attached to entities (Vessel, Part, Resources, EngineModule, ...)
//! - **Systems**: Logic that queries and updates components (propellant draw, misfire checks)
//!
//! Ullage state itself lives in an [`UllageSet`](ullage::UllageSet) on each
//! engine entity, driven once per tick by the vessel's
//! [`UllageController`](ullage::UllageController). The envelope math is in
//! the `ullage-logic` crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use ullage_core::prelude::*;
//! use ullage_core::generation::VesselConfig;
//!
//! let mut sim = FlightSimulation::default();
//! let stage = sim.spawn_vessel(&VesselConfig::default());
//! sim.ignite(stage.engines[0]);
//!
//! loop {
//!     for misfire in sim.update(1.0 / 50.0) {
//!         println!("{:?}: {}", misfire.engine, misfire.reason.describe());
//!     }
//! }
//! ```

pub mod components;
pub mod generation;
pub mod host;
pub mod persistence;
pub mod router;
pub mod settings;
pub mod simulation;
pub mod systems;
pub mod ullage;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::simulation::{FlightSimulation, Scene, TimeWarp, WarpMode};
    pub use crate::systems::Misfire;
    pub use crate::ullage::{UllageController, UllageRegistry, UllageSet};
    pub use ullage_logic::{UllageSettings, UllageStatus};
}
