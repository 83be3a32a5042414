//! Pure ullage simulation logic.
//!
//! Everything here works on plain data: no ECS world, no I/O. The vehicle
//! host in `ullage-core` feeds these types once per physics tick.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`frame`] | Vehicle frame to engine frame rotation |
//! | [`node`] | Persisted key/value configuration nodes |
//! | [`settings`] | Tunable ullage coefficients |
//! | [`simulator`] | Propellant envelope update and stability |
//! | [`status`] | Stability classification labels |
//!
//! # Example
//!
//! ```
//! use nalgebra::Vector3;
//! use ullage_logic::settings::UllageSettings;
//! use ullage_logic::simulator::UllageSimulator;
//!
//! let settings = UllageSettings::default();
//! let mut sim = UllageSimulator::new();
//! // One second of 5 m/s² thrust settles the pocket.
//! sim.update(&settings, Vector3::new(0.0, 5.0, 0.0), Vector3::zeros(), 1.0, 0.0, 1.0);
//! assert!(sim.envelope().height_min > 0.3);
//! ```

pub mod frame;
pub mod node;
pub mod settings;
pub mod simulator;
pub mod status;

pub use node::ConfigNode;
pub use settings::UllageSettings;
pub use simulator::{UllageEnvelope, UllageSimulator};
pub use status::UllageStatus;
