//! Vehicle-level state shared by every part of a vessel.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Vessel component - one per simulated vehicle.
///
/// Vectors are in the vehicle frame (`+y` along the vehicle's long axis).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub name: String,
    /// On-rails representation: parts are not physically simulated.
    pub packed: bool,
    /// Resting on a surface (landed, splashed or on the pad).
    pub landed: bool,
    /// Still being designed, not yet committed to a flight.
    pub in_design: bool,
    /// Proper acceleration felt by the vehicle, m/s².
    pub acceleration: Vector3<f64>,
    /// Angular velocity, rad/s. `y` is roll.
    pub angular_velocity: Vector3<f64>,
    /// Local gravitational acceleration, m/s².
    pub local_gravity: Vector3<f64>,
}

impl Vessel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packed: false,
            landed: false,
            in_design: false,
            acceleration: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            local_gravity: Vector3::zeros(),
        }
    }

    pub fn landed_under(mut self, gravity: Vector3<f64>) -> Self {
        self.landed = true;
        self.local_gravity = gravity;
        self
    }

    pub fn in_design(mut self) -> Self {
        self.in_design = true;
        self
    }
}
