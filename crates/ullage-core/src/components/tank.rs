//! Fuel tank module.

use serde::{Deserialize, Serialize};

use crate::host::Tank;

/// FuelTank component - marks a part as a propellant tank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelTank {
    /// Pressurized enough to force-feed engines without settling.
    pub highly_pressurized: bool,
    /// Mass lost to boiloff venting, tonnes per second.
    pub boiloff_mass_rate: f64,
}

impl FuelTank {
    pub fn pressurized() -> Self {
        Self {
            highly_pressurized: true,
            boiloff_mass_rate: 0.0,
        }
    }

    pub fn with_boiloff(mut self, tonnes_per_second: f64) -> Self {
        self.boiloff_mass_rate = tonnes_per_second;
        self
    }
}

impl Tank for FuelTank {
    fn highly_pressurized(&self) -> bool {
        self.highly_pressurized
    }

    fn boiloff_mass_rate(&self) -> f64 {
        self.boiloff_mass_rate
    }
}
