//! Tunable ullage constants.
//!
//! Every coefficient the envelope update uses lives here so a host can load
//! them from configuration instead of recompiling. Missing keys fall back to
//! the defaults below.

use serde::{Deserialize, Serialize};

/// Ullage simulation coefficients and switches.
///
/// `_x` coefficients act on the radial bounds of the envelope, `_y`
/// coefficients on the height (axial) bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UllageSettings {
    /// Master switch. When off, engines never misfire from ullage.
    pub simulate_ullage: bool,

    /// Relaxation rate of the radial bounds toward rest, per second.
    pub natural_diffusion_rate_x: f64,
    /// Relaxation rate of the height bounds toward rest, per second.
    pub natural_diffusion_rate_y: f64,

    pub translate_axial_coefficient_x: f64,
    pub translate_axial_coefficient_y: f64,
    pub translate_sideway_coefficient_x: f64,
    pub translate_sideway_coefficient_y: f64,

    pub rotate_yaw_pitch_coefficient_x: f64,
    pub rotate_yaw_pitch_coefficient_y: f64,
    pub rotate_roll_coefficient_x: f64,
    pub rotate_roll_coefficient_y: f64,

    /// Effective exhaust velocity of boiloff venting (m/s).
    pub venting_velocity: f64,
    /// Venting acceleration (m/s²) above which natural diffusion stops.
    pub venting_acc_threshold: f64,
    /// Exponent applied to stability when rolling for a misfire.
    pub stability_power: f64,
}

impl Default for UllageSettings {
    fn default() -> Self {
        Self {
            simulate_ullage: true,
            natural_diffusion_rate_x: 0.02,
            natural_diffusion_rate_y: 0.03,
            translate_axial_coefficient_x: 0.06,
            translate_axial_coefficient_y: 0.06,
            translate_sideway_coefficient_x: 0.04,
            translate_sideway_coefficient_y: 0.02,
            rotate_yaw_pitch_coefficient_x: 0.003,
            rotate_yaw_pitch_coefficient_y: 0.004,
            rotate_roll_coefficient_x: 0.005,
            rotate_roll_coefficient_y: 0.006,
            venting_velocity: 100.0,
            venting_acc_threshold: 4e-8,
            stability_power: 0.03,
        }
    }
}

impl UllageSettings {
    /// Settings with every motion coefficient zeroed; only diffusion remains.
    /// Handy for isolating a single update step.
    pub fn diffusion_only() -> Self {
        Self {
            translate_axial_coefficient_x: 0.0,
            translate_axial_coefficient_y: 0.0,
            translate_sideway_coefficient_x: 0.0,
            translate_sideway_coefficient_y: 0.0,
            rotate_yaw_pitch_coefficient_x: 0.0,
            rotate_yaw_pitch_coefficient_y: 0.0,
            rotate_roll_coefficient_x: 0.0,
            rotate_roll_coefficient_y: 0.0,
            ..Self::default()
        }
    }
}
