//! Per-engine ullage simulator.
//!
//! The liquid in an engine's feed tanks is not simulated as a fluid. Instead
//! four scalars bound the region the propellant pocket may occupy: an axial
//! extent (`height_min..height_max`, 0 = outlet end, 1 = far end) and a
//! radial extent (`radial_min..radial_max`, 0 = tank axis, 1 = wall). Each
//! tick moves those bounds according to acceleration, rotation and venting,
//! then derives the probability that the outlet sees liquid rather than gas.
//!
//! The update steps run in a fixed order and each one clamps on top of the
//! previous, so reordering them changes results.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::node::ConfigNode;
use crate::settings::UllageSettings;
use crate::status::UllageStatus;

pub const HEIGHT_MIN_RANGE: (f64, f64) = (0.0, 0.9);
pub const HEIGHT_MAX_RANGE: (f64, f64) = (0.1, 1.0);
pub const RADIAL_MIN_RANGE: (f64, f64) = (0.0, 0.9);
pub const RADIAL_MAX_RANGE: (f64, f64) = (0.1, 1.0);

/// Split points the height bounds converge on under yaw/pitch rotation.
const YAW_PITCH_SPLIT_MIN: f64 = 0.45;
const YAW_PITCH_SPLIT_MAX: f64 = 0.55;

const KEY_HEIGHT_MIN: &str = "ullageHeightMin";
const KEY_HEIGHT_MAX: &str = "ullageHeightMax";
const KEY_RADIAL_MIN: &str = "ullageRadialMin";
const KEY_RADIAL_MAX: &str = "ullageRadialMax";

/// Bounds of the propellant pocket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UllageEnvelope {
    pub height_min: f64,
    pub height_max: f64,
    pub radial_min: f64,
    pub radial_max: f64,
}

impl UllageEnvelope {
    /// Rest state: propellant dispersed through the whole tank.
    pub const REST: UllageEnvelope = UllageEnvelope {
        height_min: 0.05,
        height_max: 0.95,
        radial_min: 0.0,
        radial_max: 0.95,
    };

    /// Envelope with every bound forced into its range.
    pub fn clamped(self) -> Self {
        Self {
            height_min: clamp_to(self.height_min, HEIGHT_MIN_RANGE),
            height_max: clamp_to(self.height_max, HEIGHT_MAX_RANGE),
            radial_min: clamp_to(self.radial_min, RADIAL_MIN_RANGE),
            radial_max: clamp_to(self.radial_max, RADIAL_MAX_RANGE),
        }
    }

    /// Whether every bound lies within its range.
    pub fn in_range(&self) -> bool {
        in_range(self.height_min, HEIGHT_MIN_RANGE)
            && in_range(self.height_max, HEIGHT_MAX_RANGE)
            && in_range(self.radial_min, RADIAL_MIN_RANGE)
            && in_range(self.radial_max, RADIAL_MAX_RANGE)
    }

    /// Widen both axes outward by the given amounts, then clamp.
    fn widen(&mut self, height: f64, radial: f64) {
        self.height_min = clamp_to(self.height_min - height, HEIGHT_MIN_RANGE);
        self.height_max = clamp_to(self.height_max + height, HEIGHT_MAX_RANGE);
        self.radial_min = clamp_to(self.radial_min - radial, RADIAL_MIN_RANGE);
        self.radial_max = clamp_to(self.radial_max + radial, RADIAL_MAX_RANGE);
    }
}

impl Default for UllageEnvelope {
    fn default() -> Self {
        Self::REST
    }
}

/// Intermediate quantities of the last update, kept for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UllageDiagnostics {
    pub fuel_ratio_factor: f64,
    pub b_level: f64,
    pub p_vertical: f64,
    pub p_horizontal: f64,
}

/// Ullage state machine for one engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UllageSimulator {
    envelope: UllageEnvelope,
    #[serde(skip, default = "initial_stability")]
    stability: f64,
    #[serde(skip, default = "initial_status")]
    status: UllageStatus,
    #[serde(skip)]
    diagnostics: UllageDiagnostics,
}

fn initial_stability() -> f64 {
    1.0
}

fn initial_status() -> UllageStatus {
    UllageStatus::VeryStable
}

impl UllageSimulator {
    pub fn new() -> Self {
        Self {
            envelope: UllageEnvelope::REST,
            stability: initial_stability(),
            status: initial_status(),
            diagnostics: UllageDiagnostics::default(),
        }
    }

    /// Put the envelope back at rest. The stability reading returns to its
    /// not-yet-simulated value until the next update recomputes it.
    pub fn reset(&mut self) {
        self.envelope = UllageEnvelope::REST;
        self.stability = initial_stability();
        self.status = initial_status();
        self.diagnostics = UllageDiagnostics::default();
    }

    pub fn envelope(&self) -> &UllageEnvelope {
        &self.envelope
    }

    /// Replace the envelope, clamping each bound into range.
    pub fn set_envelope(&mut self, envelope: UllageEnvelope) {
        self.envelope = envelope.clamped();
    }

    pub fn stability(&self) -> f64 {
        self.stability
    }

    pub fn status(&self) -> UllageStatus {
        self.status
    }

    pub fn diagnostics(&self) -> &UllageDiagnostics {
        &self.diagnostics
    }

    /// Force the stability reading. Cleared by the next `update`.
    pub fn set_stability(&mut self, stability: f64) {
        let stability = if stability.is_nan() { 0.0 } else { stability.clamp(0.0, 1.0) };
        self.stability = stability;
        self.status = UllageStatus::from_stability(stability);
    }

    /// Probability that the engine keeps a clean feed through one check.
    pub fn ignition_probability(&self, stability_power: f64) -> f64 {
        self.stability.powf(stability_power)
    }

    /// Advance the envelope by one tick.
    ///
    /// `local_acceleration` and `local_angular_velocity` are in the engine
    /// frame: `y` along the thrust axis, `x`/`z` lateral. `dt` must be
    /// positive.
    pub fn update(
        &mut self,
        settings: &UllageSettings,
        local_acceleration: Vector3<f64>,
        local_angular_velocity: Vector3<f64>,
        dt: f64,
        venting_acceleration: f64,
        fuel_ratio: f64,
    ) {
        let fuel_ratio_factor = (0.5 + fuel_ratio) / 1.4;
        let fuel_ratio_factor_recip = 1.0 / fuel_ratio_factor;
        let env = &mut self.envelope;

        // Natural diffusion back toward rest, suppressed by strong venting.
        if venting_acceleration <= settings.venting_acc_threshold {
            let venting_const = (1.0 - venting_acceleration / settings.venting_acc_threshold)
                * fuel_ratio_factor_recip
                * dt;
            let rate_y = settings.natural_diffusion_rate_y * venting_const;
            let rate_x = settings.natural_diffusion_rate_x * venting_const;
            let rest = UllageEnvelope::REST;
            env.height_min = lerp_toward(env.height_min, rest.height_min, rate_y);
            env.height_max = lerp_toward(env.height_max, rest.height_max, rate_y);
            env.radial_min = lerp_toward(env.radial_min, rest.radial_min, rate_x);
            env.radial_max = lerp_toward(env.radial_max, rest.radial_max, rate_x);
        }

        // Axial translation: the pocket slides as a block along the axis and
        // smears radially.
        let axial_amount = local_acceleration.y * dt;
        let axial_shift = axial_amount * settings.translate_axial_coefficient_y * fuel_ratio_factor;
        env.height_min = clamp_to(env.height_min + axial_shift, HEIGHT_MIN_RANGE);
        env.height_max = clamp_to(env.height_max + axial_shift, HEIGHT_MAX_RANGE);
        let axial_smear =
            axial_amount.abs() * settings.translate_axial_coefficient_x * fuel_ratio_factor;
        env.radial_min = clamp_to(env.radial_min - axial_smear, RADIAL_MIN_RANGE);
        env.radial_max = clamp_to(env.radial_max + axial_smear, RADIAL_MAX_RANGE);

        // Lateral translation spreads the pocket on both axes.
        let lateral_magnitude =
            (local_acceleration.x * dt).hypot(local_acceleration.z * dt);
        env.widen(
            lateral_magnitude * settings.translate_sideway_coefficient_y * fuel_ratio_factor,
            lateral_magnitude * settings.translate_sideway_coefficient_x * fuel_ratio_factor,
        );

        // Yaw/pitch: the height bounds converge on the split points while the
        // radial bounds widen. Raw rate, not rate * dt.
        let yaw_pitch = local_angular_velocity.x.hypot(local_angular_velocity.z);
        let height_step = yaw_pitch * settings.rotate_yaw_pitch_coefficient_y;
        env.height_min = if env.height_min < YAW_PITCH_SPLIT_MIN {
            (env.height_min + height_step).clamp(HEIGHT_MIN_RANGE.0, YAW_PITCH_SPLIT_MIN)
        } else {
            (env.height_min - height_step).clamp(YAW_PITCH_SPLIT_MIN, HEIGHT_MIN_RANGE.1)
        };
        env.height_max = if env.height_max < YAW_PITCH_SPLIT_MAX {
            (env.height_max + height_step).clamp(HEIGHT_MAX_RANGE.0, YAW_PITCH_SPLIT_MAX)
        } else {
            (env.height_max - height_step).clamp(YAW_PITCH_SPLIT_MAX, HEIGHT_MAX_RANGE.1)
        };
        let radial_step = yaw_pitch * settings.rotate_yaw_pitch_coefficient_x;
        env.radial_min = clamp_to(env.radial_min - radial_step, RADIAL_MIN_RANGE);
        env.radial_max = clamp_to(env.radial_max + radial_step, RADIAL_MAX_RANGE);

        // Roll widens both axes.
        let roll = local_angular_velocity.y.abs();
        env.widen(
            roll * settings.rotate_roll_coefficient_y * fuel_ratio_factor,
            roll * settings.rotate_roll_coefficient_x * fuel_ratio_factor,
        );

        self.diagnostics = derive_metrics(env, fuel_ratio, fuel_ratio_factor);
        let d = &self.diagnostics;
        self.stability =
            (1.0 - d.p_vertical * d.p_horizontal * (0.75 + d.b_level.sqrt())).max(0.0);
        self.status = UllageStatus::from_stability(self.stability);
    }

    /// Write the four envelope bounds into `node`.
    pub fn save(&self, node: &mut ConfigNode) {
        node.set_f64(KEY_HEIGHT_MIN, self.envelope.height_min);
        node.set_f64(KEY_HEIGHT_MAX, self.envelope.height_max);
        node.set_f64(KEY_RADIAL_MIN, self.envelope.radial_min);
        node.set_f64(KEY_RADIAL_MAX, self.envelope.radial_max);
    }

    /// Restore the envelope from `node`. Stored values are clamped into their
    /// ranges. Missing or unreadable fields load as `0.0`; call
    /// [`reset`](Self::reset) instead when rest defaults are wanted.
    pub fn load(&mut self, node: &ConfigNode) {
        let read = |key: &str, range: (f64, f64)| {
            node.f64(key)
                .filter(|v| v.is_finite())
                .map_or(0.0, |v| clamp_to(v, range))
        };
        self.envelope = UllageEnvelope {
            height_min: read(KEY_HEIGHT_MIN, HEIGHT_MIN_RANGE),
            height_max: read(KEY_HEIGHT_MAX, HEIGHT_MAX_RANGE),
            radial_min: read(KEY_RADIAL_MIN, RADIAL_MIN_RANGE),
            radial_max: read(KEY_RADIAL_MAX, RADIAL_MAX_RANGE),
        };
    }
}

impl Default for UllageSimulator {
    fn default() -> Self {
        Self::new()
    }
}

fn derive_metrics(
    env: &UllageEnvelope,
    fuel_ratio: f64,
    fuel_ratio_factor: f64,
) -> UllageDiagnostics {
    let drain_term = (8.2 - 8.0 * fuel_ratio).clamp(0.0, 8.2);
    let area = (env.height_max - env.height_min) * (env.radial_max - env.radial_min);
    UllageDiagnostics {
        fuel_ratio_factor,
        b_level: (area * 10.0 * drain_term - 1.0).clamp(0.0, 15.0),
        p_vertical: (1.0 - (env.height_min - 0.1) * 5.0).clamp(0.0, 1.0),
        p_horizontal: (1.0 - (env.radial_min - 0.1) * 5.0).clamp(0.0, 1.0),
    }
}

fn clamp_to(value: f64, range: (f64, f64)) -> f64 {
    value.clamp(range.0, range.1)
}

fn in_range(value: f64, range: (f64, f64)) -> bool {
    value >= range.0 && value <= range.1
}

/// Linear step from `from` toward `to`, never past it.
fn lerp_toward(from: f64, to: f64, t: f64) -> f64 {
    if t >= 1.0 {
        return to;
    }
    from + (to - from) * t.max(0.0)
}
