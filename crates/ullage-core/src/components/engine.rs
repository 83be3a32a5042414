//! Liquid engine module and its propellant requirements.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Where a propellant requirement may be drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowMode {
    /// Only the consuming part's own storage.
    NoFlow,
    /// The consuming part and the parts physically attached to it.
    LocalOnly,
    /// Every part in the consumer's cross-feed set.
    StackPriority,
    /// Every part of the vessel.
    WholeVehicle,
}

/// A propellant an engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Propellant {
    pub name: String,
    /// Share of the engine's flow, in units of this resource.
    pub ratio: f64,
    pub flow_mode: FlowMode,
    /// Units currently reachable, refreshed while the engine burns.
    pub total_available: f64,
    /// Capacity currently reachable, refreshed while the engine burns.
    pub total_capacity: f64,
}

impl Propellant {
    pub fn new(name: impl Into<String>, ratio: f64, flow_mode: FlowMode) -> Self {
        Self {
            name: name.into(),
            ratio,
            flow_mode,
            total_available: 0.0,
            total_capacity: 0.0,
        }
    }
}

/// Why an engine stopped burning on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlameoutReason {
    /// Gas reached the feed line.
    VaporInFeedLine,
    /// Pressure-fed engine without pressurized tanks.
    LackOfPressure,
    /// A propellant ran dry.
    PropellantDepleted,
}

impl FlameoutReason {
    pub fn describe(self) -> &'static str {
        match self {
            FlameoutReason::VaporInFeedLine => "Vapor in feed line",
            FlameoutReason::LackOfPressure => "Lack of pressure",
            FlameoutReason::PropellantDepleted => "Propellant depleted",
        }
    }
}

/// EngineModule component - a liquid-propellant engine on a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineModule {
    pub name: String,
    pub propellants: Vec<Propellant>,
    /// Direction the engine pushes the vessel, vehicle frame.
    pub thrust_axis: Vector3<f64>,
    /// Total propellant flow at full throttle, units per second.
    pub max_fuel_flow: f64,
    /// 0..=1
    pub throttle: f64,
    pub ignited: bool,
    /// Ignited since the last ignition check.
    #[serde(default)]
    pub ignition_pending: bool,
    pub flameout: Option<FlameoutReason>,
    /// Needs highly pressurized tanks to run.
    pub pressure_fed: bool,
    /// Whether ullage affects this engine at all.
    pub ullage: bool,
}

impl EngineModule {
    pub fn new(name: impl Into<String>, propellants: Vec<Propellant>) -> Self {
        Self {
            name: name.into(),
            propellants,
            thrust_axis: Vector3::y(),
            max_fuel_flow: 1.0,
            throttle: 1.0,
            ignited: false,
            ignition_pending: false,
            flameout: None,
            pressure_fed: false,
            ullage: true,
        }
    }

    pub fn with_thrust_axis(mut self, axis: Vector3<f64>) -> Self {
        self.thrust_axis = axis;
        self
    }

    pub fn with_max_fuel_flow(mut self, units_per_second: f64) -> Self {
        self.max_fuel_flow = units_per_second;
        self
    }

    pub fn pressure_fed(mut self) -> Self {
        self.pressure_fed = true;
        self
    }

    pub fn without_ullage(mut self) -> Self {
        self.ullage = false;
        self
    }

    /// Ignite (or re-ignite) the engine, clearing any flameout.
    pub fn ignite(&mut self) {
        self.ignited = true;
        self.ignition_pending = true;
        self.flameout = None;
    }

    pub fn shutdown(&mut self) {
        self.ignited = false;
        self.ignition_pending = false;
    }

    pub fn flame_out(&mut self, reason: FlameoutReason) {
        self.flameout = Some(reason);
    }

    /// Ignited and not flamed out.
    pub fn is_firing(&self) -> bool {
        self.ignited && self.flameout.is_none()
    }

    /// Propellant flow currently requested, units per second.
    pub fn requested_flow(&self) -> f64 {
        if self.is_firing() {
            self.max_fuel_flow * self.throttle.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Fraction of the engine's flow taken by `propellant`.
    pub fn flow_share(&self, propellant: &Propellant) -> f64 {
        let total: f64 = self.propellants.iter().map(|p| p.ratio).sum();
        if total > 0.0 {
            propellant.ratio / total
        } else {
            0.0
        }
    }
}
