//! Vessel generation - builds a tank stack with engines underneath

use hecs::{Entity, World};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::components::{
    EngineModule, FlowMode, FuelTank, Part, Propellant, ResourceStore, Resources, Vessel,
};
use crate::ullage::UllageSet;

/// One resource loaded into a tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub max_amount: f64,
    /// Tonnes per unit.
    pub density: f64,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, max_amount: f64, density: f64) -> Self {
        Self {
            name: name.into(),
            max_amount,
            density,
        }
    }
}

/// A tank in the stack, listed top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankConfig {
    pub name: String,
    pub resources: Vec<ResourceConfig>,
    /// Initial fill, 0..=1, applied to every resource.
    pub fill: f64,
    pub highly_pressurized: bool,
    /// Tonnes per second.
    pub boiloff_mass_rate: f64,
    pub dry_mass: f64,
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            name: "Tank".to_string(),
            resources: Vec::new(),
            fill: 1.0,
            highly_pressurized: false,
            boiloff_mass_rate: 0.0,
            dry_mass: 0.5,
        }
    }
}

/// An engine mounted below the bottom tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    /// (resource, ratio) pairs.
    pub propellants: Vec<(String, f64)>,
    pub flow_mode: FlowMode,
    pub thrust_axis: Vector3<f64>,
    pub max_fuel_flow: f64,
    pub pressure_fed: bool,
    pub ullage: bool,
    pub dry_mass: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Engine".to_string(),
            propellants: Vec::new(),
            flow_mode: FlowMode::StackPriority,
            thrust_axis: Vector3::y(),
            max_fuel_flow: 10.0,
            pressure_fed: false,
            ullage: true,
            dry_mass: 1.0,
        }
    }
}

impl EngineConfig {
    fn build(&self) -> EngineModule {
        let propellants = self
            .propellants
            .iter()
            .map(|(name, ratio)| Propellant::new(name.clone(), *ratio, self.flow_mode))
            .collect();
        let mut module = EngineModule::new(self.name.clone(), propellants)
            .with_thrust_axis(self.thrust_axis)
            .with_max_fuel_flow(self.max_fuel_flow);
        if self.pressure_fed {
            module = module.pressure_fed();
        }
        if !self.ullage {
            module = module.without_ullage();
        }
        module
    }
}

/// Configuration for vessel generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VesselConfig {
    pub name: String,
    pub tanks: Vec<TankConfig>,
    pub engines: Vec<EngineConfig>,
    pub landed: bool,
    /// Surface gravity when landed, m/s².
    pub surface_gravity: f64,
}

impl Default for VesselConfig {
    /// A single kerosene/LOX upper stage.
    fn default() -> Self {
        Self {
            name: "Kerolox Stage".to_string(),
            tanks: vec![TankConfig {
                name: "Kerolox Tank".to_string(),
                resources: vec![
                    ResourceConfig::new("Kerosene", 800.0, 0.00082),
                    ResourceConfig::new("LqdOxygen", 1200.0, 0.00114),
                ],
                ..TankConfig::default()
            }],
            engines: vec![EngineConfig {
                name: "Kerolox Engine".to_string(),
                propellants: vec![("Kerosene".to_string(), 0.4), ("LqdOxygen".to_string(), 0.6)],
                ..EngineConfig::default()
            }],
            landed: false,
            surface_gravity: 9.81,
        }
    }
}

impl VesselConfig {
    /// A hypergolic stage on pressurized tanks with a pressure-fed engine.
    pub fn pressure_fed() -> Self {
        Self {
            name: "Hypergolic Stage".to_string(),
            tanks: vec![TankConfig {
                name: "Hypergolic Tank".to_string(),
                resources: vec![
                    ResourceConfig::new("Aerozine50", 300.0, 0.0009),
                    ResourceConfig::new("NTO", 300.0, 0.00145),
                ],
                highly_pressurized: true,
                ..TankConfig::default()
            }],
            engines: vec![EngineConfig {
                name: "Pressure-fed Engine".to_string(),
                propellants: vec![("Aerozine50".to_string(), 0.5), ("NTO".to_string(), 0.5)],
                pressure_fed: true,
                max_fuel_flow: 2.0,
                ..EngineConfig::default()
            }],
            ..Self::default()
        }
    }

    /// A hydrolox stage that vents boiloff while coasting.
    pub fn cryogenic() -> Self {
        Self {
            name: "Hydrolox Stage".to_string(),
            tanks: vec![
                TankConfig {
                    name: "LH2 Tank".to_string(),
                    resources: vec![ResourceConfig::new("LqdHydrogen", 4000.0, 0.00007)],
                    boiloff_mass_rate: 0.0002,
                    ..TankConfig::default()
                },
                TankConfig {
                    name: "LOX Tank".to_string(),
                    resources: vec![ResourceConfig::new("LqdOxygen", 1500.0, 0.00114)],
                    boiloff_mass_rate: 0.00005,
                    ..TankConfig::default()
                },
            ],
            engines: vec![EngineConfig {
                name: "Hydrolox Engine".to_string(),
                propellants: vec![("LqdHydrogen".to_string(), 0.73), ("LqdOxygen".to_string(), 0.27)],
                ..EngineConfig::default()
            }],
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, fill: f64) -> Self {
        for tank in &mut self.tanks {
            tank.fill = fill;
        }
        self
    }
}

/// Entity handles for a generated vessel
#[derive(Debug, Clone)]
pub struct VesselLayout {
    pub vessel: Entity,
    /// Top to bottom.
    pub tanks: Vec<Entity>,
    pub engines: Vec<Entity>,
}

/// Generate a vessel in the ECS world
///
/// Tanks are stacked so each one hangs from the tank above it, and every
/// engine hangs from the bottom tank. Engines get their ullage set at spawn.
pub fn generate_vessel(world: &mut World, config: &VesselConfig) -> VesselLayout {
    let mut vessel = Vessel::new(config.name.clone());
    if config.landed {
        vessel = vessel.landed_under(Vector3::new(0.0, -config.surface_gravity, 0.0));
    }
    let vessel = world.spawn((vessel,));

    let mut tanks = Vec::with_capacity(config.tanks.len());
    let mut parent = None;
    for tank in &config.tanks {
        let fill = tank.fill.clamp(0.0, 1.0);
        let stores = tank
            .resources
            .iter()
            .map(|r| ResourceStore::new(r.name.clone(), r.max_amount * fill, r.max_amount, r.density))
            .collect();
        let mut part = Part::new(tank.name.clone(), vessel).with_dry_mass(tank.dry_mass);
        if let Some(parent) = parent {
            part = part.attached_to(parent);
        }
        let module = FuelTank {
            highly_pressurized: tank.highly_pressurized,
            boiloff_mass_rate: tank.boiloff_mass_rate,
        };
        let entity = world.spawn((part, Resources::new(stores), module));
        tanks.push(entity);
        parent = Some(entity);
    }

    let mut engines = Vec::with_capacity(config.engines.len());
    for engine in &config.engines {
        let module = engine.build();
        let mut part = Part::new(engine.name.clone(), vessel).with_dry_mass(engine.dry_mass);
        if let Some(parent) = parent {
            part = part.attached_to(parent);
        }
        let entity = world.reserve_entity();
        let set = UllageSet::new(entity, &module);
        world.spawn_at(entity, (part, module, set));
        engines.push(entity);
    }

    log::debug!(
        "generated vessel '{}': {} tanks, {} engines",
        config.name,
        tanks.len(),
        engines.len()
    );

    VesselLayout {
        vessel,
        tanks,
        engines,
    }
}
