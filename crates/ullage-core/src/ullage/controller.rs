//! Per-vessel ullage orchestration.
//!
//! A controller owns the list of a vessel's ullage sets. Every tick it
//! checks whether the vessel's topology changed, computes the motion inputs
//! shared by all engines once, then updates each set in list order.

use hecs::{Entity, World};
use nalgebra::Vector3;
use ullage_logic::UllageSettings;

use crate::components::{EngineModule, Part, Vessel};
use crate::router::{vessel_boiloff_rate, vessel_mass, vessel_parts, WorldRouter};
use crate::simulation::TimeWarp;
use crate::ullage::UllageSet;

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Created but not yet ticked.
    Uninitialized,
    /// Set list built and tracking topology.
    Active,
}

/// Quantities computed once per vessel per tick and shared by every set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    /// Vehicle frame, m/s².
    pub acceleration: Vector3<f64>,
    /// Vehicle frame, rad/s.
    pub angular_velocity: Vector3<f64>,
    /// Pseudo-acceleration from boiloff venting, m/s².
    pub venting_acceleration: f64,
}

#[derive(Debug, Clone)]
pub struct UllageController {
    vessel: Entity,
    state: ControllerState,
    engines: Vec<Entity>,
    part_count: usize,
    packed: bool,
    modified: bool,
}

impl UllageController {
    pub fn new(vessel: Entity) -> Self {
        Self {
            vessel,
            state: ControllerState::Uninitialized,
            engines: Vec::new(),
            part_count: 0,
            packed: false,
            modified: false,
        }
    }

    pub fn vessel(&self) -> Entity {
        self.vessel
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Engine entities whose sets this controller drives, in update order.
    pub fn engines(&self) -> &[Entity] {
        &self.engines
    }

    /// Request re-validation of the set list on the next tick.
    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Run one tick for the vessel. Returns `false` if the vessel no longer
    /// exists or the tick was skipped.
    pub fn update(
        &mut self,
        world: &mut World,
        settings: &UllageSettings,
        warp: &TimeWarp,
        dt: f64,
    ) -> bool {
        if dt <= 0.0 {
            return false;
        }
        let packed = match world.get::<&Vessel>(self.vessel) {
            Ok(vessel) => vessel.packed,
            Err(_) => return false,
        };

        let part_count = vessel_parts(world, self.vessel).len();
        let topology_changed = part_count != self.part_count || packed != self.packed;
        if self.state == ControllerState::Uninitialized || topology_changed || self.modified {
            self.rebuild(world, part_count, packed);
        }

        let world = &*world;
        let Some(inputs) = self.tick_inputs(world, settings, warp) else {
            return false;
        };
        for &engine in &self.engines {
            let Ok(module) = world.get::<&EngineModule>(engine) else {
                continue;
            };
            let Ok(mut set) = world.get::<&mut UllageSet>(engine) else {
                continue;
            };
            set.update(
                settings,
                &module,
                inputs.acceleration,
                inputs.angular_velocity,
                dt,
                inputs.venting_acceleration,
            );
        }
        true
    }

    /// Shared motion inputs for this tick.
    pub fn tick_inputs(
        &self,
        world: &World,
        settings: &UllageSettings,
        warp: &TimeWarp,
    ) -> Option<TickInputs> {
        let vessel = world.get::<&Vessel>(self.vessel).ok()?;

        let (mut acceleration, angular_velocity) = if warp.is_coarse() {
            (Vector3::zeros(), Vector3::zeros())
        } else {
            (vessel.acceleration, vessel.angular_velocity)
        };
        if vessel.landed {
            // Resting on the ground: the support force is the acceleration.
            acceleration = -vessel.local_gravity;
        }

        let mass = vessel_mass(world, self.vessel);
        let venting_acceleration = if mass > 0.0 {
            settings.venting_velocity * vessel_boiloff_rate(world, self.vessel) / mass
        } else {
            log::warn!("{}: non-positive mass {mass}, venting ignored", vessel.name);
            0.0
        };

        Some(TickInputs {
            acceleration,
            angular_velocity,
            venting_acceleration,
        })
    }

    /// Recreate the set list and every set's tank connectivity.
    fn rebuild(&mut self, world: &mut World, part_count: usize, packed: bool) {
        let engines: Vec<(Entity, bool)> = world
            .query::<(&Part, &EngineModule, Option<&UllageSet>)>()
            .iter()
            .filter(|(_, (part, _, _))| part.vessel == self.vessel)
            .map(|(e, (_, _, set))| (e, set.is_some()))
            .collect();

        for &(engine, has_set) in &engines {
            if has_set {
                continue;
            }
            let set = match world.get::<&EngineModule>(engine) {
                Ok(module) => UllageSet::new(engine, &module),
                Err(_) => continue,
            };
            if world.insert_one(engine, set).is_err() {
                log::warn!("engine {engine:?} vanished while building ullage set");
            }
        }

        self.engines = engines.into_iter().map(|(e, _)| e).collect();
        let router = WorldRouter::new(world);
        for &engine in &self.engines {
            let Ok(module) = world.get::<&EngineModule>(engine) else {
                continue;
            };
            if module.propellants.is_empty() {
                log::warn!("{}: engine has no propellants", module.name);
            }
            if let Ok(mut set) = world.get::<&mut UllageSet>(engine) {
                set.rebuild_tank_connectivity(&module, &router, &router);
            }
        }

        log::debug!(
            "vessel {:?}: ullage sets rebuilt for {} engines ({} parts, packed {})",
            self.vessel,
            self.engines.len(),
            part_count,
            packed
        );
        self.state = ControllerState::Active;
        self.part_count = part_count;
        self.packed = packed;
        self.modified = false;
    }
}
