//! Flight simulation - main entry point for running ullage on a world

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use ullage_logic::UllageSettings;

use crate::components::{EngineModule, Vessel};
use crate::generation::{generate_vessel, VesselConfig, VesselLayout};
use crate::persistence::SaveError;
use crate::systems::{draw_propellants, misfire_system, Misfire};
use crate::ullage::{UllageRegistry, UllageSet};

/// How time is being advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarpMode {
    /// Parts are physically simulated.
    Physics,
    /// Vessels follow fixed trajectories; no forces act on parts.
    Rails,
}

/// Time acceleration state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWarp {
    pub rate: f64,
    pub mode: WarpMode,
}

impl Default for TimeWarp {
    fn default() -> Self {
        Self {
            rate: 1.0,
            mode: WarpMode::Physics,
        }
    }
}

impl TimeWarp {
    /// On-rails warp above 1×, where vessel motion is not meaningful.
    pub fn is_coarse(&self) -> bool {
        self.mode == WarpMode::Rails && self.rate > 1.0
    }
}

/// Which scene the host is in. Ullage only runs in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    Flight,
    Editor,
    Other,
}

/// Ullage simulation for every vessel in one world
pub struct FlightSimulation {
    /// ECS world containing vessels and parts
    pub world: World,
    pub settings: UllageSettings,
    pub time_warp: TimeWarp,
    /// Simulation time in seconds since start
    pub sim_time: f64,
    registry: UllageRegistry,
    scene: Scene,
    rng: StdRng,
}

impl FlightSimulation {
    pub fn new(settings: UllageSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Deterministic misfire rolls for tests and replays.
    pub fn with_seed(settings: UllageSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: UllageSettings, rng: StdRng) -> Self {
        Self {
            world: World::new(),
            settings,
            time_warp: TimeWarp::default(),
            sim_time: 0.0,
            registry: UllageRegistry::new(),
            scene: Scene::Flight,
            rng,
        }
    }

    /// Build a vessel from `config` and return its entity handles.
    pub fn spawn_vessel(&mut self, config: &VesselConfig) -> VesselLayout {
        generate_vessel(&mut self.world, config)
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    /// Switch scenes. Leaving flight forgets every controller.
    pub fn set_scene(&mut self, scene: Scene) {
        if scene != self.scene {
            log::info!("scene change {:?} -> {:?}", self.scene, scene);
        }
        self.scene = scene;
        if scene != Scene::Flight {
            self.registry.clear();
        }
    }

    pub fn registry(&self) -> &UllageRegistry {
        &self.registry
    }

    /// Tell the vessel's controller to revalidate its engines next tick.
    pub fn notify_vessel_modified(&mut self, vessel: Entity) {
        if let Some(controller) = self.registry.find_mut(vessel) {
            controller.mark_modified();
        }
    }

    /// Ullage set of `engine`, if it has one.
    pub fn ullage_set(&self, engine: Entity) -> Option<UllageSet> {
        self.world.get::<&UllageSet>(engine).ok().map(|s| (*s).clone())
    }

    /// Ignite an engine; it is checked for misfire on the next update.
    pub fn ignite(&mut self, engine: Entity) -> bool {
        match self.world.get::<&mut EngineModule>(engine) {
            Ok(mut module) => {
                module.ignite();
                true
            }
            Err(_) => false,
        }
    }

    pub fn shutdown(&mut self, engine: Entity) -> bool {
        match self.world.get::<&mut EngineModule>(engine) {
            Ok(mut module) => {
                module.shutdown();
                true
            }
            Err(_) => false,
        }
    }

    /// Advance by `dt` seconds. Returns the engines that misfired.
    pub fn update(&mut self, dt: f64) -> Vec<Misfire> {
        if self.scene != Scene::Flight {
            self.registry.clear();
            return Vec::new();
        }
        if dt <= 0.0 {
            return Vec::new();
        }
        self.sim_time += dt;

        draw_propellants(&mut self.world, dt);

        let world = &self.world;
        self.registry.retain(|vessel| world.contains(vessel));

        let vessels: Vec<Entity> = self
            .world
            .query::<&Vessel>()
            .iter()
            .filter(|(_, v)| !v.in_design)
            .map(|(e, _)| e)
            .collect();
        for vessel in vessels {
            self.registry
                .get(vessel)
                .update(&mut self.world, &self.settings, &self.time_warp, dt);
        }

        misfire_system(&mut self.world, &self.settings, &mut self.rng)
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        crate::persistence::save_simulation(
            writer,
            &self.world,
            self.sim_time,
            &self.settings,
            &self.time_warp,
        )
    }

    /// Load simulation state from a reader
    ///
    /// Controllers are rebuilt from the loaded world on the next update.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = crate::persistence::load_simulation(reader)?;
        self.world = loaded.world;
        self.sim_time = loaded.sim_time;
        self.settings = loaded.settings;
        self.time_warp = loaded.time_warp;
        self.registry.clear();
        Ok(())
    }
}

impl Default for FlightSimulation {
    fn default() -> Self {
        Self::new(UllageSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_warp_coarseness() {
        assert!(!TimeWarp::default().is_coarse());
        assert!(!TimeWarp { rate: 4.0, mode: WarpMode::Physics }.is_coarse());
        assert!(TimeWarp { rate: 4.0, mode: WarpMode::Rails }.is_coarse());
        assert!(!TimeWarp { rate: 1.0, mode: WarpMode::Rails }.is_coarse());
    }

    #[test]
    fn test_update_creates_controllers() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        let layout = sim.spawn_vessel(&VesselConfig::default());
        sim.update(0.02);
        assert!(sim.registry().contains(layout.vessel));
        assert_eq!(sim.sim_time, 0.02);
    }

    #[test]
    fn test_design_vessels_are_skipped() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        let layout = sim.spawn_vessel(&VesselConfig::default());
        if let Ok(mut vessel) = sim.world.get::<&mut Vessel>(layout.vessel) {
            vessel.in_design = true;
        }
        sim.update(0.02);
        assert!(sim.registry().is_empty());
    }

    #[test]
    fn test_leaving_flight_clears_registry() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        sim.spawn_vessel(&VesselConfig::default());
        sim.update(0.02);
        assert_eq!(sim.registry().len(), 1);

        sim.set_scene(Scene::Editor);
        assert!(sim.registry().is_empty());
        assert!(sim.update(0.02).is_empty());
        assert!(sim.registry().is_empty());
    }

    #[test]
    fn test_despawned_vessel_drops_controller() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        let layout = sim.spawn_vessel(&VesselConfig::default());
        sim.update(0.02);
        let _ = sim.world.despawn(layout.vessel);
        sim.update(0.02);
        assert!(!sim.registry().contains(layout.vessel));
    }

    #[test]
    fn test_non_positive_dt_is_ignored() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        sim.spawn_vessel(&VesselConfig::default());
        sim.update(0.0);
        sim.update(-1.0);
        assert_eq!(sim.sim_time, 0.0);
        assert!(sim.registry().is_empty());
    }

    #[test]
    fn test_thrust_settles_propellant() {
        let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
        let layout = sim.spawn_vessel(&VesselConfig::default());
        if let Ok(mut vessel) = sim.world.get::<&mut Vessel>(layout.vessel) {
            vessel.acceleration = Vector3::new(0.0, 5.0, 0.0);
        }
        for _ in 0..200 {
            sim.update(0.02);
        }
        let set = sim.ullage_set(layout.engines[0]).expect("engine has a set");
        assert!(set.stability() > 0.95);
    }
}
