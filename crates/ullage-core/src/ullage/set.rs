//! Per-engine ullage adapter.
//!
//! An [`UllageSet`] is attached to each engine entity. It knows which tanks
//! feed the engine, whether they are highly pressurized, how full they are,
//! and how to turn vehicle-frame motion into the engine's own frame before
//! handing it to the engine's [`UllageSimulator`].

use hecs::Entity;
use nalgebra::{UnitQuaternion, Vector3};
use ullage_logic::frame::engine_frame;
use ullage_logic::{ConfigNode, UllageSettings, UllageSimulator, UllageStatus};

use crate::components::EngineModule;
use crate::host::{Reservoir, ResourceRouter, TankLookup};

/// Name of the child node holding the simulator state.
pub const ULLAGE_NODE: &str = "Ullage";

/// UllageSet component - lives on the engine entity it serves.
#[derive(Debug, Clone)]
pub struct UllageSet {
    engine: Entity,
    simulator: UllageSimulator,
    /// Vehicle frame to engine frame, fixed at construction.
    rotation: UnitQuaternion<f64>,
    tanks: Vec<Entity>,
    tanks_highly_pressurized: bool,
    pressure_fed: bool,
    ullage_enabled: bool,
    fuel_ratio: f64,
}

impl UllageSet {
    pub fn new(engine: Entity, module: &EngineModule) -> Self {
        Self {
            engine,
            simulator: UllageSimulator::new(),
            rotation: engine_frame(&module.thrust_axis),
            tanks: Vec::new(),
            tanks_highly_pressurized: false,
            pressure_fed: module.pressure_fed,
            ullage_enabled: module.ullage,
            fuel_ratio: 1.0,
        }
    }

    pub fn engine(&self) -> Entity {
        self.engine
    }

    pub fn simulator(&self) -> &UllageSimulator {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut UllageSimulator {
        &mut self.simulator
    }

    /// Tanks found by the last connectivity rebuild.
    pub fn tanks(&self) -> &[Entity] {
        &self.tanks
    }

    pub fn tanks_highly_pressurized(&self) -> bool {
        self.tanks_highly_pressurized
    }

    pub fn fuel_ratio(&self) -> f64 {
        self.fuel_ratio
    }

    pub fn stability(&self) -> f64 {
        self.simulator.stability()
    }

    pub fn status(&self) -> UllageStatus {
        self.simulator.status()
    }

    pub fn ullage_enabled(&self) -> bool {
        self.ullage_enabled
    }

    pub fn set_ullage_enabled(&mut self, enabled: bool) {
        self.ullage_enabled = enabled;
    }

    /// Override the stability reading until the next update.
    pub fn set_stability(&mut self, stability: f64) {
        self.simulator.set_stability(stability);
    }

    /// Rediscover the tanks feeding the engine.
    ///
    /// Must run after anything that can change connectivity (attaching the
    /// engine, modifying the vessel) before pressurization is read.
    pub fn rebuild_tank_connectivity<R, T>(&mut self, module: &EngineModule, router: &R, lookup: &T)
    where
        R: ResourceRouter,
        T: TankLookup,
    {
        self.tanks.clear();
        let mut fuel_ratio = 1.0_f64;
        let mut all_pressurized = !module.propellants.is_empty();

        for propellant in &module.propellants {
            let reservoirs = router.find_reservoirs(self.engine, propellant);

            let usable: Vec<&Reservoir> = reservoirs.iter().filter(|r| r.flow_enabled).collect();
            // Nothing usable reads empty; usable tanks with no capacity give NaN
            // and drop out of the minimum.
            let ratio = if usable.is_empty() {
                0.0
            } else {
                let (amount, max_amount) = usable
                    .iter()
                    .fold((0.0, 0.0), |(a, m), r| (a + r.amount, m + r.max_amount));
                amount / max_amount
            };
            fuel_ratio = min_ignoring_nan(fuel_ratio, ratio);

            let pressurized = reservoirs.iter().any(|r| {
                lookup
                    .with_tank(r.tank, |tank| tank.highly_pressurized())
                    .unwrap_or(false)
            });
            all_pressurized &= pressurized;

            for reservoir in &reservoirs {
                if !self.tanks.contains(&reservoir.tank) {
                    self.tanks.push(reservoir.tank);
                }
            }
        }

        self.fuel_ratio = fuel_ratio;
        self.tanks_highly_pressurized = all_pressurized;
        log::debug!(
            "{}: {} tanks, fuel ratio {:.3}, highly pressurized {}",
            module.name,
            self.tanks.len(),
            self.fuel_ratio,
            self.tanks_highly_pressurized
        );
    }

    /// Advance the engine's ullage state by one tick.
    ///
    /// `acceleration` and `angular_velocity` are in the vehicle frame.
    pub fn update(
        &mut self,
        settings: &UllageSettings,
        module: &EngineModule,
        acceleration: Vector3<f64>,
        angular_velocity: Vector3<f64>,
        dt: f64,
        venting_acceleration: f64,
    ) {
        let mut local_acceleration = self.rotation * acceleration;
        let local_angular_velocity = self.rotation * angular_velocity;
        local_acceleration.y += venting_acceleration;

        if module.is_firing() {
            self.fuel_ratio = live_fuel_ratio(module);
        }

        if self.ullage_enabled {
            self.simulator.update(
                settings,
                local_acceleration,
                local_angular_velocity,
                dt,
                venting_acceleration,
                self.fuel_ratio,
            );
        }
    }

    /// Engines that are not pressure-fed are always fine; pressure-fed ones
    /// need highly pressurized tanks.
    pub fn is_pressure_feed_ok(&self) -> bool {
        !self.pressure_fed || self.tanks_highly_pressurized
    }

    /// Write the ullage child into an engine node. Nothing is written while
    /// the vessel is still being designed.
    pub fn save(&self, engine_node: &mut ConfigNode, in_design: bool) {
        engine_node.remove_nodes(ULLAGE_NODE);
        if in_design {
            return;
        }
        let mut node = ConfigNode::new(ULLAGE_NODE);
        self.simulator.save(&mut node);
        engine_node.add_node(node);
    }

    /// Restore from an engine node; without an ullage child the envelope
    /// starts at rest.
    pub fn load(&mut self, engine_node: &ConfigNode) {
        match engine_node.node(ULLAGE_NODE) {
            Some(node) => self.simulator.load(node),
            None => self.simulator.reset(),
        }
    }
}

/// Smallest fill fraction over propellants with capacity. Zero-capacity
/// propellants are not applicable and do not count as empty.
fn live_fuel_ratio(module: &EngineModule) -> f64 {
    module
        .propellants
        .iter()
        .filter(|p| p.total_capacity > 0.0)
        .map(|p| p.total_available / p.total_capacity)
        .fold(1.0, min_ignoring_nan)
}

fn min_ignoring_nan(current: f64, candidate: f64) -> f64 {
    if candidate.is_nan() {
        current
    } else {
        current.min(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{FlowMode, Propellant};
    use crate::host::Tank;
    use std::collections::HashMap;

    /// Router backed by a fixed table of reservoirs per propellant name.
    struct TableRouter {
        reservoirs: HashMap<String, Vec<Reservoir>>,
    }

    impl ResourceRouter for TableRouter {
        fn find_reservoirs(&self, _consumer: Entity, propellant: &Propellant) -> Vec<Reservoir> {
            self.reservoirs.get(&propellant.name).cloned().unwrap_or_default()
        }
    }

    struct FixedTank(bool);

    impl Tank for FixedTank {
        fn highly_pressurized(&self) -> bool {
            self.0
        }
        fn boiloff_mass_rate(&self) -> f64 {
            0.0
        }
    }

    struct TableTanks(HashMap<Entity, FixedTank>);

    impl TankLookup for TableTanks {
        fn with_tank<R>(&self, part: Entity, f: impl FnOnce(&dyn Tank) -> R) -> Option<R> {
            self.0.get(&part).map(|t| f(t))
        }
    }

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = hecs::World::new();
        (0..n).map(|_| world.spawn(())).collect()
    }

    fn reservoir(resource: &str, amount: f64, max_amount: f64, tank: Entity) -> Reservoir {
        Reservoir {
            resource: resource.to_string(),
            amount,
            max_amount,
            tank,
            flow_enabled: true,
            transfer_supports_pump: true,
        }
    }

    fn biprop() -> EngineModule {
        EngineModule::new(
            "Biprop",
            vec![
                Propellant::new("Fuel", 0.5, FlowMode::StackPriority),
                Propellant::new("Oxidizer", 0.5, FlowMode::StackPriority),
            ],
        )
    }

    #[test]
    fn test_rebuild_fuel_ratio_is_minimum() {
        let e = entities(3);
        let (engine, tank_a, tank_b) = (e[0], e[1], e[2]);
        let router = TableRouter {
            reservoirs: HashMap::from([
                (
                    "Fuel".to_string(),
                    vec![reservoir("Fuel", 30.0, 100.0, tank_a), reservoir("Fuel", 50.0, 100.0, tank_b)],
                ),
                ("Oxidizer".to_string(), vec![reservoir("Oxidizer", 90.0, 100.0, tank_a)]),
            ]),
        };
        let tanks = TableTanks(HashMap::new());
        let module = biprop();
        let mut set = UllageSet::new(engine, &module);
        set.rebuild_tank_connectivity(&module, &router, &tanks);

        assert!((set.fuel_ratio() - 0.4).abs() < 1e-12);
        assert_eq!(set.tanks(), &[tank_a, tank_b]);
        assert!(!set.tanks_highly_pressurized());
    }

    #[test]
    fn test_rebuild_missing_propellant_reads_empty() {
        let e = entities(2);
        let router = TableRouter {
            reservoirs: HashMap::from([("Fuel".to_string(), vec![reservoir("Fuel", 100.0, 100.0, e[1])])]),
        };
        let tanks = TableTanks(HashMap::from([(e[1], FixedTank(true))]));
        let module = biprop();
        let mut set = UllageSet::new(e[0], &module);
        set.rebuild_tank_connectivity(&module, &router, &tanks);

        assert_eq!(set.fuel_ratio(), 0.0);
        // Oxidizer found no tank at all, so the engine is not pressurized.
        assert!(!set.tanks_highly_pressurized());
    }

    #[test]
    fn test_rebuild_flow_disabled_propellant_reads_empty() {
        let e = entities(3);
        let mut locked = reservoir("Oxidizer", 0.0, 100.0, e[2]);
        locked.flow_enabled = false;
        let router = TableRouter {
            reservoirs: HashMap::from([
                ("Fuel".to_string(), vec![reservoir("Fuel", 50.0, 100.0, e[1])]),
                ("Oxidizer".to_string(), vec![locked]),
            ]),
        };
        let module = biprop();
        let mut set = UllageSet::new(e[0], &module);
        set.rebuild_tank_connectivity(&module, &router, &TableTanks(HashMap::new()));

        assert_eq!(set.fuel_ratio(), 0.0);
    }

    #[test]
    fn test_rebuild_zero_capacity_is_not_nan() {
        let e = entities(3);
        let router = TableRouter {
            reservoirs: HashMap::from([
                ("Fuel".to_string(), vec![reservoir("Fuel", 0.0, 0.0, e[1])]),
                ("Oxidizer".to_string(), vec![reservoir("Oxidizer", 70.0, 100.0, e[2])]),
            ]),
        };
        let tanks = TableTanks(HashMap::from([(e[1], FixedTank(true)), (e[2], FixedTank(true))]));
        let module = biprop();
        let mut set = UllageSet::new(e[0], &module);
        set.rebuild_tank_connectivity(&module, &router, &tanks);

        assert!(!set.fuel_ratio().is_nan());
        assert!((set.fuel_ratio() - 0.7).abs() < 1e-12);
        assert!(set.tanks_highly_pressurized());
    }

    #[test]
    fn test_pressure_feed() {
        let e = entities(2);
        let router = TableRouter {
            reservoirs: HashMap::from([
                ("Fuel".to_string(), vec![reservoir("Fuel", 1.0, 1.0, e[1])]),
                ("Oxidizer".to_string(), vec![reservoir("Oxidizer", 1.0, 1.0, e[1])]),
            ]),
        };
        let module = biprop().pressure_fed();
        let mut set = UllageSet::new(e[0], &module);

        set.rebuild_tank_connectivity(&module, &router, &TableTanks(HashMap::new()));
        assert!(!set.is_pressure_feed_ok());

        let tanks = TableTanks(HashMap::from([(e[1], FixedTank(true))]));
        set.rebuild_tank_connectivity(&module, &router, &tanks);
        assert!(set.is_pressure_feed_ok());

        let turbopump = biprop();
        let other = UllageSet::new(e[0], &turbopump);
        assert!(other.is_pressure_feed_ok());
    }

    #[test]
    fn test_live_fuel_ratio_skips_zero_capacity() {
        let mut module = biprop();
        module.propellants[0].total_available = 20.0;
        module.propellants[0].total_capacity = 80.0;
        module.propellants[1].total_available = 0.0;
        module.propellants[1].total_capacity = 0.0;
        assert!((live_fuel_ratio(&module) - 0.25).abs() < 1e-12);

        module.propellants[0].total_capacity = 0.0;
        assert_eq!(live_fuel_ratio(&module), 1.0);
    }

    #[test]
    fn test_update_rotates_into_engine_frame() {
        let e = entities(1);
        // Engine mounted sideways, pushing along vehicle +x.
        let module = biprop().with_thrust_axis(Vector3::x());
        let mut set = UllageSet::new(e[0], &module);
        let settings = UllageSettings::default();

        set.update(&settings, &module, Vector3::new(5.0, 0.0, 0.0), Vector3::zeros(), 1.0, 0.0);
        // Vehicle +x is engine-axial, so the pocket settled.
        assert!(set.simulator().envelope().height_min > 0.3);
    }

    #[test]
    fn test_update_skipped_when_disabled() {
        let e = entities(1);
        let module = biprop().without_ullage();
        let mut set = UllageSet::new(e[0], &module);
        set.update(
            &UllageSettings::default(),
            &module,
            Vector3::new(0.0, 9.0, 0.0),
            Vector3::zeros(),
            1.0,
            0.0,
        );
        assert_eq!(*set.simulator().envelope(), ullage_logic::UllageEnvelope::REST);
        assert!(!set.ullage_enabled());
    }

    #[test]
    fn test_save_omitted_in_design() {
        let e = entities(1);
        let module = biprop();
        let set = UllageSet::new(e[0], &module);

        let mut node = ConfigNode::new("Biprop");
        set.save(&mut node, true);
        assert!(!node.has_node(ULLAGE_NODE));
        set.save(&mut node, false);
        assert!(node.has_node(ULLAGE_NODE));
        set.save(&mut node, false);
        assert_eq!(node.nodes.len(), 1);
    }

    #[test]
    fn test_load_without_child_resets() {
        let e = entities(1);
        let module = biprop();
        let mut set = UllageSet::new(e[0], &module);
        set.update(
            &UllageSettings::default(),
            &module,
            Vector3::new(0.0, 9.0, 0.0),
            Vector3::zeros(),
            1.0,
            0.0,
        );
        set.load(&ConfigNode::new("Biprop"));
        assert_eq!(*set.simulator().envelope(), ullage_logic::UllageEnvelope::REST);
    }
}
