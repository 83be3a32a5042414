//! World-backed resource routing and vessel topology queries.

use hecs::{Entity, World};

use crate::components::{FlowMode, FuelTank, Part, Propellant, Resources};
use crate::host::{Reservoir, ResourceRouter, Tank, TankLookup};

/// Routes propellant requests through the parts of an ECS world.
pub struct WorldRouter<'w> {
    world: &'w World,
}

impl<'w> WorldRouter<'w> {
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    /// Parts a consumer may draw from under `mode`.
    pub fn candidate_parts(&self, consumer: Entity, mode: FlowMode) -> Vec<Entity> {
        let (vessel, parent, group) = match self.world.get::<&Part>(consumer) {
            Ok(part) => (part.vessel, part.parent, part.crossfeed_group),
            Err(_) => return Vec::new(),
        };

        match mode {
            FlowMode::NoFlow => vec![consumer],
            FlowMode::LocalOnly => {
                let mut parts = vec![consumer];
                parts.extend(parent);
                parts.extend(
                    self.world
                        .query::<&Part>()
                        .iter()
                        .filter(|(_, p)| p.parent == Some(consumer))
                        .map(|(e, _)| e),
                );
                parts
            }
            FlowMode::StackPriority => self
                .world
                .query::<&Part>()
                .iter()
                .filter(|(_, p)| p.vessel == vessel && p.crossfeed_group == group)
                .map(|(e, _)| e)
                .collect(),
            FlowMode::WholeVehicle => vessel_parts(self.world, vessel),
        }
    }
}

impl ResourceRouter for WorldRouter<'_> {
    fn find_reservoirs(&self, consumer: Entity, propellant: &Propellant) -> Vec<Reservoir> {
        self.candidate_parts(consumer, propellant.flow_mode)
            .into_iter()
            .filter_map(|part| {
                let resources = self.world.get::<&Resources>(part).ok()?;
                let store = resources.get(&propellant.name)?;
                Some(Reservoir {
                    resource: store.name.clone(),
                    amount: store.amount,
                    max_amount: store.max_amount,
                    tank: part,
                    flow_enabled: store.flow_enabled,
                    transfer_supports_pump: store.transfer_supports_pump,
                })
            })
            .collect()
    }
}

impl TankLookup for WorldRouter<'_> {
    fn with_tank<R>(&self, part: Entity, f: impl FnOnce(&dyn Tank) -> R) -> Option<R> {
        let tank = self.world.get::<&FuelTank>(part).ok()?;
        Some(f(&*tank))
    }
}

/// Every part belonging to `vessel`.
pub fn vessel_parts(world: &World, vessel: Entity) -> Vec<Entity> {
    world
        .query::<&Part>()
        .iter()
        .filter(|(_, p)| p.vessel == vessel)
        .map(|(e, _)| e)
        .collect()
}

/// Dry mass plus stored resources, tonnes.
pub fn vessel_mass(world: &World, vessel: Entity) -> f64 {
    world
        .query::<(&Part, Option<&Resources>)>()
        .iter()
        .filter(|(_, (p, _))| p.vessel == vessel)
        .map(|(_, (p, res))| p.dry_mass + res.map_or(0.0, Resources::mass))
        .sum()
}

/// Total boiloff venting across the vessel's tanks, tonnes per second.
pub fn vessel_boiloff_rate(world: &World, vessel: Entity) -> f64 {
    world
        .query::<(&Part, &FuelTank)>()
        .iter()
        .filter(|(_, (p, _))| p.vessel == vessel)
        .map(|(_, (_, tank))| tank.boiloff_mass_rate())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ResourceStore, Vessel};

    struct Fixture {
        world: World,
        upper: Entity,
        lower: Entity,
        engine: Entity,
        booster: Entity,
    }

    /// Upper tank ← lower tank ← engine on one stack, plus a radial booster
    /// tank in its own cross-feed group.
    fn fixture() -> Fixture {
        let mut world = World::new();
        let vessel = world.spawn((Vessel::new("Router Test"),));
        let upper = world.spawn((
            Part::new("Upper", vessel).with_dry_mass(0.5),
            Resources::new(vec![ResourceStore::new("Fuel", 50.0, 100.0, 0.005)]),
            FuelTank::default().with_boiloff(0.001),
        ));
        let lower = world.spawn((
            Part::new("Lower", vessel).attached_to(upper).with_dry_mass(0.5),
            Resources::new(vec![ResourceStore::new("Fuel", 100.0, 100.0, 0.005)]),
            FuelTank::pressurized().with_boiloff(0.002),
        ));
        let engine = world.spawn((Part::new("Engine", vessel).attached_to(lower).with_dry_mass(1.0),));
        let booster = world.spawn((
            Part::new("Booster", vessel)
                .attached_to(lower)
                .with_crossfeed_group(1),
            Resources::new(vec![ResourceStore::new("Fuel", 10.0, 10.0, 0.005)]),
        ));
        Fixture {
            world,
            upper,
            lower,
            engine,
            booster,
        }
    }

    fn tanks_for(f: &Fixture, mode: FlowMode) -> Vec<Entity> {
        let router = WorldRouter::new(&f.world);
        let mut tanks: Vec<Entity> = router
            .find_reservoirs(f.engine, &Propellant::new("Fuel", 1.0, mode))
            .into_iter()
            .map(|r| r.tank)
            .collect();
        tanks.sort();
        tanks
    }

    fn sorted(mut v: Vec<Entity>) -> Vec<Entity> {
        v.sort();
        v
    }

    #[test]
    fn test_no_flow_only_own_part() {
        let f = fixture();
        assert!(tanks_for(&f, FlowMode::NoFlow).is_empty());
    }

    #[test]
    fn test_local_only_reaches_neighbours() {
        let f = fixture();
        assert_eq!(tanks_for(&f, FlowMode::LocalOnly), vec![f.lower]);
    }

    #[test]
    fn test_stack_priority_stays_in_group() {
        let f = fixture();
        assert_eq!(tanks_for(&f, FlowMode::StackPriority), sorted(vec![f.upper, f.lower]));
    }

    #[test]
    fn test_whole_vehicle_reaches_everything() {
        let f = fixture();
        assert_eq!(
            tanks_for(&f, FlowMode::WholeVehicle),
            sorted(vec![f.upper, f.lower, f.booster])
        );
    }

    #[test]
    fn test_tank_lookup() {
        let f = fixture();
        let router = WorldRouter::new(&f.world);
        assert_eq!(router.with_tank(f.lower, |t| t.highly_pressurized()), Some(true));
        assert_eq!(router.with_tank(f.upper, |t| t.highly_pressurized()), Some(false));
        assert_eq!(router.with_tank(f.engine, |t| t.highly_pressurized()), None);
    }

    #[test]
    fn test_mass_and_boiloff() {
        let f = fixture();
        let vessel = f.world.get::<&Part>(f.engine).map(|p| p.vessel).ok();
        let vessel = vessel.expect("engine has a part");
        // 2.0 dry + 160 units * 0.005
        assert!((vessel_mass(&f.world, vessel) - 2.8).abs() < 1e-9);
        assert!((vessel_boiloff_rate(&f.world, vessel) - 0.003).abs() < 1e-12);
        assert_eq!(vessel_parts(&f.world, vessel).len(), 4);
    }
}
