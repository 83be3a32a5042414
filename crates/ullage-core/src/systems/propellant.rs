//! Propellant draw for burning engines.

use hecs::{Entity, World};

use crate::components::{EngineModule, FlameoutReason, Resources};
use crate::host::{Reservoir, ResourceRouter};
use crate::router::WorldRouter;

/// A planned withdrawal from one part's store.
struct Draw {
    part: Entity,
    resource: String,
    amount: f64,
}

/// Outcome of planning one engine's propellant use for a tick.
struct EnginePlan {
    engine: Entity,
    draws: Vec<Draw>,
    totals: Vec<(f64, f64)>,
    depleted: bool,
}

/// Reservoirs an engine can actually pull from.
fn drawable(engine: Entity, reservoirs: &[Reservoir]) -> impl Iterator<Item = &Reservoir> {
    reservoirs
        .iter()
        .filter(move |r| r.flow_enabled && (r.tank == engine || r.transfer_supports_pump))
}

fn plan_engine(router: &WorldRouter<'_>, engine: Entity, module: &EngineModule, dt: f64) -> EnginePlan {
    let flow = module.requested_flow() * dt;
    let mut plan = EnginePlan {
        engine,
        draws: Vec::new(),
        totals: Vec::with_capacity(module.propellants.len()),
        depleted: false,
    };

    for propellant in &module.propellants {
        let reservoirs = router.find_reservoirs(engine, propellant);
        let demand = flow * module.flow_share(propellant);
        let available: f64 = drawable(engine, &reservoirs).map(|r| r.amount).sum();
        let capacity: f64 = drawable(engine, &reservoirs).map(|r| r.max_amount).sum();

        if demand > 0.0 && available <= 0.0 {
            plan.depleted = true;
        }
        let taken = demand.min(available);
        if taken > 0.0 {
            // Every reservoir gives in proportion to what it holds.
            for reservoir in drawable(engine, &reservoirs) {
                plan.draws.push(Draw {
                    part: reservoir.tank,
                    resource: reservoir.resource.clone(),
                    amount: taken * reservoir.amount / available,
                });
            }
        }
        plan.totals.push(((available - taken).max(0.0), capacity));
    }
    if plan.depleted {
        // A starved engine flames out without burning its other propellants.
        plan.draws.clear();
        for (propellant, total) in module.propellants.iter().zip(plan.totals.iter_mut()) {
            let reservoirs = router.find_reservoirs(engine, propellant);
            total.0 = drawable(engine, &reservoirs).map(|r| r.amount).sum();
        }
    }
    plan
}

/// Withdraw a plan's draws and refresh the engine's totals. Returns true if
/// the engine flamed out.
fn apply_plan(world: &mut World, plan: &EnginePlan) -> bool {
    for draw in &plan.draws {
        if let Ok(mut resources) = world.get::<&mut Resources>(draw.part) {
            if let Some(store) = resources.get_mut(&draw.resource) {
                store.amount = (store.amount - draw.amount).max(0.0);
            }
        }
    }
    let Ok(mut module) = world.get::<&mut EngineModule>(plan.engine) else {
        return false;
    };
    for (propellant, (available, capacity)) in module.propellants.iter_mut().zip(plan.totals.iter().copied()) {
        propellant.total_available = available;
        propellant.total_capacity = capacity;
    }
    if plan.depleted {
        module.flame_out(FlameoutReason::PropellantDepleted);
        log::info!("{}: flameout, {}", module.name, FlameoutReason::PropellantDepleted.describe());
    }
    plan.depleted
}

/// Draw propellant for every firing engine over `dt` seconds.
///
/// Refreshes each propellant's live totals and flames out engines that ran
/// a propellant dry. Returns the engines that flamed out this tick.
pub fn draw_propellants(world: &mut World, dt: f64) -> Vec<Entity> {
    if dt <= 0.0 {
        return Vec::new();
    }

    let firing: Vec<Entity> = world
        .query::<&EngineModule>()
        .iter()
        .filter(|(_, module)| module.is_firing())
        .map(|(engine, _)| engine)
        .collect();

    let mut flamed_out = Vec::new();
    // Engines sharing a tank plan one after another, each against what the
    // previous ones left.
    for engine in firing {
        let plan = {
            let router = WorldRouter::new(world);
            let Ok(module) = world.get::<&EngineModule>(engine) else {
                continue;
            };
            plan_engine(&router, engine, &module, dt)
        };
        if apply_plan(world, &plan) {
            flamed_out.push(plan.engine);
        }
    }
    flamed_out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{FlowMode, Part, Propellant, ResourceStore, Vessel};

    fn setup(fuel: f64, oxidizer: f64) -> (World, Entity, Entity) {
        let mut world = World::new();
        let v = world.spawn((Vessel::new("Ship"),));
        let tank = world.spawn((
            Part::new("Tank", v),
            Resources::new(vec![
                ResourceStore::new("Fuel", fuel, 100.0, 0.001),
                ResourceStore::new("Oxidizer", oxidizer, 100.0, 0.001),
            ]),
        ));
        let mut module = EngineModule::new(
            "Engine",
            vec![
                Propellant::new("Fuel", 1.0, FlowMode::StackPriority),
                Propellant::new("Oxidizer", 1.0, FlowMode::StackPriority),
            ],
        )
        .with_max_fuel_flow(10.0);
        module.ignite();
        let engine = world.spawn((Part::new("Engine", v).attached_to(tank), module));
        (world, tank, engine)
    }

    fn amount(world: &World, part: Entity, name: &str) -> f64 {
        world
            .get::<&Resources>(part)
            .ok()
            .and_then(|r| r.get(name).map(|s| s.amount))
            .unwrap_or(f64::NAN)
    }

    #[test]
    fn test_draws_by_ratio_and_refreshes_totals() {
        let (mut world, tank, engine) = setup(100.0, 100.0);
        let out = draw_propellants(&mut world, 2.0);
        assert!(out.is_empty());
        // 10 units/s for 2 s, split evenly.
        assert!((amount(&world, tank, "Fuel") - 90.0).abs() < 1e-9);
        assert!((amount(&world, tank, "Oxidizer") - 90.0).abs() < 1e-9);

        let module = world.get::<&EngineModule>(engine).map(|m| m.clone()).ok();
        let module = module.expect("engine exists");
        assert!((module.propellants[0].total_available - 90.0).abs() < 1e-9);
        assert!((module.propellants[0].total_capacity - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_dry_propellant_flames_out() {
        let (mut world, _, engine) = setup(0.0, 100.0);
        let out = draw_propellants(&mut world, 0.1);
        assert_eq!(out, vec![engine]);
        let reason = world.get::<&EngineModule>(engine).map(|m| m.flameout).ok().flatten();
        assert_eq!(reason, Some(FlameoutReason::PropellantDepleted));

        // A flamed-out engine draws nothing further.
        assert!(draw_propellants(&mut world, 0.1).is_empty());
    }

    #[test]
    fn test_shared_tank_is_not_drawn_twice() {
        let (mut world, tank, first) = setup(5.0, 100.0);
        let v = world.get::<&Part>(tank).map(|p| p.vessel).expect("tank exists");
        let mut module = EngineModule::new(
            "Engine",
            vec![
                Propellant::new("Fuel", 1.0, FlowMode::StackPriority),
                Propellant::new("Oxidizer", 1.0, FlowMode::StackPriority),
            ],
        )
        .with_max_fuel_flow(10.0);
        module.ignite();
        let second = world.spawn((Part::new("Engine", v).attached_to(tank), module));

        // Each engine wants 5 Fuel; only 5 exist.
        let out = draw_propellants(&mut world, 1.0);
        assert_eq!(out.len(), 1);
        assert!(out[0] == first || out[0] == second);
        assert_eq!(amount(&world, tank, "Fuel"), 0.0);
        // Only the engine that got fuel burned oxidizer.
        assert!((amount(&world, tank, "Oxidizer") - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_engine_draws_nothing() {
        let (mut world, tank, engine) = setup(100.0, 100.0);
        if let Ok(mut module) = world.get::<&mut EngineModule>(engine) {
            module.shutdown();
        }
        draw_propellants(&mut world, 1.0);
        assert_eq!(amount(&world, tank, "Fuel"), 100.0);
    }

    #[test]
    fn test_unpumpable_store_is_skipped() {
        let (mut world, tank, engine) = setup(100.0, 100.0);
        if let Ok(mut resources) = world.get::<&mut Resources>(tank) {
            if let Some(store) = resources.get_mut("Fuel") {
                store.transfer_supports_pump = false;
            }
        }
        let out = draw_propellants(&mut world, 1.0);
        assert_eq!(out, vec![engine]);
        assert_eq!(amount(&world, tank, "Fuel"), 100.0);
    }
}
