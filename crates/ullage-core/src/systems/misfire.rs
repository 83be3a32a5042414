//! Ignition checks - engines that light with unsettled propellant or without
//! feed pressure flame out.

use hecs::{Entity, World};
use rand::Rng;
use ullage_logic::UllageSettings;

use crate::components::{EngineModule, FlameoutReason};
use crate::ullage::UllageSet;

/// An engine that failed its ignition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Misfire {
    pub engine: Entity,
    pub reason: FlameoutReason,
}

/// Check every engine ignited since the last call.
///
/// Pressure-fed engines without pressurized tanks flame out for lack of
/// pressure. Otherwise one uniform draw `u` decides: `u` above the set's
/// ignition probability means vapor in the feed line. Engines without an
/// ullage set, or with ullage disabled, always light.
pub fn misfire_system(world: &mut World, settings: &UllageSettings, rng: &mut impl Rng) -> Vec<Misfire> {
    let mut misfires = Vec::new();
    if !settings.simulate_ullage {
        for (_, module) in world.query_mut::<&mut EngineModule>() {
            module.ignition_pending = false;
        }
        return misfires;
    }

    for (engine, (module, set)) in world.query_mut::<(&mut EngineModule, Option<&UllageSet>)>() {
        if !module.ignition_pending {
            continue;
        }
        module.ignition_pending = false;
        if !module.is_firing() {
            continue;
        }
        let Some(set) = set.filter(|s| s.ullage_enabled()) else {
            continue;
        };

        let reason = if !set.is_pressure_feed_ok() {
            Some(FlameoutReason::LackOfPressure)
        } else {
            let u: f64 = rng.gen();
            (u > set.simulator().ignition_probability(settings.stability_power))
                .then_some(FlameoutReason::VaporInFeedLine)
        };

        if let Some(reason) = reason {
            module.flame_out(reason);
            log::info!(
                "{}: flameout, {} (ullage {})",
                module.name,
                reason.describe(),
                set.status()
            );
            misfires.push(Misfire { engine, reason });
        }
    }
    misfires
}
