use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use ullage_core::components::Vessel;
use ullage_core::generation::VesselConfig;
use ullage_core::simulation::FlightSimulation;
use ullage_logic::{UllageSettings, UllageSimulator};

fn bench_simulator_update(c: &mut Criterion) {
    let settings = UllageSettings::default();
    let mut sim = UllageSimulator::new();
    c.bench_function("simulator_update", |b| {
        b.iter(|| {
            sim.update(
                &settings,
                black_box(Vector3::new(0.3, 2.0, -0.1)),
                black_box(Vector3::new(0.01, 0.05, 0.02)),
                0.02,
                0.0,
                0.8,
            );
        })
    });
}

fn bench_flight_tick(c: &mut Criterion) {
    let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 1);
    for _ in 0..50 {
        let layout = sim.spawn_vessel(&VesselConfig::cryogenic());
        if let Ok(mut vessel) = sim.world.get::<&mut Vessel>(layout.vessel) {
            vessel.acceleration = Vector3::new(0.0, 1.5, 0.2);
            vessel.angular_velocity = Vector3::new(0.02, 0.1, 0.0);
        }
    }
    sim.update(0.02);

    c.bench_function("flight_tick_50_vessels", |b| {
        b.iter(|| black_box(sim.update(0.02)))
    });
}

criterion_group!(benches, bench_simulator_update, bench_flight_tick);
criterion_main!(benches);
