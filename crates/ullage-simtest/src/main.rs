//! Ullage Headless Flight Harness
//!
//! Validates the ullage model and the flight pipeline end to end.
//! Runs entirely in-process, no host game, no rendering.
//!
//! Usage:
//!   cargo run -p ullage-simtest
//!   cargo run -p ullage-simtest -- --verbose

use nalgebra::Vector3;
use serde::Deserialize;
use ullage_core::components::{EngineModule, FlameoutReason, Vessel};
use ullage_core::generation::VesselConfig;
use ullage_core::settings::settings_from_str;
use ullage_core::simulation::{FlightSimulation, TimeWarp};
use ullage_core::ullage::UllageSet;
use ullage_logic::{UllageEnvelope, UllageSettings, UllageSimulator, UllageStatus};

// ── Data files ──────────────────────────────────────────────────────────
const SCENARIOS_JSON: &str = include_str!("../../../data/scenarios.json");
const SETTINGS_JSON: &str = include_str!("../../../data/ullage_settings.json");

const DT: f64 = 0.02;

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    preset: String,
    #[serde(default)]
    fill: Option<f64>,
    #[serde(default)]
    landed: bool,
    #[serde(default)]
    pressurized: Option<bool>,
    #[serde(default)]
    max_fuel_flow: Option<f64>,
    #[serde(default)]
    save_load: bool,
    phases: Vec<Phase>,
    expect: Expect,
}

#[derive(Debug, Deserialize)]
struct Phase {
    seconds: f64,
    #[serde(default)]
    acceleration: [f64; 3],
    #[serde(default)]
    angular_velocity: [f64; 3],
    #[serde(default)]
    ignite: bool,
    #[serde(default)]
    warp: Option<TimeWarp>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Expect {
    firing: Option<bool>,
    flameout: Option<FlameoutReason>,
    min_stability: Option<f64>,
    max_stability: Option<f64>,
    at_rest: Option<bool>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Ullage Flight Harness ===\n");

    let mut results = Vec::new();

    // 1. Settings & status classification
    results.extend(validate_settings_and_status(verbose));

    // 2. Envelope bounds under a sweep of inputs
    results.extend(validate_envelope_bounds(verbose));

    // 3. Fill level vs stability
    results.extend(validate_fill_level(verbose));

    // 4. Flight scenarios
    results.extend(run_scenarios(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Settings & Status ────────────────────────────────────────────────

fn validate_settings_and_status(verbose: bool) -> Vec<TestResult> {
    println!("--- Settings & Status ---");
    let mut results = Vec::new();

    let settings = match settings_from_str(SETTINGS_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "settings_parse".into(),
                passed: false,
                detail: format!("settings error: {}", e),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "settings_file_matches_defaults".into(),
        passed: settings == UllageSettings::default(),
        detail: "data/ullage_settings.json vs built-in defaults".into(),
    });

    let coefficients = [
        settings.natural_diffusion_rate_x,
        settings.natural_diffusion_rate_y,
        settings.translate_axial_coefficient_x,
        settings.translate_axial_coefficient_y,
        settings.translate_sideway_coefficient_x,
        settings.translate_sideway_coefficient_y,
        settings.rotate_yaw_pitch_coefficient_x,
        settings.rotate_yaw_pitch_coefficient_y,
        settings.rotate_roll_coefficient_x,
        settings.rotate_roll_coefficient_y,
    ];
    results.push(TestResult {
        name: "settings_positive_coefficients".into(),
        passed: coefficients.iter().all(|c| *c > 0.0),
        detail: format!("{} coefficients checked", coefficients.len()),
    });

    results.push(TestResult {
        name: "settings_master_switch_on".into(),
        passed: settings.simulate_ullage,
        detail: format!("simulate_ullage = {}", settings.simulate_ullage),
    });

    // Walk stability from 1 down to 0 and make sure the label never improves.
    let mut previous = UllageStatus::VeryStable;
    let mut monotonic = true;
    let mut seen = Vec::new();
    for i in 0..=1000 {
        let stability = 1.0 - i as f64 / 1000.0;
        let status = UllageStatus::from_stability(stability);
        if status < previous {
            monotonic = false;
        }
        if !seen.contains(&status) {
            seen.push(status);
        }
        previous = status;
    }
    results.push(TestResult {
        name: "status_monotonic".into(),
        passed: monotonic && seen.len() == 6,
        detail: format!("{} distinct labels, monotonic = {}", seen.len(), monotonic),
    });

    results.push(TestResult {
        name: "status_nan_is_worst".into(),
        passed: UllageStatus::from_stability(f64::NAN) == UllageStatus::VeryUnstable,
        detail: format!("NaN → {}", UllageStatus::from_stability(f64::NAN)),
    });

    if verbose {
        for s in [1.0, 0.96, 0.8, 0.6, 0.4, 0.1] {
            println!("  stability {:.2} → {}", s, UllageStatus::from_stability(s));
        }
    }

    results
}

// ── 2. Envelope Bounds ──────────────────────────────────────────────────

fn validate_envelope_bounds(verbose: bool) -> Vec<TestResult> {
    println!("--- Envelope Bounds ---");
    let mut results = Vec::new();
    let settings = UllageSettings::default();

    let magnitudes = [-50.0, -3.0, -0.1, 0.0, 0.1, 3.0, 50.0];
    let rates = [0.0, 0.05, 1.0, 20.0];
    let fills = [0.0, 0.3, 1.0];
    let mut updates = 0usize;
    let mut violations = 0usize;
    let mut worst = f64::INFINITY;

    for &fill in &fills {
        let mut sim = UllageSimulator::new();
        for &ax in &magnitudes {
            for &ay in &magnitudes {
                for &rate in &rates {
                    sim.update(
                        &settings,
                        Vector3::new(ax, ay, -ax * 0.5),
                        Vector3::new(rate, rate * 0.5, -rate),
                        DT,
                        0.0,
                        fill,
                    );
                    updates += 1;
                    let stability = sim.stability();
                    worst = worst.min(stability);
                    if !sim.envelope().in_range() || !(0.0..=1.0).contains(&stability) {
                        violations += 1;
                    }
                }
            }
        }
    }

    results.push(TestResult {
        name: "envelope_bounds_hold".into(),
        passed: violations == 0,
        detail: format!("{} updates, {} out of range", updates, violations),
    });

    if verbose {
        println!("  lowest stability seen: {:.4}", worst);
    }

    results
}

// ── 3. Fill Level ───────────────────────────────────────────────────────

fn validate_fill_level(verbose: bool) -> Vec<TestResult> {
    println!("--- Fill Level ---");
    let mut results = Vec::new();
    let settings = UllageSettings::default();
    let envelope = UllageEnvelope {
        height_min: 0.15,
        height_max: 0.5,
        radial_min: 0.1,
        radial_max: 0.5,
    };

    // Strong venting holds the envelope still so only the fill differs.
    let stability_at = |fill: f64| {
        let mut sim = UllageSimulator::new();
        sim.set_envelope(envelope);
        sim.update(&settings, Vector3::zeros(), Vector3::zeros(), DT, 1.0, fill);
        sim.stability()
    };
    let full = stability_at(1.0);
    let drained = stability_at(0.05);

    results.push(TestResult {
        name: "drained_tank_less_stable".into(),
        passed: drained <= full,
        detail: format!("full {:.4}, drained {:.4}", full, drained),
    });
    results.push(TestResult {
        name: "full_tank_reference".into(),
        passed: (full - 0.4375).abs() < 1e-9,
        detail: format!("full tank stability {:.4} (expected 0.4375)", full),
    });

    if verbose {
        for fill in [1.0, 0.75, 0.5, 0.25, 0.1, 0.0] {
            println!("  fill {:.2} → stability {:.4}", fill, stability_at(fill));
        }
    }

    results
}

// ── 4. Scenarios ────────────────────────────────────────────────────────

fn run_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Flight Scenarios ---");
    let mut results = Vec::new();

    let scenarios: Vec<Scenario> = match serde_json::from_str(SCENARIOS_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenarios_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "scenarios_not_empty".into(),
        passed: !scenarios.is_empty(),
        detail: format!("{} scenarios loaded", scenarios.len()),
    });

    for scenario in &scenarios {
        results.extend(run_scenario(scenario, verbose));
    }

    results
}

fn preset(scenario: &Scenario) -> Option<VesselConfig> {
    let mut config = match scenario.preset.as_str() {
        "kerolox" => VesselConfig::default(),
        "pressure_fed" => VesselConfig::pressure_fed(),
        "cryogenic" => VesselConfig::cryogenic(),
        _ => return None,
    };
    if let Some(fill) = scenario.fill {
        config = config.with_fill(fill);
    }
    if let Some(pressurized) = scenario.pressurized {
        for tank in &mut config.tanks {
            tank.highly_pressurized = pressurized;
        }
    }
    if let Some(flow) = scenario.max_fuel_flow {
        for engine in &mut config.engines {
            engine.max_fuel_flow = flow;
        }
    }
    config.landed = scenario.landed;
    Some(config)
}

fn run_scenario(scenario: &Scenario, verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    let name = |check: &str| format!("{}_{}", scenario.name, check);

    let Some(config) = preset(scenario) else {
        results.push(TestResult {
            name: name("preset"),
            passed: false,
            detail: format!("unknown preset '{}'", scenario.preset),
        });
        return results;
    };

    let mut sim = FlightSimulation::with_seed(UllageSettings::default(), 42);
    let layout = sim.spawn_vessel(&config);
    let Some(&engine) = layout.engines.first() else {
        results.push(TestResult {
            name: name("engine"),
            passed: false,
            detail: "preset has no engine".into(),
        });
        return results;
    };

    let mut misfires = Vec::new();
    for phase in &scenario.phases {
        if let Ok(mut vessel) = sim.world.get::<&mut Vessel>(layout.vessel) {
            vessel.acceleration = Vector3::from(phase.acceleration);
            vessel.angular_velocity = Vector3::from(phase.angular_velocity);
        }
        sim.time_warp = phase.warp.unwrap_or_default();
        if phase.ignite {
            sim.ignite(engine);
        }
        let ticks = (phase.seconds / DT).round().max(1.0) as usize;
        for _ in 0..ticks {
            misfires.extend(sim.update(DT));
        }
    }

    let module = sim.world.get::<&EngineModule>(engine).map(|m| (*m).clone()).ok();
    let set = sim.ullage_set(engine);
    let (Some(module), Some(set)) = (module, set) else {
        results.push(TestResult {
            name: name("engine"),
            passed: false,
            detail: "engine or its ullage set went missing".into(),
        });
        return results;
    };

    if verbose {
        let env = set.simulator().envelope();
        println!(
            "  {}: stability {:.4} ({}), envelope h[{:.3}, {:.3}] r[{:.3}, {:.3}], {} misfires",
            scenario.name,
            set.stability(),
            set.status(),
            env.height_min,
            env.height_max,
            env.radial_min,
            env.radial_max,
            misfires.len()
        );
    }

    let expect = &scenario.expect;
    if let Some(firing) = expect.firing {
        results.push(TestResult {
            name: name("firing"),
            passed: module.is_firing() == firing,
            detail: format!("firing = {}, flameout = {:?}", module.is_firing(), module.flameout),
        });
    }
    if let Some(reason) = expect.flameout {
        results.push(TestResult {
            name: name("flameout"),
            passed: module.flameout == Some(reason),
            detail: format!("expected {}, got {:?}", reason.describe(), module.flameout),
        });
    }
    if let Some(min) = expect.min_stability {
        results.push(TestResult {
            name: name("min_stability"),
            passed: set.stability() >= min,
            detail: format!("stability {:.4} >= {:.4}", set.stability(), min),
        });
    }
    if let Some(max) = expect.max_stability {
        results.push(TestResult {
            name: name("max_stability"),
            passed: set.stability() <= max,
            detail: format!("stability {:.4} <= {:.4}", set.stability(), max),
        });
    }
    if let Some(at_rest) = expect.at_rest {
        let rest = *set.simulator().envelope() == UllageEnvelope::REST;
        results.push(TestResult {
            name: name("at_rest"),
            passed: rest == at_rest,
            detail: format!("envelope at rest = {}", rest),
        });
    }
    if scenario.save_load {
        results.push(check_save_load(&sim, &set, &name("save_load")));
    }

    results
}

fn check_save_load(sim: &FlightSimulation, set: &UllageSet, name: &str) -> TestResult {
    let mut buffer = Vec::new();
    if let Err(e) = sim.save(&mut buffer) {
        return TestResult {
            name: name.into(),
            passed: false,
            detail: format!("save failed: {}", e),
        };
    }

    let mut restored = FlightSimulation::with_seed(UllageSettings::default(), 7);
    if let Err(e) = restored.load(&buffer[..]) {
        return TestResult {
            name: name.into(),
            passed: false,
            detail: format!("load failed: {}", e),
        };
    }

    let mut query = restored.world.query::<&UllageSet>();
    let envelopes: Vec<UllageEnvelope> = query
        .iter()
        .map(|(_, s)| *s.simulator().envelope())
        .collect();
    let expected = *set.simulator().envelope();
    TestResult {
        name: name.into(),
        passed: envelopes == vec![expected],
        detail: format!("{} bytes, {} engines restored", buffer.len(), envelopes.len()),
    }
}
