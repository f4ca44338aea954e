//! Reference scenario and input handling, end to end

mod common;

use approx::assert_relative_eq;
use common::*;
use sedcap_rs::config::units::{LengthUnit, TimeUnit};
use sedcap_rs::prelude::*;

fn run(config: &Config) -> SimulationOutput {
    init_logging();
    let scenario = Scenario::new(config).expect("valid configuration");
    TransportSolver::new().solve(&scenario).expect("run completes")
}

// =================================================================================================
// Clean cap under a fixed source
// =================================================================================================

#[test]
fn test_reference_profile_is_monotone_and_non_negative() {
    let output = run(&reference_scenario());
    assert_eq!(output.len(), 11);
    assert_eq!(output.chemicals, vec!["PCB".to_string()]);

    for snapshot in output.snapshots.iter().skip(1) {
        let profile = snapshot.profile(Field::PoreWater, 0).unwrap();
        assert_relative_eq!(profile[0], 1.0, epsilon = 1e-12);
        for i in 1..profile.len() {
            assert!(
                profile[i] <= profile[i - 1] + 1e-12,
                "t = {}: profile rises at point {}",
                snapshot.time,
                i
            );
            assert!(profile[i] >= -1e-12, "t = {}: negative value at point {}", snapshot.time, i);
        }
    }

    let last = output.final_snapshot().unwrap().profile(Field::PoreWater, 0).unwrap();
    assert!(last[last.len() - 1] < 0.1);
}

#[test]
fn test_reference_flux_points_downward_early() {
    let output = run(&reference_scenario());
    let early = &output.snapshots[1];
    assert_relative_eq!(early.time, 0.1, epsilon = 1e-9);

    let c = early.profile(Field::PoreWater, 0).unwrap();
    let flux = early.profile(Field::Flux, 0).unwrap();
    for i in 1..c.len() - 1 {
        if c[i] > 1e-8 {
            assert!(flux[i] > 0.0, "flux at point {} is {}", i, flux[i]);
        } else {
            assert!(flux[i] > -1e-10);
        }
    }
}

#[test]
fn test_reference_total_includes_sorbed_phase() {
    let output = run(&reference_scenario());
    let last = output.final_snapshot().unwrap();
    // Koc·foc = 10 L/kg
    for point in 0..last.n_points() {
        let c = last.value(Field::PoreWater, 0, point).unwrap();
        assert_relative_eq!(last.value(Field::Solid, 0, point).unwrap(), 10.0 * c, epsilon = 1e-9);
        assert_relative_eq!(
            last.value(Field::Total, 0, point).unwrap(),
            POROSITY * c + DENSITY * 10.0 * c,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_metadata_describes_run() {
    let output = run(&reference_scenario());
    assert_eq!(output.get_metadata("steps"), Some("100"));
    assert_eq!(output.get_metadata("scheme"), Some("Crank-Nicolson"));
    assert_eq!(output.get_metadata("newton_iterations"), Some("0"));
    assert_eq!(output.get_metadata("points"), Some("21"));
}

// =================================================================================================
// Units
// =================================================================================================

#[test]
fn test_unit_systems_give_identical_profiles() {
    let reference = run(&reference_scenario());

    let mut config = reference_scenario();
    config.units = UnitSystem { length: LengthUnit::Meter, time: TimeUnit::Day, ..Default::default() };
    config.layers[0].thickness = 0.1;
    config.options.end_time = 365.25;
    config.options.time_step = 3.6525;
    let converted = run(&config);

    let a = reference.final_snapshot().unwrap();
    let b = converted.final_snapshot().unwrap();
    assert_relative_eq!(b.time, 365.25, epsilon = 1e-9);
    assert_relative_eq!(b.depth[b.n_points() - 1], 0.1, epsilon = 1e-12);
    let error = compute_l2_error(
        b.profile(Field::PoreWater, 0).unwrap(),
        a.profile(Field::PoreWater, 0).unwrap(),
    );
    assert!(error < 1e-9, "profiles differ by {error}");

    // flux: concentration·cm/yr vs concentration·m/day
    let fa = a.value(Field::Flux, 0, 1).unwrap();
    let fb = b.value(Field::Flux, 0, 1).unwrap();
    assert!(relative_error(fb, fa / 100.0 / 365.25) < 1e-6);
}

// =================================================================================================
// Configuration input
// =================================================================================================

#[test]
fn test_json_configuration_runs() {
    let json = r#"{
        "chemicals": [{ "name": "A", "diffusivity": 1e-5 }],
        "components": [{ "name": "sand", "porosity": 0.5, "density": 1.3 }],
        "matrices": [{ "name": "sand", "components": [{ "component": "sand", "fraction": 1.0 }] }],
        "layers": [{ "name": "cap", "thickness": 5.0, "points": 11, "matrix": "sand" }],
        "sorption": [
            { "component": "sand", "chemical": "A", "isotherm": { "kind": "LinearKd", "kd": 2.0 } }
        ],
        "boundaries": [
            { "chemical": "A", "top": { "kind": "FixedConcentration", "concentration": 1.0 } }
        ],
        "options": { "end_time": 0.5, "time_step": 0.05, "outputs": 3, "scheme": "Implicit" }
    }"#;
    let config: Config = serde_json::from_str(json).expect("valid json");
    let output = run(&config);
    assert_eq!(output.len(), 3);
    assert_eq!(output.get_metadata("scheme"), Some("Implicit"));
}

#[test]
fn test_unknown_names_are_rejected() {
    let config = single_chemical(
        SolverOptions::new(1.0, 0.1),
        4.0,
        5,
        TopBoundary::FixedConcentration { concentration: 1.0 },
        BottomBoundary::ZeroGradient,
    )
    .with_initial(InitialCondition::dissolved("cap", "B", Profile::Uniform { value: 1.0 }));
    let err = Scenario::new(&config).unwrap_err();
    assert_eq!(err, ConfigError::UnknownName { kind: "chemical", name: "B".into() });
}

#[test]
fn test_single_point_layer_is_rejected() {
    let config = single_chemical(
        SolverOptions::new(1.0, 0.1),
        4.0,
        1,
        TopBoundary::FixedConcentration { concentration: 1.0 },
        BottomBoundary::ZeroGradient,
    );
    assert!(matches!(Scenario::new(&config), Err(ConfigError::TooFewPoints { points: 1, .. })));
}

#[test]
fn test_missing_boundary_condition_is_rejected() {
    let config = sand_cap(SolverOptions::new(1.0, 0.1), 4.0, 5).with_chemical(Chemical::new("A", 1e-5));
    assert!(matches!(Scenario::new(&config), Err(ConfigError::LengthMismatch { .. })));
}

#[test]
fn test_reversed_time_window_is_rejected() {
    let mut config = reference_scenario();
    config.options.start_time = 2.0;
    assert!(matches!(Scenario::new(&config), Err(ConfigError::TimeWindow { .. })));
}
