//! Saving and resuming runs.

mod common;

use approx::assert_relative_eq;
use common::{assert_bit_identical, drive, perturbed, populations, thermal_config};
use phyz_lbm::{CheckpointFormat, LbConfig, LbError, LbFluid};

#[test]
fn test_resume_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    for format in [CheckpointFormat::Binary, CheckpointFormat::Text] {
        let mut straight = perturbed(thermal_config());
        drive(&mut straight, 0..20);

        let mut first = perturbed(thermal_config());
        drive(&mut first, 0..10);
        let path = dir.path().join(format!("state-{format:?}"));
        first.save_checkpoint(&path, format).unwrap();

        let mut resumed = LbFluid::new(thermal_config()).unwrap();
        resumed.load_checkpoint(&path, format).unwrap();
        assert_eq!(resumed.time_step(), 10);
        assert_bit_identical(&first, &resumed);
        drive(&mut resumed, 10..20);
        assert_bit_identical(&straight, &resumed);
    }
}

#[test]
fn test_resume_under_other_node_grid() {
    let config = LbConfig {
        box_dimensions: [8.0, 6.0, 4.0],
        ..thermal_config()
    };
    let mut straight = perturbed(config.clone());
    drive(&mut straight, 0..12);

    let mut first = perturbed(config.clone());
    drive(&mut first, 0..6);
    let checkpoint = first.to_checkpoint();

    let mut resumed = LbFluid::new(LbConfig {
        node_grid: [2, 3, 2],
        ..config
    })
    .unwrap();
    resumed.restore(&checkpoint).unwrap();
    drive(&mut resumed, 6..12);
    assert_bit_identical(&straight, &resumed);
}

#[test]
fn test_model_state_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let mut fluid = perturbed(thermal_config());
    fluid.set_odd_rate(1.3).unwrap();
    fluid.set_ext_force_density([1e-6, 0.0, -1e-6]).unwrap();
    fluid.integrate_n(3);
    fluid.save_checkpoint(&path, CheckpointFormat::Text).unwrap();

    let mut other = LbFluid::new(thermal_config()).unwrap();
    other.load_checkpoint(&path, CheckpointFormat::Text).unwrap();
    assert_eq!(other.relaxation_rates(), fluid.relaxation_rates());
    assert_eq!(other.model().ext_force(), fluid.model().ext_force());
    assert_eq!(other.model().kt(), fluid.model().kt());
    assert_eq!(other.seed(), fluid.seed());
    assert_eq!(other.time_step(), 3);
}

#[test]
fn test_grid_mismatch_leaves_fluid_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.bin");
    let small = perturbed(thermal_config());
    small.save_checkpoint(&path, CheckpointFormat::Binary).unwrap();

    let mut large = LbFluid::new(LbConfig {
        box_dimensions: [8.0, 6.0, 4.0],
        ..thermal_config()
    })
    .unwrap();
    large.integrate_n(2);
    let before = populations(&large);
    let result = large.load_checkpoint(&path, CheckpointFormat::Binary);
    assert!(matches!(result, Err(LbError::CheckpointMismatch(_))));
    assert_eq!(populations(&large), before);
    assert_eq!(large.time_step(), 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let mut fluid = LbFluid::new(LbConfig::default()).unwrap();
    let result = fluid.load_checkpoint("/nonexistent/lb/checkpoint", CheckpointFormat::Binary);
    assert!(matches!(result, Err(LbError::Io(_))));
}

#[test]
fn test_load_updates_reported_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thermal.bin");
    let config = LbConfig {
        agrid: 0.5,
        tau: 0.25,
        box_dimensions: [3.5, 3.0, 2.0],
        kt: 1e-3,
        ext_force_density: [1e-5, 0.0, 0.0],
        ..thermal_config()
    };
    let mut hot = LbFluid::new(config.clone()).unwrap();
    hot.set_bulk_viscosity(0.7).unwrap();
    hot.save_checkpoint(&path, CheckpointFormat::Binary).unwrap();

    let mut cold = LbFluid::new(LbConfig {
        kt: 0.0,
        ext_force_density: [0.0; 3],
        viscosity: 0.1,
        seed: 2,
        ..config
    })
    .unwrap();
    cold.load_checkpoint(&path, CheckpointFormat::Binary).unwrap();

    assert_relative_eq!(cold.kt(), 1e-3, max_relative = 1e-14);
    assert_relative_eq!(cold.ext_force_density()[0], 1e-5, max_relative = 1e-14);
    assert_relative_eq!(cold.viscosity(), hot.viscosity(), max_relative = 1e-14);
    assert_relative_eq!(cold.bulk_viscosity(), 0.7, max_relative = 1e-12);
    assert_eq!(cold.seed(), hot.seed());
    assert_relative_eq!(cold.config().kt, 1e-3, max_relative = 1e-14);
    assert_eq!(cold.config().seed, hot.seed());
    assert!(cold.config().bulk_viscosity.is_some());

    // Re-applying the reported values must keep the thermostat on.
    cold.set_kt(cold.kt()).unwrap();
    cold.set_ext_force_density(cold.ext_force_density()).unwrap();
    assert_relative_eq!(cold.model().kt(), hot.model().kt(), max_relative = 1e-14);
    assert_relative_eq!(
        cold.model().ext_force()[0],
        hot.model().ext_force()[0],
        max_relative = 1e-14
    );
}
