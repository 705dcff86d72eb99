//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use phyz_lbm::{LbConfig, LbFluid};
use phyz_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Thermalized config on a grid whose x extent is not a multiple of four.
pub fn thermal_config() -> LbConfig {
    LbConfig {
        viscosity: 0.3,
        box_dimensions: [7.0, 6.0, 4.0],
        kt: 1e-4,
        seed: 17,
        ..LbConfig::default()
    }
}

/// Fluid with a random but reproducible initial velocity and density field.
pub fn perturbed(config: LbConfig) -> LbFluid {
    let mut fluid = LbFluid::new(config).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let [nx, ny, nz] = fluid.grid().map(|n| n as i64);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let u = Vec3::new(
                    0.02 * (rng.r#gen::<f64>() - 0.5),
                    0.02 * (rng.r#gen::<f64>() - 0.5),
                    0.02 * (rng.r#gen::<f64>() - 0.5),
                );
                fluid.set_node_density([x, y, z], 1.0 + 0.05 * (rng.r#gen::<f64>() - 0.5)).unwrap();
                fluid.set_node_velocity([x, y, z], &u).unwrap();
            }
        }
    }
    fluid
}

/// Integrate steps `steps` with a point force that moves every step.
pub fn drive(fluid: &mut LbFluid, steps: std::ops::Range<usize>) {
    for s in steps {
        let t = s as f64;
        fluid.apply_force_at(
            &Vec3::new(1.3 + 0.37 * t, 2.7 - 0.11 * t, 0.9 + 0.05 * t),
            &Vec3::new(1e-3, -5e-4, 2e-4),
        );
        fluid.integrate();
    }
}

/// Stored populations in global order.
pub fn populations(fluid: &LbFluid) -> Vec<f64> {
    fluid.to_checkpoint().populations
}

/// Bitwise comparison with a readable failure.
pub fn assert_bit_identical(a: &LbFluid, b: &LbFluid) {
    let (pa, pb) = (populations(a), populations(b));
    assert_eq!(pa.len(), pb.len());
    if let Some(i) = (0..pa.len()).find(|&i| pa[i].to_bits() != pb[i].to_bits()) {
        panic!(
            "population {} of site {} differs: {:e} vs {:e}",
            i % 19,
            i / 19,
            pa[i],
            pb[i]
        );
    }
}
