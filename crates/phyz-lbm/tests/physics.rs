//! Conservation laws and thermal statistics of the fluid.

mod common;

use approx::assert_relative_eq;
use common::{drive, perturbed, thermal_config};
use phyz_lbm::moments::{NORM, forward};
use phyz_lbm::{LbConfig, LbFluid, Q, RelaxationRates};
use phyz_math::Vec3;

#[test]
fn test_fluid_at_rest_stays_at_rest() {
    let mut fluid = LbFluid::new(LbConfig {
        box_dimensions: [6.0, 5.0, 4.0],
        density: 1.3,
        ..LbConfig::default()
    })
    .unwrap();
    fluid.integrate_n(50);
    let [nx, ny, nz] = fluid.grid().map(|n| n as i64);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                assert_eq!(fluid.node_density([x, y, z]).unwrap(), 1.3);
                assert_eq!(fluid.node_velocity([x, y, z]).unwrap(), Vec3::zeros());
            }
        }
    }
}

#[test]
fn test_fluid_at_rest_without_zero_centering() {
    let mut fluid = LbFluid::new(LbConfig {
        box_dimensions: [5.0, 4.0, 4.0],
        zero_centered_pdfs: false,
        ..LbConfig::default()
    })
    .unwrap();
    fluid.integrate_n(50);
    for node in [[0, 0, 0], [4, 3, 3], [2, 1, 3]] {
        assert_relative_eq!(fluid.node_density(node).unwrap(), 1.0, epsilon = 1e-12);
        assert!(fluid.node_velocity(node).unwrap().norm() < 1e-14);
    }
}

#[test]
fn test_mass_and_momentum_balance() {
    let mut fluid = perturbed(thermal_config());
    let mass = fluid.total_mass();
    let momentum = fluid.total_momentum();
    let steps = 20;
    drive(&mut fluid, 0..steps);
    assert_relative_eq!(fluid.total_mass(), mass, max_relative = 1e-12);
    // Each step adds the point force; the last one is reported with an
    // extra half-force correction.
    let f = Vec3::new(1e-3, -5e-4, 2e-4);
    let expected = momentum + f * (steps as f64 + 0.5);
    assert_relative_eq!(fluid.total_momentum(), expected, epsilon = 1e-11);
}

#[test]
fn test_external_force_accelerates_uniformly() {
    let mut fluid = LbFluid::new(LbConfig {
        box_dimensions: [4.0, 4.0, 4.0],
        ..LbConfig::default()
    })
    .unwrap();
    fluid.set_ext_force_density([1e-5, 0.0, 0.0]).unwrap();
    fluid.integrate_n(10);
    // u = (10 F + F / 2) / rho at every node.
    let u = fluid.node_velocity([2, 1, 3]).unwrap();
    assert_relative_eq!(u.x, 10.5e-5, max_relative = 1e-10);
    assert_relative_eq!(fluid.total_momentum().x, 64.0 * 10.5e-5, max_relative = 1e-10);
}

/// Mean of `(m_k / (rho sqrt(b_k)))^2` over a long run on a single periodic
/// site, where streaming is the identity and density and momentum are
/// constant.
fn normalized_mode_variances(rates: Option<RelaxationRates>, kt: f64, steps: usize) -> [f64; Q] {
    let mut fluid = LbFluid::new(LbConfig {
        box_dimensions: [1.0, 1.0, 1.0],
        kt,
        seed: 12_345,
        ..LbConfig::default()
    })
    .unwrap();
    if let Some(rates) = rates {
        // set_viscosity resets the other rates, so it goes first.
        fluid.set_viscosity(phyz_lbm::model::viscosity_from_omega(rates.shear)).unwrap();
        fluid.set_bulk_viscosity((2.0 / rates.bulk - 1.0) / 9.0).unwrap();
        fluid.set_odd_rate(rates.odd).unwrap();
        fluid.set_even_rate(rates.even).unwrap();
        assert_relative_eq!(fluid.relaxation_rates().bulk, rates.bulk, epsilon = 1e-14);
    }
    // Burn-in.
    fluid.integrate_n(100);
    let mut sums = [0.0; Q];
    for _ in 0..steps {
        fluid.integrate();
        let m = forward(&fluid.node_populations([0, 0, 0]).unwrap());
        let rho = m[0];
        for k in 4..Q {
            let normalized = m[k] / (rho * NORM[k].sqrt());
            sums[k] += normalized * normalized;
        }
    }
    sums.map(|s| s / steps as f64)
}

#[test]
fn test_fluctuation_dissipation_independent_of_rates() {
    let kt = 1e-4;
    let defaults = normalized_mode_variances(None, kt, 50_000);
    let custom = RelaxationRates {
        shear: 0.8,
        bulk: 0.6,
        odd: 1.6,
        even: 1.4,
    };
    let tuned = normalized_mode_variances(Some(custom), kt, 50_000);
    for k in 4..Q {
        assert_relative_eq!(defaults[k], kt, max_relative = 0.06);
        assert_relative_eq!(tuned[k], kt, max_relative = 0.06);
    }
}

#[test]
fn test_set_viscosity_recomputes_rates() {
    let mut fluid = LbFluid::new(LbConfig {
        agrid: 0.5,
        tau: 0.25,
        box_dimensions: [2.0, 2.0, 2.0],
        ..LbConfig::default()
    })
    .unwrap();
    fluid.set_bulk_viscosity(0.2).unwrap();
    fluid.set_even_rate(0.9).unwrap();
    fluid.set_viscosity(0.5).unwrap();
    // nu_lb = 0.5 * 0.25 / 0.25
    let omega = 2.0 / (6.0 * 0.5 + 1.0);
    let rates = fluid.relaxation_rates();
    assert_relative_eq!(rates.shear, omega);
    assert_relative_eq!(rates.bulk, omega);
    assert_relative_eq!(rates.even, omega);
    assert_relative_eq!(rates.odd, phyz_lbm::model::magic_odd_rate(omega));
    assert_relative_eq!(fluid.viscosity(), 0.5, max_relative = 1e-14);
    assert!(fluid.set_viscosity(-1.0).is_err());
    assert_relative_eq!(fluid.viscosity(), 0.5, max_relative = 1e-14);
}

#[test]
fn test_shear_wave_decays_at_viscous_rate() {
    // u_x(y) = A sin(2 pi y / L) decays as exp(-nu k^2 t).
    let n = 32;
    let nu = 0.1;
    let mut fluid = LbFluid::new(LbConfig {
        viscosity: nu,
        box_dimensions: [1.0, n as f64, 1.0],
        ..LbConfig::default()
    })
    .unwrap();
    let k = 2.0 * std::f64::consts::PI / n as f64;
    let amplitude = 1e-4;
    for y in 0..n as i64 {
        let u = amplitude * (k * y as f64).sin();
        fluid.set_node_velocity([0, y, 0], &Vec3::new(u, 0.0, 0.0)).unwrap();
    }
    let steps = 250;
    fluid.integrate_n(steps);
    let projected: f64 = (0..n as i64)
        .map(|y| fluid.node_velocity([0, y, 0]).unwrap().x * (k * y as f64).sin())
        .sum::<f64>()
        * 2.0
        / n as f64;
    let expected = amplitude * (-nu * k * k * steps as f64).exp();
    assert_relative_eq!(projected, expected, max_relative = 0.03);
}
