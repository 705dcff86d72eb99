//! Lattice model parameters of the fluctuating MRT collision.
//!
//! All rates are relaxation frequencies ω in lattice units; the kernels use
//! the complementary eigenvalues γ = 1 − ω. Every setter validates first and
//! then replaces all affected rates together, followed by the change hook
//! that rebuilds the derived kernel constants. The kernels only ever see
//! [`KernelParams`] built from a consistent model.

use crate::error::{LbError, Result};
use crate::moments::{MODE_GROUP, ModeGroup, NORM};
use crate::stencil::Q;
use serde::{Deserialize, Serialize};

/// Boundary-slip tuning constant Λ of the two-relaxation-time relation.
pub const MAGIC_NUMBER: f64 = 3.0 / 16.0;

/// Shear relaxation rate for a kinematic viscosity in lattice units.
#[inline]
pub fn omega_from_viscosity(viscosity: f64) -> f64 {
    2.0 / (6.0 * viscosity + 1.0)
}

/// Inverse of [`omega_from_viscosity`].
#[inline]
pub fn viscosity_from_omega(omega: f64) -> f64 {
    (2.0 - omega) / (6.0 * omega)
}

/// Bulk relaxation rate for a bulk viscosity in lattice units.
#[inline]
pub fn omega_from_bulk_viscosity(bulk_viscosity: f64) -> f64 {
    2.0 / (9.0 * bulk_viscosity + 1.0)
}

/// Inverse of [`omega_from_bulk_viscosity`].
#[inline]
pub fn bulk_viscosity_from_omega(omega: f64) -> f64 {
    (2.0 - omega) / (9.0 * omega)
}

/// Odd-mode rate tied to the shear rate by the magic-number relation, which
/// places bounce-back walls exactly half-way between nodes.
#[inline]
pub fn magic_odd_rate(omega: f64) -> f64 {
    (4.0 - 2.0 * omega) / (4.0 * MAGIC_NUMBER * omega + 2.0 - omega)
}

/// Relaxation rates of the four non-conserved mode groups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxationRates {
    pub shear: f64,
    pub bulk: f64,
    pub odd: f64,
    pub even: f64,
}

impl RelaxationRates {
    /// Rates for a viscosity: shear, bulk and even share ω, odd follows the
    /// magic-number relation.
    pub fn from_viscosity(viscosity: f64) -> Result<Self> {
        if !(viscosity.is_finite() && viscosity > 0.0) {
            return Err(LbError::InvalidViscosity(viscosity));
        }
        let omega = omega_from_viscosity(viscosity);
        let rates = Self {
            shear: omega,
            bulk: omega,
            odd: magic_odd_rate(omega),
            even: omega,
        };
        rates.validate()?;
        Ok(rates)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("shear", self.shear),
            ("bulk", self.bulk),
            ("odd", self.odd),
            ("even", self.even),
        ] {
            check_rate(name, value)?;
        }
        Ok(())
    }

    /// Rate applied to moment `k`; conserved moments report zero.
    pub fn for_mode(&self, k: usize) -> f64 {
        match MODE_GROUP[k] {
            ModeGroup::Conserved => 0.0,
            ModeGroup::Bulk => self.bulk,
            ModeGroup::Shear => self.shear,
            ModeGroup::Odd => self.odd,
            ModeGroup::Even => self.even,
        }
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value < 2.0 {
        Ok(())
    } else {
        Err(LbError::InvalidRelaxationRate { name, value })
    }
}

fn check_kt(kt: f64) -> Result<()> {
    if kt.is_finite() && kt >= 0.0 {
        Ok(())
    } else {
        Err(LbError::InvalidTemperature(kt))
    }
}

/// Constants consumed by the collision kernel, derived from a [`LatticeModel`].
#[derive(Debug, Clone, Copy)]
pub struct KernelParams {
    /// γ_k = 1 − ω_k per moment (unused for conserved moments).
    pub gamma: [f64; Q],
    /// `sqrt(12 kT b_k (1 − γ_k²))` per moment; multiplied by √ρ and a
    /// centred uniform draw it gives a unit-variance-scaled noise increment.
    pub noise_amplitude: [f64; Q],
    /// False when kT is zero: no draws are made and no noise is added.
    pub thermalized: bool,
    pub density_offset: f64,
    /// External force density added to every site, in lattice units.
    pub ext_force: [f64; 3],
    pub seed: u32,
    pub time_step: u32,
}

/// Fluctuating MRT lattice model state.
#[derive(Debug, Clone)]
pub struct LatticeModel {
    rates: RelaxationRates,
    kt: f64,
    seed: u32,
    time_step: u32,
    density_offset: f64,
    ext_force: [f64; 3],
    derived: KernelParams,
}

impl LatticeModel {
    /// Model for a kinematic viscosity and thermal energy, both in lattice
    /// units. `kt == 0` gives the deterministic MRT model.
    pub fn fluctuating(viscosity: f64, kt: f64, seed: u32) -> Result<Self> {
        let rates = RelaxationRates::from_viscosity(viscosity)?;
        check_kt(kt)?;
        let mut model = Self {
            rates,
            kt,
            seed,
            time_step: 0,
            density_offset: 0.0,
            ext_force: [0.0; 3],
            derived: KernelParams {
                gamma: [0.0; Q],
                noise_amplitude: [0.0; Q],
                thermalized: false,
                density_offset: 0.0,
                ext_force: [0.0; 3],
                seed,
                time_step: 0,
            },
        };
        model.on_lattice_model_change();
        Ok(model)
    }

    pub fn rates(&self) -> RelaxationRates {
        self.rates
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn time_step(&self) -> u32 {
        self.time_step
    }

    pub fn density_offset(&self) -> f64 {
        self.density_offset
    }

    pub fn ext_force(&self) -> [f64; 3] {
        self.ext_force
    }

    /// Kinematic viscosity implied by the current shear rate.
    pub fn viscosity(&self) -> f64 {
        viscosity_from_omega(self.rates.shear)
    }

    /// Derived kernel constants for the current state.
    pub fn kernel_params(&self) -> &KernelParams {
        &self.derived
    }

    /// Reset shear, bulk, even and odd rates from a new viscosity.
    pub fn set_viscosity(&mut self, viscosity: f64) -> Result<()> {
        self.rates = RelaxationRates::from_viscosity(viscosity)?;
        log::debug!(
            "viscosity {viscosity}: omega_shear = {}, omega_odd = {}",
            self.rates.shear,
            self.rates.odd
        );
        self.on_lattice_model_change();
        Ok(())
    }

    pub fn set_bulk_viscosity(&mut self, bulk_viscosity: f64) -> Result<()> {
        if !(bulk_viscosity.is_finite() && bulk_viscosity > 0.0) {
            return Err(LbError::InvalidViscosity(bulk_viscosity));
        }
        self.set_bulk_rate(omega_from_bulk_viscosity(bulk_viscosity))
    }

    pub fn set_bulk_rate(&mut self, omega: f64) -> Result<()> {
        check_rate("bulk", omega)?;
        self.rates.bulk = omega;
        self.on_lattice_model_change();
        Ok(())
    }

    pub fn set_odd_rate(&mut self, omega: f64) -> Result<()> {
        check_rate("odd", omega)?;
        self.rates.odd = omega;
        self.on_lattice_model_change();
        Ok(())
    }

    pub fn set_even_rate(&mut self, omega: f64) -> Result<()> {
        check_rate("even", omega)?;
        self.rates.even = omega;
        self.on_lattice_model_change();
        Ok(())
    }

    /// Replace all four rates at once.
    pub fn set_rates(&mut self, rates: RelaxationRates) -> Result<()> {
        rates.validate()?;
        self.rates = rates;
        self.on_lattice_model_change();
        Ok(())
    }

    pub fn set_kt(&mut self, kt: f64) -> Result<()> {
        check_kt(kt)?;
        self.kt = kt;
        self.on_lattice_model_change();
        Ok(())
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.on_lattice_model_change();
    }

    pub fn set_time_step(&mut self, time_step: u32) {
        self.time_step = time_step;
        self.on_lattice_model_change();
    }

    pub fn set_density_offset(&mut self, density_offset: f64) {
        self.density_offset = density_offset;
        self.on_lattice_model_change();
    }

    pub fn set_ext_force(&mut self, force: [f64; 3]) {
        self.ext_force = force;
        self.on_lattice_model_change();
    }

    /// Count one completed collide/stream step. Noise draws are keyed by the
    /// counter, so this must run exactly once per step.
    pub fn advance_time_step(&mut self) {
        self.time_step = self.time_step.wrapping_add(1);
        self.on_lattice_model_change();
    }

    /// Rebuild the derived kernel constants. Called by every mutator.
    fn on_lattice_model_change(&mut self) {
        let mut gamma = [0.0; Q];
        let mut noise_amplitude = [0.0; Q];
        for k in 0..Q {
            if MODE_GROUP[k] == ModeGroup::Conserved {
                continue;
            }
            let g = 1.0 - self.rates.for_mode(k);
            gamma[k] = g;
            noise_amplitude[k] = (12.0 * self.kt * NORM[k] * (1.0 - g * g)).sqrt();
        }
        self.derived = KernelParams {
            gamma,
            noise_amplitude,
            thermalized: self.kt > 0.0,
            density_offset: self.density_offset,
            ext_force: self.ext_force,
            seed: self.seed,
            time_step: self.time_step,
        };
    }
}
