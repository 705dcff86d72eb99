//! Conservation and stability checks for a fluid.

use phyz_lbm::{C_S_SQ, LbFluid};
use phyz_math::Vec3;

/// Reference quantities to measure drift against.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidBaseline {
    pub mass: f64,
    pub momentum: Vec3,
}

impl FluidBaseline {
    pub fn new(fluid: &LbFluid) -> Self {
        Self {
            mass: fluid.total_mass(),
            momentum: fluid.total_momentum(),
        }
    }

    /// Account for momentum injected on purpose, e.g. by a known body force.
    pub fn add_momentum(&mut self, momentum: Vec3) {
        self.momentum += momentum;
    }
}

/// State of a fluid relative to its baseline, in lattice units.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidMonitor {
    /// Relative mass error: |M - M₀| / M₀
    pub mass_drift: f64,
    /// Absolute momentum error: p - p₀
    pub momentum_drift: Vec3,
    pub min_density: f64,
    pub max_speed: f64,
    /// `max_speed / c_s`
    pub max_mach: f64,
    pub time_step: u32,
}

impl FluidMonitor {
    pub fn check(baseline: &FluidBaseline, fluid: &LbFluid) -> Self {
        let mass = fluid.total_mass();
        let mass_drift = if baseline.mass.abs() > 1e-12 {
            (mass - baseline.mass).abs() / baseline.mass.abs()
        } else {
            (mass - baseline.mass).abs()
        };
        let (min_density, max_speed) = fluid.density_and_speed_extrema();
        Self {
            mass_drift,
            momentum_drift: fluid.total_momentum() - baseline.momentum,
            min_density,
            max_speed,
            max_mach: max_speed / C_S_SQ.sqrt(),
            time_step: fluid.time_step(),
        }
    }
}

/// A bound exceeded by a [`FluidMonitor`] reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Violation {
    MassDrift(f64),
    MomentumDrift(f64),
    LowDensity(f64),
    HighMach(f64),
    NotFinite,
}

/// Limits beyond which a run is considered broken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanityBounds {
    pub mass_tolerance: f64,
    pub momentum_tolerance: f64,
    pub min_density: f64,
    pub max_mach: f64,
}

impl Default for SanityBounds {
    fn default() -> Self {
        Self {
            mass_tolerance: 1e-10,
            momentum_tolerance: 1e-8,
            min_density: 1e-3,
            max_mach: 0.3,
        }
    }
}

impl SanityBounds {
    pub fn violations(&self, monitor: &FluidMonitor) -> Vec<Violation> {
        let finite = monitor.mass_drift.is_finite()
            && monitor.momentum_drift.iter().all(|p| p.is_finite())
            && monitor.min_density.is_finite()
            && monitor.max_speed.is_finite();
        if !finite {
            return vec![Violation::NotFinite];
        }
        let mut out = Vec::new();
        if monitor.mass_drift > self.mass_tolerance {
            out.push(Violation::MassDrift(monitor.mass_drift));
        }
        let momentum = monitor.momentum_drift.norm();
        if momentum > self.momentum_tolerance {
            out.push(Violation::MomentumDrift(momentum));
        }
        if monitor.min_density < self.min_density {
            out.push(Violation::LowDensity(monitor.min_density));
        }
        if monitor.max_mach > self.max_mach {
            out.push(Violation::HighMach(monitor.max_mach));
        }
        for v in &out {
            log::warn!("time step {}: {v:?}", monitor.time_step);
        }
        out
    }

    pub fn is_violated(&self, monitor: &FluidMonitor) -> bool {
        !self.violations(monitor).is_empty()
    }
}
