//! Dissipative point coupling between particles and a lattice fluid.

use phyz_lbm::{LbFluid, philox_double2};
use phyz_math::Vec3;

use crate::error::{CouplingError, Result};

/// What a particle integrator needs from a fluid.
pub trait FluidCoupling {
    /// Fluid velocity at `pos`.
    fn interpolated_velocity_at(&self, pos: &Vec3) -> Vec3;

    /// Force density that acted on the fluid at `pos` during its last step.
    fn interpolated_force_at(&self, pos: &Vec3) -> Vec3;

    /// Deposit `force` at `pos`; it acts during the fluid's next step.
    fn apply_force_at(&mut self, pos: &Vec3, force: &Vec3);
}

impl FluidCoupling for LbFluid {
    fn interpolated_velocity_at(&self, pos: &Vec3) -> Vec3 {
        LbFluid::interpolated_velocity_at(self, pos)
    }

    fn interpolated_force_at(&self, pos: &Vec3) -> Vec3 {
        LbFluid::interpolated_force_at(self, pos)
    }

    fn apply_force_at(&mut self, pos: &Vec3, force: &Vec3) {
        LbFluid::apply_force_at(self, pos, force)
    }
}

/// A point particle as seen by the coupling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointParticle {
    /// Stable identifier; keys the particle's noise stream.
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Site slot reserved for particle noise so it never collides with the
/// fluid's per-site draws.
const NOISE_SALT: u32 = u32::MAX;

/// Friction coupling `F = −γ (v − u(x)) + F_noise`.
///
/// The noise has zero mean and variance `2 kT γ / τ` per component, which
/// balances the friction at temperature kT. The opposite of every particle
/// force is spread into the fluid, so the pair exchanges momentum exactly.
#[derive(Debug, Clone)]
pub struct ViscousCoupling {
    friction: f64,
    kt: f64,
    seed: u32,
    tau: f64,
    counter: u32,
    noise_amplitude: f64,
}

impl ViscousCoupling {
    pub fn new(friction: f64, kt: f64, seed: u32, tau: f64) -> Result<Self> {
        if !(friction.is_finite() && friction > 0.0) {
            return Err(CouplingError::InvalidFriction(friction));
        }
        if !(kt.is_finite() && kt >= 0.0) {
            return Err(CouplingError::InvalidTemperature(kt));
        }
        if !(tau.is_finite() && tau > 0.0) {
            return Err(CouplingError::InvalidTimeStep(tau));
        }
        Ok(Self {
            friction,
            kt,
            seed,
            tau,
            counter: 0,
            noise_amplitude: (24.0 * kt * friction / tau).sqrt(),
        })
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn kt(&self) -> f64 {
        self.kt
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Resume the noise stream at a saved counter.
    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }

    /// Random force on particle `id` for the current counter.
    pub fn noise(&self, id: u32) -> Vec3 {
        if self.kt == 0.0 {
            return Vec3::zeros();
        }
        let (a, b) = philox_double2(self.counter, id, 0, NOISE_SALT, 0, self.seed);
        let (c, _) = philox_double2(self.counter, id, 0, NOISE_SALT, 1, self.seed);
        Vec3::new(a - 0.5, b - 0.5, c - 0.5) * self.noise_amplitude
    }

    /// Force on `particle` in a fluid moving with `fluid_velocity` at its position.
    pub fn drag_force(&self, particle: &PointParticle, fluid_velocity: &Vec3) -> Vec3 {
        -self.friction * (particle.velocity - fluid_velocity) + self.noise(particle.id)
    }

    /// Couple every particle to the fluid once: compute the particle forces,
    /// spread their opposites into the fluid and advance the noise counter.
    /// Returns the force on each particle, in input order.
    pub fn couple<F: FluidCoupling + ?Sized>(
        &mut self,
        fluid: &mut F,
        particles: &[PointParticle],
    ) -> Vec<Vec3> {
        // Sample every velocity before depositing any force.
        let velocities: Vec<Vec3> = particles
            .iter()
            .map(|p| fluid.interpolated_velocity_at(&p.position))
            .collect();
        let forces: Vec<Vec3> = particles
            .iter()
            .zip(&velocities)
            .map(|(p, u)| self.drag_force(p, u))
            .collect();
        for (p, f) in particles.iter().zip(&forces) {
            fluid.apply_force_at(&p.position, &(-f));
        }
        log::trace!(
            "coupled {} particles at counter {}",
            particles.len(),
            self.counter
        );
        self.counter = self.counter.wrapping_add(1);
        forces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Uniform flow that records deposited forces.
    struct UniformFlow {
        velocity: Vec3,
        deposited: Vec<(Vec3, Vec3)>,
    }

    impl FluidCoupling for UniformFlow {
        fn interpolated_velocity_at(&self, _pos: &Vec3) -> Vec3 {
            self.velocity
        }

        fn interpolated_force_at(&self, _pos: &Vec3) -> Vec3 {
            Vec3::zeros()
        }

        fn apply_force_at(&mut self, pos: &Vec3, force: &Vec3) {
            self.deposited.push((*pos, *force));
        }
    }

    fn particle(id: u32, velocity: Vec3) -> PointParticle {
        PointParticle {
            id,
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity,
        }
    }

    #[test]
    fn test_drag_opposes_relative_velocity() {
        let coupling = ViscousCoupling::new(2.0, 0.0, 0, 1.0).unwrap();
        let p = particle(0, Vec3::new(1.0, 0.0, -0.5));
        let f = coupling.drag_force(&p, &Vec3::new(0.5, 0.0, 0.0));
        assert_relative_eq!(f, Vec3::new(-1.0, 0.0, 1.0));
    }

    #[test]
    fn test_fluid_receives_opposite_force() {
        let mut coupling = ViscousCoupling::new(1.5, 0.1, 9, 0.5).unwrap();
        let mut flow = UniformFlow {
            velocity: Vec3::new(0.1, 0.0, 0.0),
            deposited: Vec::new(),
        };
        let particles = [particle(3, Vec3::new(0.0, 0.2, 0.0)), particle(4, Vec3::zeros())];
        let forces = coupling.couple(&mut flow, &particles);
        assert_eq!(coupling.counter(), 1);
        assert_eq!(flow.deposited.len(), 2);
        let on_particles: Vec3 = forces.iter().sum();
        let on_fluid: Vec3 = flow.deposited.iter().map(|(_, f)| *f).sum();
        assert_relative_eq!(on_particles + on_fluid, Vec3::zeros(), epsilon = 1e-15);
    }

    #[test]
    fn test_noise_is_reproducible_and_advances() {
        let mut coupling = ViscousCoupling::new(1.0, 1.0, 5, 1.0).unwrap();
        let first = coupling.noise(7);
        assert_eq!(first, coupling.noise(7));
        assert_ne!(first, coupling.noise(8));
        coupling.set_counter(1);
        assert_ne!(first, coupling.noise(7));
        coupling.set_counter(0);
        assert_eq!(first, coupling.noise(7));
    }

    #[test]
    fn test_noise_variance_balances_friction() {
        let (gamma, kt, tau) = (2.0, 0.5, 0.1);
        let mut coupling = ViscousCoupling::new(gamma, kt, 11, tau).unwrap();
        let samples = 20_000;
        let mut sum = Vec3::zeros();
        let mut sum_sq = Vec3::zeros();
        for counter in 0..samples {
            coupling.set_counter(counter);
            let f = coupling.noise(1);
            sum += f;
            sum_sq += f.component_mul(&f);
        }
        let n = samples as f64;
        let expected = 2.0 * kt * gamma / tau;
        for d in 0..3 {
            assert!((sum[d] / n).abs() < 0.05 * expected.sqrt());
            assert_relative_eq!(sum_sq[d] / n, expected, max_relative = 0.05);
        }
    }

    #[test]
    fn test_zero_temperature_has_no_noise() {
        let coupling = ViscousCoupling::new(1.0, 0.0, 1, 1.0).unwrap();
        assert_eq!(coupling.noise(0), Vec3::zeros());
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(matches!(
            ViscousCoupling::new(0.0, 0.0, 0, 1.0),
            Err(CouplingError::InvalidFriction(_))
        ));
        assert!(ViscousCoupling::new(1.0, -1.0, 0, 1.0).is_err());
        assert!(ViscousCoupling::new(1.0, 0.0, 0, 0.0).is_err());
    }
}
