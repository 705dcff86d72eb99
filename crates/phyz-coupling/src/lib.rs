//! Particle-fluid coupling.
//!
//! The particle side only ever sees the [`FluidCoupling`] surface: sample the
//! fluid velocity at a point and hand a force back. [`ViscousCoupling`]
//! builds the dissipative point coupling on top of it.

pub mod coupling;
pub mod error;

pub use coupling::{FluidCoupling, PointParticle, ViscousCoupling};
pub use error::{CouplingError, Result};
