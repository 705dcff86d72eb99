//! Run-time monitoring of a lattice Boltzmann fluid.
//!
//! The kernels never check their own numerics. This crate compares a fluid
//! against a baseline taken earlier and against fixed sanity bounds:
//! - mass drift (must stay at rounding level)
//! - momentum drift (changes only through applied forces)
//! - smallest density and largest Mach number

pub mod conservation;

pub use conservation::{FluidBaseline, FluidMonitor, SanityBounds, Violation};
