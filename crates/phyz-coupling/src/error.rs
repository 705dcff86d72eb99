//! Error types for phyz-coupling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouplingError {
    #[error("invalid friction coefficient {0}: must be positive and finite")]
    InvalidFriction(f64),

    #[error("invalid thermal energy kT = {0}: must be non-negative and finite")]
    InvalidTemperature(f64),

    #[error("invalid coupling time step {0}: must be positive and finite")]
    InvalidTimeStep(f64),
}

pub type Result<T> = std::result::Result<T, CouplingError>;
