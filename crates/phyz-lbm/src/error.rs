//! Error types for phyz-lbm.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LbError {
    #[error("invalid viscosity {0}: must be positive and finite")]
    InvalidViscosity(f64),

    #[error("relaxation rate {name} = {value} outside (0, 2)")]
    InvalidRelaxationRate { name: &'static str, value: f64 },

    #[error("invalid thermal energy kT = {0}: must be non-negative and finite")]
    InvalidTemperature(f64),

    #[error("invalid lattice parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid domain decomposition: {0}")]
    InvalidDecomposition(String),

    #[error("{kernel} kernel needs at least {required} ghost layers, got {actual}")]
    InsufficientGhostLayers {
        kernel: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("lattice Boltzmann fluid accessed before initialization")]
    NotInitialized,

    #[error("node {0:?} outside the lattice")]
    NodeOutOfRange([i64; 3]),

    #[error("checkpoint does not match the fluid: {0}")]
    CheckpointMismatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, LbError>;
