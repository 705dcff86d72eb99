//! Fluid configuration in MD units and its conversion to lattice units.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LbError, Result};
use crate::field::Layout;
use crate::model::{RelaxationRates, omega_from_bulk_viscosity};
use crate::sweep::{KernelVariant, Vectorization};

/// Construction parameters of an [`LbFluid`](crate::LbFluid).
///
/// Lengths, times and energies are in MD units; `agrid` and `tau` fix the
/// lattice spacing and time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LbConfig {
    /// Kinematic viscosity.
    pub viscosity: f64,
    /// Bulk viscosity; `None` keeps the bulk rate equal to the shear rate.
    pub bulk_viscosity: Option<f64>,
    /// Mass density.
    pub density: f64,
    /// Lattice spacing.
    pub agrid: f64,
    /// Lattice time step.
    pub tau: f64,
    /// Periodic box edge lengths; each must be a multiple of `agrid`.
    pub box_dimensions: [f64; 3],
    /// Blocks per axis.
    pub node_grid: [usize; 3],
    pub ghost_layers: usize,
    /// Thermal energy; zero disables fluctuations.
    pub kt: f64,
    pub seed: u32,
    /// External body force density.
    pub ext_force_density: [f64; 3],
    pub layout: Layout,
    pub kernel: KernelVariant,
    pub vectorization: Vectorization,
    /// Store populations relative to the rest equilibrium at `density`.
    pub zero_centered_pdfs: bool,
}

impl Default for LbConfig {
    fn default() -> Self {
        Self {
            viscosity: 1.0 / 6.0,
            bulk_viscosity: None,
            density: 1.0,
            agrid: 1.0,
            tau: 1.0,
            box_dimensions: [8.0, 8.0, 8.0],
            node_grid: [1, 1, 1],
            ghost_layers: 2,
            kt: 0.0,
            seed: 0,
            ext_force_density: [0.0; 3],
            layout: Layout::default(),
            kernel: KernelVariant::default(),
            vectorization: Vectorization::default(),
            zero_centered_pdfs: true,
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LbError::InvalidParameter(format!("{name} must be positive, got {value}")))
    }
}

impl LbConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every parameter, including those the lattice model would reject
    /// after unit conversion.
    pub fn validate(&self) -> Result<()> {
        positive("agrid", self.agrid)?;
        positive("tau", self.tau)?;
        positive("density", self.density)?;
        self.grid()?;
        let required = self.kernel.required_ghost_layers();
        if self.ghost_layers < required {
            return Err(LbError::InsufficientGhostLayers {
                kernel: self.kernel.name(),
                required,
                actual: self.ghost_layers,
            });
        }
        RelaxationRates::from_viscosity(self.lattice_viscosity())?;
        if let Some(bulk) = self.lattice_bulk_viscosity() {
            if !(bulk.is_finite() && bulk > 0.0) {
                return Err(LbError::InvalidViscosity(bulk));
            }
            let omega = omega_from_bulk_viscosity(bulk);
            if !(omega > 0.0 && omega < 2.0) {
                return Err(LbError::InvalidRelaxationRate { name: "bulk", value: omega });
            }
        }
        if !(self.kt.is_finite() && self.kt >= 0.0) {
            return Err(LbError::InvalidTemperature(self.kt));
        }
        if self.ext_force_density.iter().any(|f| !f.is_finite()) {
            return Err(LbError::InvalidParameter(format!(
                "external force density {:?} is not finite",
                self.ext_force_density
            )));
        }
        if self.lattice_viscosity() > 10.0 {
            log::warn!(
                "lattice viscosity {} is large; consider a smaller tau",
                self.lattice_viscosity()
            );
        }
        Ok(())
    }

    /// Lattice sites per axis.
    pub fn grid(&self) -> Result<[usize; 3]> {
        let mut grid = [0; 3];
        for d in 0..3 {
            let cells = self.box_dimensions[d] / self.agrid;
            let rounded = cells.round();
            if !(rounded >= 1.0 && (cells - rounded).abs() <= 1e-9 * rounded) {
                return Err(LbError::InvalidParameter(format!(
                    "box length {} is not a multiple of agrid {}",
                    self.box_dimensions[d], self.agrid
                )));
            }
            grid[d] = rounded as usize;
        }
        Ok(grid)
    }

    pub fn lattice_viscosity(&self) -> f64 {
        self.viscosity * self.tau / (self.agrid * self.agrid)
    }

    pub fn lattice_bulk_viscosity(&self) -> Option<f64> {
        self.bulk_viscosity
            .map(|nu| nu * self.tau / (self.agrid * self.agrid))
    }

    pub fn lattice_density(&self) -> f64 {
        self.density * self.agrid.powi(3)
    }

    pub fn lattice_kt(&self) -> f64 {
        self.kt * self.tau * self.tau / (self.agrid * self.agrid)
    }

    pub fn lattice_force_density(&self) -> [f64; 3] {
        let scale = self.agrid * self.agrid * self.tau * self.tau;
        self.ext_force_density.map(|f| f * scale)
    }
}
