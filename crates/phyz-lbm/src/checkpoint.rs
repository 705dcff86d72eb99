//! Checkpoint files.
//!
//! A checkpoint holds every owned population in global z-y-x order, so it
//! can be loaded under any node grid, plus the lattice model state needed to
//! continue the noise stream where it left off.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LbError, Result};
use crate::model::RelaxationRates;

pub const CHECKPOINT_VERSION: u32 = 1;

/// On-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointFormat {
    /// bincode, native f64 bits.
    Binary,
    /// JSON with shortest round-trip floats.
    Text,
}

/// Full fluid state in lattice units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub grid: [usize; 3],
    pub viscosity: f64,
    pub rates: RelaxationRates,
    pub kt: f64,
    pub seed: u32,
    pub time_step: u32,
    pub density_offset: f64,
    pub ext_force: [f64; 3],
    /// Stored populations, 19 per site.
    pub populations: Vec<f64>,
    /// Force density accumulated for the next step, 3 per site.
    pub pending_force: Vec<f64>,
    /// Force density applied by the last step, 3 per site.
    pub last_applied_force: Vec<f64>,
}

impl Checkpoint {
    pub fn write(&self, path: impl AsRef<Path>, format: CheckpointFormat) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            CheckpointFormat::Binary => bincode::serialize_into(&mut writer, self)?,
            CheckpointFormat::Text => serde_json::to_writer(&mut writer, self)?,
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>, format: CheckpointFormat) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let checkpoint: Self = match format {
            CheckpointFormat::Binary => bincode::deserialize_from(reader)?,
            CheckpointFormat::Text => serde_json::from_reader(reader)?,
        };
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(LbError::CheckpointMismatch(format!(
                "unsupported checkpoint version {}",
                checkpoint.version
            )));
        }
        Ok(checkpoint)
    }

    /// Check that the payload matches a lattice of `grid` sites.
    pub fn validate_for(&self, grid: [usize; 3]) -> Result<()> {
        if self.grid != grid {
            return Err(LbError::CheckpointMismatch(format!(
                "checkpoint grid {:?} differs from lattice grid {grid:?}",
                self.grid
            )));
        }
        let sites: usize = grid.iter().product();
        for (name, len, per_site) in [
            ("populations", self.populations.len(), crate::stencil::Q),
            ("pending force", self.pending_force.len(), 3),
            ("last applied force", self.last_applied_force.len(), 3),
        ] {
            if len != sites * per_site {
                return Err(LbError::CheckpointMismatch(format!(
                    "{name}: expected {} values, found {len}",
                    sites * per_site
                )));
            }
        }
        self.rates.validate()?;
        Ok(())
    }
}
