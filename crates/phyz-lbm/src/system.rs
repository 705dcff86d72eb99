//! Lifecycle of the simulation's single fluid instance.

use crate::config::LbConfig;
use crate::error::{LbError, Result};
use crate::fluid::LbFluid;

/// Owner of at most one fluid. Queries before [`init`](Self::init) fail
/// with [`LbError::NotInitialized`] instead of returning default data.
#[derive(Debug, Default)]
pub struct LbSystem {
    fluid: Option<LbFluid>,
}

impl LbSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the fluid, replacing any existing one.
    pub fn init(&mut self, config: LbConfig) -> Result<&mut LbFluid> {
        if self.fluid.is_some() {
            log::warn!("re-initializing the LB fluid; previous state is discarded");
        }
        Ok(self.fluid.insert(LbFluid::new(config)?))
    }

    /// Drop the fluid. A no-op when none exists.
    pub fn destruct(&mut self) {
        self.fluid = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.fluid.is_some()
    }

    pub fn fluid(&self) -> Result<&LbFluid> {
        self.fluid.as_ref().ok_or(LbError::NotInitialized)
    }

    pub fn fluid_mut(&mut self) -> Result<&mut LbFluid> {
        self.fluid.as_mut().ok_or(LbError::NotInitialized)
    }

    /// Advance the fluid by one step.
    pub fn integrate(&mut self) -> Result<()> {
        self.fluid_mut()?.integrate();
        Ok(())
    }
}
