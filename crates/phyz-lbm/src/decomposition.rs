//! Regular block decomposition of the periodic lattice.

use phyz_math::{Index3, wrap3};

use crate::block::BlockOffset;
use crate::error::{LbError, Result};

/// Splits a `grid` of sites into `node_grid` equally sized blocks, ordered
/// x fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    grid: [usize; 3],
    node_grid: [usize; 3],
    block_size: [usize; 3],
    ghost_layers: usize,
}

impl Decomposition {
    pub fn new(grid: [usize; 3], node_grid: [usize; 3], ghost_layers: usize) -> Result<Self> {
        if grid.iter().any(|&n| n == 0) {
            return Err(LbError::InvalidDecomposition(format!(
                "grid {grid:?} has an empty dimension"
            )));
        }
        if grid.iter().any(|&n| n > u32::MAX as usize) {
            return Err(LbError::InvalidDecomposition(format!(
                "grid {grid:?} exceeds the 32-bit site index range"
            )));
        }
        if node_grid.iter().any(|&n| n == 0) {
            return Err(LbError::InvalidDecomposition(format!(
                "node grid {node_grid:?} has an empty dimension"
            )));
        }
        if (0..3).any(|d| grid[d] % node_grid[d] != 0) {
            return Err(LbError::InvalidDecomposition(format!(
                "grid {grid:?} is not divisible by node grid {node_grid:?}"
            )));
        }
        if ghost_layers == 0 {
            return Err(LbError::InvalidDecomposition(
                "at least one ghost layer is required".into(),
            ));
        }
        let block_size = std::array::from_fn(|d| grid[d] / node_grid[d]);
        Ok(Self {
            grid,
            node_grid,
            block_size,
            ghost_layers,
        })
    }

    pub fn grid(&self) -> [usize; 3] {
        self.grid
    }

    pub fn node_grid(&self) -> [usize; 3] {
        self.node_grid
    }

    pub fn block_size(&self) -> [usize; 3] {
        self.block_size
    }

    pub fn ghost_layers(&self) -> usize {
        self.ghost_layers
    }

    pub fn block_count(&self) -> usize {
        self.node_grid.iter().product()
    }

    pub fn site_count(&self) -> usize {
        self.grid.iter().product()
    }

    /// Position of block `index` in the node grid.
    pub fn block_coords(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.node_grid;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    pub fn block_offset(&self, index: usize) -> BlockOffset {
        let c = self.block_coords(index);
        let s = self.block_size;
        BlockOffset::new(
            (c[0] * s[0]) as u32,
            (c[1] * s[1]) as u32,
            (c[2] * s[2]) as u32,
        )
    }

    /// Block index and local coordinate owning global site `global`, after
    /// periodic folding.
    pub fn locate(&self, global: Index3) -> (usize, [isize; 3]) {
        let g = wrap3(global, self.grid);
        let s = self.block_size;
        let c: [usize; 3] = std::array::from_fn(|d| g[d] / s[d]);
        let index = (c[2] * self.node_grid[1] + c[1]) * self.node_grid[0] + c[0];
        (index, std::array::from_fn(|d| (g[d] % s[d]) as isize))
    }
}
