//! Ghost layer exchange between blocks.
//!
//! Every ghost cell of every block mirrors exactly one owned site of some
//! block under periodic folding. The mapping depends only on the
//! decomposition, so it is computed once into a copy plan.

use crate::block::Block;
use crate::decomposition::Decomposition;
use crate::field::Field;

/// Fills the ghost layers of the population fields of a set of blocks.
pub trait HaloExchange: Send + Sync {
    /// Bring the ghost layers of every block's populations up to date.
    fn exchange(&self, blocks: &mut [Block]);
}

#[derive(Debug, Clone, Copy)]
struct GhostCopy {
    src_block: usize,
    src: [isize; 3],
    dst_block: usize,
    dst: [isize; 3],
}

/// In-process periodic ghost fill.
#[derive(Debug, Clone)]
pub struct PeriodicHalo {
    plan: Vec<GhostCopy>,
}

impl PeriodicHalo {
    pub fn new(decomposition: &Decomposition) -> Self {
        let g = decomposition.ghost_layers() as isize;
        let [nx, ny, nz] = decomposition.block_size().map(|n| n as isize);
        let mut plan = Vec::new();
        for dst_block in 0..decomposition.block_count() {
            let o = decomposition.block_offset(dst_block);
            for z in -g..nz + g {
                for y in -g..ny + g {
                    for x in -g..nx + g {
                        let owned = (0..nx).contains(&x)
                            && (0..ny).contains(&y)
                            && (0..nz).contains(&z);
                        if owned {
                            continue;
                        }
                        let global = [
                            o.x as i64 + x as i64,
                            o.y as i64 + y as i64,
                            o.z as i64 + z as i64,
                        ];
                        let (src_block, src) = decomposition.locate(global);
                        plan.push(GhostCopy {
                            src_block,
                            src,
                            dst_block,
                            dst: [x, y, z],
                        });
                    }
                }
            }
        }
        Self { plan }
    }

    /// Number of ghost cells refreshed per exchange.
    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    /// Copy owned values into the ghost cells of `fields`, indexed by block.
    /// Sources are gathered before any ghost is written.
    pub fn fill<const F: usize>(&self, fields: &mut [&mut Field<F>]) {
        let staged: Vec<[f64; F]> = self
            .plan
            .iter()
            .map(|c| fields[c.src_block].get_cell(c.src[0], c.src[1], c.src[2]))
            .collect();
        for (c, values) in self.plan.iter().zip(&staged) {
            fields[c.dst_block].set_cell(c.dst[0], c.dst[1], c.dst[2], values);
        }
    }
}

impl HaloExchange for PeriodicHalo {
    fn exchange(&self, blocks: &mut [Block]) {
        let mut fields: Vec<_> = blocks.iter_mut().map(Block::pdfs_mut).collect();
        self.fill(&mut fields);
    }
}
