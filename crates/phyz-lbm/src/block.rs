//! State owned by one block of the decomposed lattice.

use serde::{Deserialize, Serialize};

use crate::field::{Layout, PdfField, VectorField};
use crate::model::KernelParams;
use crate::sweep::{self, KernelVariant, Vectorization};

/// Global lattice coordinate of a block's first owned site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockOffset {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockOffset {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Global coordinate of owned local site `local`.
    #[inline(always)]
    pub fn global(self, local: [isize; 3]) -> [u32; 3] {
        [
            self.x.wrapping_add(local[0] as u32),
            self.y.wrapping_add(local[1] as u32),
            self.z.wrapping_add(local[2] as u32),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    offset: BlockOffset,
    pdfs: PdfField,
    pdfs_tmp: PdfField,
    /// Force density accumulated for the next step.
    force: VectorField,
    /// Force density applied by the previous step.
    last_applied_force: VectorField,
}

impl Block {
    pub fn new(offset: BlockOffset, size: [usize; 3], ghost_layers: usize, layout: Layout) -> Self {
        Self {
            offset,
            pdfs: PdfField::new(size, ghost_layers, layout),
            pdfs_tmp: PdfField::new(size, ghost_layers, layout),
            force: VectorField::new(size, ghost_layers, layout),
            last_applied_force: VectorField::new(size, ghost_layers, layout),
        }
    }

    pub fn offset(&self) -> BlockOffset {
        self.offset
    }

    pub fn size(&self) -> [usize; 3] {
        self.pdfs.size()
    }

    pub fn pdfs(&self) -> &PdfField {
        &self.pdfs
    }

    pub fn pdfs_mut(&mut self) -> &mut PdfField {
        &mut self.pdfs
    }

    pub fn force(&self) -> &VectorField {
        &self.force
    }

    pub fn force_mut(&mut self) -> &mut VectorField {
        &mut self.force
    }

    pub fn last_applied_force(&self) -> &VectorField {
        &self.last_applied_force
    }

    pub fn last_applied_force_mut(&mut self) -> &mut VectorField {
        &mut self.last_applied_force
    }

    /// Exchange the current and scratch population buffers.
    pub fn swap_pdfs(&mut self) {
        std::mem::swap(&mut self.pdfs, &mut self.pdfs_tmp);
    }

    /// Retire the force applied by the step that just ran: it becomes the
    /// last applied force and the accumulator starts over from zero.
    pub fn consume_forces(&mut self) {
        std::mem::swap(&mut self.force, &mut self.last_applied_force);
        self.force.fill(&[0.0; 3]);
    }

    /// One lattice update of the owned sites. Ghosts of `pdfs` must be
    /// current. Afterwards `pdfs` holds the new populations with stale ghosts.
    pub fn step(&mut self, variant: KernelVariant, vectorization: Vectorization, p: &KernelParams) {
        match variant {
            KernelVariant::StreamCollide => {
                sweep::dispatch_stream_collide(
                    vectorization,
                    &self.pdfs,
                    &mut self.pdfs_tmp,
                    &self.force,
                    self.offset,
                    p,
                );
                self.swap_pdfs();
            }
            KernelVariant::Split => {
                sweep::stream(&self.pdfs, &mut self.pdfs_tmp);
                self.swap_pdfs();
                sweep::dispatch_collide(vectorization, &mut self.pdfs, &self.force, self.offset, p);
            }
        }
        self.consume_forces();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_forces_retires_accumulator() {
        let mut block = Block::new(BlockOffset::default(), [2, 2, 2], 1, Layout::Fzyx);
        block.force_mut().set(1, 0, 1, 2, 0.5);
        block.consume_forces();
        assert_eq!(block.last_applied_force().get(1, 0, 1, 2), 0.5);
        assert!(block.force().as_slice().iter().all(|&f| f == 0.0));
        block.consume_forces();
        assert!(block.last_applied_force().as_slice().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_swap_pdfs_exchanges_buffers() {
        let mut block = Block::new(BlockOffset::default(), [1, 1, 1], 1, Layout::Zyxf);
        block.pdfs_mut().set(0, 0, 0, 3, 1.5);
        block.swap_pdfs();
        assert_eq!(block.pdfs().get(0, 0, 0, 3), 0.0);
        block.swap_pdfs();
        assert_eq!(block.pdfs().get(0, 0, 0, 3), 1.5);
    }

    #[test]
    fn test_global_offset() {
        let offset = BlockOffset::new(4, 0, 8);
        assert_eq!(offset.global([1, 2, 3]), [5, 2, 11]);
    }
}
