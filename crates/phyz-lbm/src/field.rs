//! Strided lattice fields with ghost layers.
//!
//! A field stores `F` doubles per cell for an interior of `size` cells plus
//! `ghost_layers` cells on every side. Cells are addressed with signed
//! coordinates: the interior spans `0..size[d]`, ghosts span
//! `-ghost_layers..0` and `size[d]..size[d] + ghost_layers`. Strides for x,
//! y, z and the value index are independent so the same kernels run on
//! either memory layout.

use serde::{Deserialize, Serialize};

use crate::stencil::Q;

/// Memory layout of a field, named by axis nesting from slowest to fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Structure of arrays: one contiguous x-y-z block per value index.
    #[default]
    Fzyx,
    /// Array of structures: the `F` values of a cell are contiguous.
    Zyxf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field<const F: usize> {
    data: Vec<f64>,
    size: [usize; 3],
    ghost_layers: usize,
    layout: Layout,
    /// Strides for x, y, z and value index.
    strides: [isize; 4],
    /// Offset of interior cell (0, 0, 0), value 0.
    origin: isize,
}

/// 19 populations per cell.
pub type PdfField = Field<Q>;

/// One 3-vector per cell.
pub type VectorField = Field<3>;

impl<const F: usize> Field<F> {
    /// Zero-filled field.
    pub fn new(size: [usize; 3], ghost_layers: usize, layout: Layout) -> Self {
        let ext = size.map(|n| n + 2 * ghost_layers);
        let cells = ext[0] * ext[1] * ext[2];
        let strides = match layout {
            Layout::Fzyx => [
                1,
                ext[0] as isize,
                (ext[0] * ext[1]) as isize,
                cells as isize,
            ],
            Layout::Zyxf => [
                F as isize,
                (F * ext[0]) as isize,
                (F * ext[0] * ext[1]) as isize,
                1,
            ],
        };
        let g = ghost_layers as isize;
        Self {
            data: vec![0.0; cells * F],
            size,
            ghost_layers,
            layout,
            strides,
            origin: g * (strides[0] + strides[1] + strides[2]),
        }
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn ghost_layers(&self) -> usize {
        self.ghost_layers
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn strides(&self) -> [isize; 4] {
        self.strides
    }

    /// Number of interior cells.
    pub fn interior_cells(&self) -> usize {
        self.size.iter().product()
    }

    /// True if `(x, y, z)` lies in the interior or the ghost layers.
    pub fn contains(&self, x: isize, y: isize, z: isize) -> bool {
        let g = self.ghost_layers as isize;
        [x, y, z]
            .iter()
            .zip(self.size)
            .all(|(&c, n)| c >= -g && c < n as isize + g)
    }

    /// Offset of value 0 of cell `(x, y, z)`.
    #[inline(always)]
    pub fn cell_offset(&self, x: isize, y: isize, z: isize) -> isize {
        debug_assert!(self.contains(x, y, z), "cell ({x}, {y}, {z}) outside field");
        self.origin + x * self.strides[0] + y * self.strides[1] + z * self.strides[2]
    }

    #[inline(always)]
    pub fn get(&self, x: isize, y: isize, z: isize, f: usize) -> f64 {
        self.data[(self.cell_offset(x, y, z) + f as isize * self.strides[3]) as usize]
    }

    #[inline(always)]
    pub fn set(&mut self, x: isize, y: isize, z: isize, f: usize, value: f64) {
        let idx = self.cell_offset(x, y, z) + f as isize * self.strides[3];
        self.data[idx as usize] = value;
    }

    #[inline(always)]
    pub fn add(&mut self, x: isize, y: isize, z: isize, f: usize, value: f64) {
        let idx = self.cell_offset(x, y, z) + f as isize * self.strides[3];
        self.data[idx as usize] += value;
    }

    /// All `F` values of one cell.
    #[inline(always)]
    pub fn get_cell(&self, x: isize, y: isize, z: isize) -> [f64; F] {
        let base = self.cell_offset(x, y, z);
        let sf = self.strides[3];
        std::array::from_fn(|f| self.data[(base + f as isize * sf) as usize])
    }

    #[inline(always)]
    pub fn set_cell(&mut self, x: isize, y: isize, z: isize, values: &[f64; F]) {
        let base = self.cell_offset(x, y, z);
        let sf = self.strides[3];
        for (f, &v) in values.iter().enumerate() {
            self.data[(base + f as isize * sf) as usize] = v;
        }
    }

    /// Set every cell, ghosts included, to `values`.
    pub fn fill(&mut self, values: &[f64; F]) {
        let ext = self.size.map(|n| (n + 2 * self.ghost_layers) as isize);
        let g = self.ghost_layers as isize;
        for z in -g..ext[2] - g {
            for y in -g..ext[1] - g {
                for x in -g..ext[0] - g {
                    self.set_cell(x, y, z, values);
                }
            }
        }
    }

    /// Interior cell coordinates in z-y-x order.
    pub fn interior(&self) -> impl Iterator<Item = [isize; 3]> + use<F> {
        let [nx, ny, nz] = self.size.map(|n| n as isize);
        (0..nz).flat_map(move |z| (0..ny).flat_map(move |y| (0..nx).map(move |x| [x, y, z])))
    }

    /// Raw storage, ghosts included.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// True if both fields have identical shape, ghosts and layout.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.size == other.size
            && self.ghost_layers == other.ghost_layers
            && self.layout == other.layout
    }
}
