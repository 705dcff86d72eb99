//! Streaming and collision passes over the owned sites of one block.
//!
//! Streaming is pull-based: site `x` gathers population `i` from `x − c_i`,
//! so every pass writes only owned sites and reads ghosts. The ghost layers
//! of the source field must be up to date before a streaming pass.
//!
//! Rows along x are processed `L::WIDTH` sites at a time; the remainder of a
//! row runs through the one-lane instantiation of the same kernel.

use serde::{Deserialize, Serialize};

use crate::block::BlockOffset;
use crate::collision;
use crate::field::{PdfField, VectorField};
use crate::lanes::{F64x4, Lanes};
use crate::model::KernelParams;
use crate::rng::{DRAWS_PER_SITE, site_draws};
use crate::stencil::{C, Q};

/// How a time step traverses the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelVariant {
    /// One fused pass: gather from neighbors, collide, write.
    #[default]
    StreamCollide,
    /// A streaming pass followed by an in-place collision pass.
    Split,
}

impl KernelVariant {
    pub fn name(self) -> &'static str {
        match self {
            KernelVariant::StreamCollide => "stream-collide",
            KernelVariant::Split => "split stream/collide",
        }
    }

    /// Minimum ghost layer width the variant accepts.
    pub fn required_ghost_layers(self) -> usize {
        match self {
            KernelVariant::StreamCollide => 2,
            KernelVariant::Split => 1,
        }
    }
}

/// Number of sites each kernel invocation handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vectorization {
    Scalar,
    #[default]
    Lanes4,
}

#[inline(always)]
fn gather_streamed<L: Lanes>(src: &PdfField, x: isize, y: isize, z: isize) -> [L; Q] {
    std::array::from_fn(|i| {
        let [cx, cy, cz] = C[i].map(|c| c as isize);
        L::from_fn(|l| src.get(x + l as isize - cx, y - cy, z - cz, i))
    })
}

#[inline(always)]
fn gather_local<L: Lanes>(src: &PdfField, x: isize, y: isize, z: isize) -> [L; Q] {
    std::array::from_fn(|i| L::from_fn(|l| src.get(x + l as isize, y, z, i)))
}

#[inline(always)]
fn gather_force<L: Lanes>(force: &VectorField, x: isize, y: isize, z: isize) -> [L; 3] {
    std::array::from_fn(|d| L::from_fn(|l| force.get(x + l as isize, y, z, d)))
}

#[inline(always)]
fn scatter<L: Lanes>(dst: &mut PdfField, x: isize, y: isize, z: isize, pdfs: &[L; Q]) {
    for (i, v) in pdfs.iter().enumerate() {
        for l in 0..L::WIDTH {
            dst.set(x + l as isize, y, z, i, v.lane(l));
        }
    }
}

#[inline(always)]
fn draws<L: Lanes>(
    p: &KernelParams,
    offset: BlockOffset,
    x: isize,
    y: isize,
    z: isize,
) -> Option<[L; DRAWS_PER_SITE]> {
    p.thermalized.then(|| {
        let [gx, gy, gz] = offset.global([x, y, z]);
        site_draws::<L>(p.time_step, gx, gy, gz, p.seed)
    })
}

#[inline(always)]
fn stream_collide_pack<L: Lanes>(
    src: &PdfField,
    dst: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
    [x, y, z]: [isize; 3],
) {
    let pdfs = gather_streamed::<L>(src, x, y, z);
    let f = gather_force::<L>(force, x, y, z);
    let r = draws::<L>(p, offset, x, y, z);
    let out = collision::collide(&pdfs, &f, r.as_ref(), p);
    scatter(dst, x, y, z, &out);
}

#[inline(always)]
fn collide_pack<L: Lanes>(
    pdfs: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
    [x, y, z]: [isize; 3],
) {
    let local = gather_local::<L>(pdfs, x, y, z);
    let f = gather_force::<L>(force, x, y, z);
    let r = draws::<L>(p, offset, x, y, z);
    let out = collision::collide(&local, &f, r.as_ref(), p);
    scatter(pdfs, x, y, z, &out);
}

/// Owned sites of a `size` block grouped into packs along x. Each item is
/// the first site of a pack and whether it spans `width` sites or one.
fn packs(size: [usize; 3], width: usize) -> impl Iterator<Item = ([isize; 3], bool)> {
    let [nx, ny, nz] = size;
    let full = nx / width;
    (0..nz).flat_map(move |z| {
        (0..ny).flat_map(move |y| {
            let site = move |x: usize| [x as isize, y as isize, z as isize];
            let wide = (0..full).map(move |p| (site(p * width), true));
            let tail = (full * width..nx).map(move |x| (site(x), false));
            wide.chain(tail)
        })
    })
}

/// Fused pass: `dst(x) = collide(src(x − c_i, i) for all i)`.
pub fn stream_collide<L: Lanes>(
    src: &PdfField,
    dst: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
) {
    debug_assert!(src.same_shape(dst));
    for (cell, wide) in packs(src.size(), L::WIDTH) {
        if wide {
            stream_collide_pack::<L>(src, dst, force, offset, p, cell);
        } else {
            stream_collide_pack::<f64>(src, dst, force, offset, p, cell);
        }
    }
}

/// In-place collision of every owned site.
pub fn collide<L: Lanes>(
    pdfs: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
) {
    for (cell, wide) in packs(pdfs.size(), L::WIDTH) {
        if wide {
            collide_pack::<L>(pdfs, force, offset, p, cell);
        } else {
            collide_pack::<f64>(pdfs, force, offset, p, cell);
        }
    }
}

/// Pull streaming: `dst(x, i) = src(x − c_i, i)` for every owned site.
pub fn stream(src: &PdfField, dst: &mut PdfField) {
    debug_assert!(src.same_shape(dst));
    for [x, y, z] in src.interior() {
        for (i, c) in C.iter().enumerate() {
            let [cx, cy, cz] = c.map(|c| c as isize);
            dst.set(x, y, z, i, src.get(x - cx, y - cy, z - cz, i));
        }
    }
}

/// Monomorphized entry points selected at run time.
pub fn dispatch_stream_collide(
    vectorization: Vectorization,
    src: &PdfField,
    dst: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
) {
    match vectorization {
        Vectorization::Scalar => stream_collide::<f64>(src, dst, force, offset, p),
        Vectorization::Lanes4 => stream_collide::<F64x4>(src, dst, force, offset, p),
    }
}

pub fn dispatch_collide(
    vectorization: Vectorization,
    pdfs: &mut PdfField,
    force: &VectorField,
    offset: BlockOffset,
    p: &KernelParams,
) {
    match vectorization {
        Vectorization::Scalar => collide::<f64>(pdfs, force, offset, p),
        Vectorization::Lanes4 => collide::<F64x4>(pdfs, force, offset, p),
    }
}
