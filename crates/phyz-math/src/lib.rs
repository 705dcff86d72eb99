//! Math primitives shared by the phyz lattice crates.
//!
//! Continuous quantities use nalgebra vectors; lattice coordinates are plain
//! signed integer triples so that ghost cells (negative indices) and periodic
//! images can be expressed directly.

use nalgebra as na;

/// 3D vector alias.
pub type Vec3 = na::Vector3<f64>;

/// Signed lattice coordinate.
pub type Index3 = [i64; 3];

/// Wrap a signed coordinate into `0..n` (periodic boundaries).
#[inline]
pub fn wrap(i: i64, n: usize) -> usize {
    i.rem_euclid(n as i64) as usize
}

/// Wrap every component of a lattice coordinate into the periodic box `n`.
#[inline]
pub fn wrap3(i: Index3, n: [usize; 3]) -> [usize; 3] {
    [wrap(i[0], n[0]), wrap(i[1], n[1]), wrap(i[2], n[2])]
}

/// Eight-point trilinear stencil around a point.
///
/// The point is given in lattice units with nodes sitting at integer
/// coordinates. Interpolation and force spreading use the same weights, which
/// keeps particle–fluid momentum exchange symmetric.
#[derive(Debug, Clone, Copy)]
pub struct TrilinearStencil {
    /// Lower corner node.
    pub origin: Index3,
    /// Per-axis weights for the lower and upper node.
    pub weights: [[f64; 2]; 3],
}

impl TrilinearStencil {
    /// Build the stencil enclosing `p`.
    pub fn new(p: &Vec3) -> Self {
        let mut origin = [0; 3];
        let mut weights = [[0.0; 2]; 3];
        for d in 0..3 {
            let lo = p[d].floor();
            let frac = p[d] - lo;
            origin[d] = lo as i64;
            weights[d] = [1.0 - frac, frac];
        }
        Self { origin, weights }
    }

    /// Like [`new`](Self::new), with `p` first folded into the periodic box
    /// of `n` nodes per axis, so arbitrarily distant images stay in range.
    pub fn periodic(p: &Vec3, n: [usize; 3]) -> Self {
        Self::new(&Vec3::from_fn(|d, _| p[d].rem_euclid(n[d] as f64)))
    }

    /// The 8 corner nodes and their weights. Weights sum to one.
    pub fn corners(&self) -> impl Iterator<Item = (Index3, f64)> + '_ {
        (0..8usize).map(move |c| {
            let d = [c & 1, (c >> 1) & 1, (c >> 2) & 1];
            let node = [
                self.origin[0] + d[0] as i64,
                self.origin[1] + d[1] as i64,
                self.origin[2] + d[2] as i64,
            ];
            let w = self.weights[0][d[0]] * self.weights[1][d[1]] * self.weights[2][d[2]];
            (node, w)
        })
    }
}
