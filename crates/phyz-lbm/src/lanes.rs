//! Lane-width abstraction for the lattice kernels.
//!
//! The collision and streaming kernels are written once, generic over
//! [`Lanes`]. `f64` is the one-lane instantiation; [`F64x4`] packs four
//! consecutive x-sites. Every operation is element-wise IEEE arithmetic, so
//! both instantiations produce bit-identical results per site.

use std::ops::{Add, Div, Mul, Neg, Sub};

/// A pack of `WIDTH` doubles processed in lock-step.
pub trait Lanes:
    Copy
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Number of sites processed together.
    const WIDTH: usize;

    /// Broadcast a scalar to every lane.
    fn splat(v: f64) -> Self;

    /// Build a pack lane by lane.
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self;

    /// Read one lane.
    fn lane(self, i: usize) -> f64;

    fn sqrt(self) -> Self;

    #[inline(always)]
    fn zero() -> Self {
        Self::splat(0.0)
    }
}

impl Lanes for f64 {
    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(v: f64) -> Self {
        v
    }

    #[inline(always)]
    fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0)
    }

    #[inline(always)]
    fn lane(self, i: usize) -> f64 {
        debug_assert_eq!(i, 0);
        self
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
}

/// Four doubles, aligned for 256-bit vector registers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(32))]
pub struct F64x4(pub [f64; 4]);

macro_rules! lanewise_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for F64x4 {
            type Output = Self;

            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                let (a, b) = (self.0, rhs.0);
                F64x4([a[0] $op b[0], a[1] $op b[1], a[2] $op b[2], a[3] $op b[3]])
            }
        }
    };
}

lanewise_op!(Add, add, +);
lanewise_op!(Sub, sub, -);
lanewise_op!(Mul, mul, *);
lanewise_op!(Div, div, /);

impl Neg for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        let a = self.0;
        F64x4([-a[0], -a[1], -a[2], -a[3]])
    }
}

impl Lanes for F64x4 {
    const WIDTH: usize = 4;

    #[inline(always)]
    fn splat(v: f64) -> Self {
        F64x4([v; 4])
    }

    #[inline(always)]
    fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        F64x4(std::array::from_fn(f))
    }

    #[inline(always)]
    fn lane(self, i: usize) -> f64 {
        self.0[i]
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        let a = self.0;
        F64x4([a[0].sqrt(), a[1].sqrt(), a[2].sqrt(), a[3].sqrt()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lanewise_matches_scalar() {
        let a = F64x4([1.5, -2.0, 3.25, 1e-3]);
        let b = F64x4([0.1, 7.0, -0.5, 3.0]);
        let r = (a * b + a) / (b - F64x4::splat(0.25)) - (a * a).sqrt();
        for i in 0..4 {
            let (x, y) = (a.lane(i), b.lane(i));
            let expected = (x * y + x) / (y - 0.25) - (x * x).sqrt();
            assert_eq!(r.lane(i).to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn test_from_fn_lane_order() {
        let v = F64x4::from_fn(|i| i as f64 * 10.0);
        assert_eq!(v, F64x4([0.0, 10.0, 20.0, 30.0]));
        assert_eq!(<f64 as Lanes>::from_fn(|i| i as f64 + 4.0), 4.0);
    }
}
