//! D3Q19 moment space.
//!
//! The 19 basis vectors are polynomials in the lattice velocity, mutually
//! orthogonal under the weighted inner product `Σ_i w_i e_ki e_li = b_k δ_kl`:
//!
//! | k      | polynomial                         | group     |
//! |--------|------------------------------------|-----------|
//! | 0      | 1                                  | density   |
//! | 1..=3  | c_x, c_y, c_z                      | momentum  |
//! | 4      | c² − 1                             | bulk      |
//! | 5, 6   | 3c_x² − c², c_y² − c_z²            | shear     |
//! | 7..=9  | c_x c_y, c_y c_z, c_z c_x          | shear     |
//! | 10..=12| (3c² − 5) c_a                      | odd       |
//! | 13..=15| (c_b² − c_c²) c_a                  | odd       |
//! | 16     | 3c⁴ − 6c² + 1                      | even      |
//! | 17, 18 | (2c² − 3)(3c_x² − c²), (2c² − 3)(c_y² − c_z²) | even |
//!
//! Orthogonality makes the inverse explicit: `f_i = w_i Σ_k e_ki m_k / b_k`.

use crate::lanes::Lanes;
use crate::stencil::{C, Q, W};

/// Relaxation group of a moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeGroup {
    /// Density and momentum; never relaxed, never thermalized.
    Conserved,
    Bulk,
    Shear,
    /// Kinetic ghost modes, odd in the velocity.
    Odd,
    /// Kinetic ghost modes, even in the velocity.
    Even,
}

const fn mode_coefficient(k: usize, c: [i32; 3]) -> i32 {
    let [x, y, z] = c;
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let c2 = xx + yy + zz;
    match k {
        0 => 1,
        1 => x,
        2 => y,
        3 => z,
        4 => c2 - 1,
        5 => 3 * xx - c2,
        6 => yy - zz,
        7 => x * y,
        8 => y * z,
        9 => z * x,
        10 => (3 * c2 - 5) * x,
        11 => (3 * c2 - 5) * y,
        12 => (3 * c2 - 5) * z,
        13 => (yy - zz) * x,
        14 => (zz - xx) * y,
        15 => (xx - yy) * z,
        16 => 3 * c2 * c2 - 6 * c2 + 1,
        17 => (2 * c2 - 3) * (3 * xx - c2),
        18 => (2 * c2 - 3) * (yy - zz),
        _ => panic!("D3Q19 has 19 moments"),
    }
}

const fn build_basis() -> [[i32; Q]; Q] {
    let mut e = [[0; Q]; Q];
    let mut k = 0;
    while k < Q {
        let mut i = 0;
        while i < Q {
            e[k][i] = mode_coefficient(k, C[i]);
            i += 1;
        }
        k += 1;
    }
    e
}

/// Moment basis `e_ki` (row k = moment, column i = velocity).
pub const BASIS: [[i32; Q]; Q] = build_basis();

/// Basis norms `b_k = Σ_i w_i e_ki²`.
pub const NORM: [f64; Q] = [
    1.0,
    1.0 / 3.0,
    1.0 / 3.0,
    1.0 / 3.0,
    2.0 / 3.0,
    4.0 / 3.0,
    4.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    1.0 / 9.0,
    2.0 / 3.0,
    2.0 / 3.0,
    2.0 / 3.0,
    2.0 / 9.0,
    2.0 / 9.0,
    2.0 / 9.0,
    2.0,
    4.0 / 3.0,
    4.0 / 9.0,
];

/// `1 / b_k`; every entry is exactly representable.
pub const INV_NORM: [f64; Q] = [
    1.0, 3.0, 3.0, 3.0, 1.5, 0.75, 2.25, 9.0, 9.0, 9.0, 1.5, 1.5, 1.5, 4.5, 4.5, 4.5, 0.5, 0.75,
    2.25,
];

pub const MODE_GROUP: [ModeGroup; Q] = [
    ModeGroup::Conserved,
    ModeGroup::Conserved,
    ModeGroup::Conserved,
    ModeGroup::Conserved,
    ModeGroup::Bulk,
    ModeGroup::Shear,
    ModeGroup::Shear,
    ModeGroup::Shear,
    ModeGroup::Shear,
    ModeGroup::Shear,
    ModeGroup::Odd,
    ModeGroup::Odd,
    ModeGroup::Odd,
    ModeGroup::Odd,
    ModeGroup::Odd,
    ModeGroup::Odd,
    ModeGroup::Even,
    ModeGroup::Even,
    ModeGroup::Even,
];

#[inline(always)]
fn accumulate<L: Lanes>(acc: L, coefficient: i32, v: L) -> L {
    match coefficient {
        0 => acc,
        1 => acc + v,
        -1 => acc - v,
        e => acc + v * L::splat(e as f64),
    }
}

/// Populations → moments.
#[inline(always)]
pub fn forward<L: Lanes>(f: &[L; Q]) -> [L; Q] {
    std::array::from_fn(|k| {
        let row = &BASIS[k];
        let mut acc = L::zero();
        for i in 0..Q {
            acc = accumulate(acc, row[i], f[i]);
        }
        acc
    })
}

/// Moments → populations. Exact inverse of [`forward`].
#[inline(always)]
pub fn backward<L: Lanes>(m: &[L; Q]) -> [L; Q] {
    let scaled: [L; Q] = std::array::from_fn(|k| m[k] * L::splat(INV_NORM[k]));
    std::array::from_fn(|i| {
        let mut acc = L::zero();
        for k in 0..Q {
            acc = accumulate(acc, BASIS[k][i], scaled[k]);
        }
        acc * L::splat(W[i])
    })
}

/// Second-order equilibrium of the stress moments (indices 4..=9) for
/// physical density `rho` and velocity `u`.
#[inline(always)]
pub fn equilibrium_stress<L: Lanes>(rho: L, u: &[L; 3]) -> [L; 6] {
    let [ux, uy, uz] = *u;
    let (xx, yy, zz) = (ux * ux, uy * uy, uz * uz);
    let uu = xx + yy + zz;
    [
        rho * uu,
        rho * (L::splat(3.0) * xx - uu),
        rho * (yy - zz),
        rho * ux * uy,
        rho * uy * uz,
        rho * uz * ux,
    ]
}

/// Equilibrium populations for density `rho` and velocity `u`.
///
/// `density_offset` is subtracted from the stored density moment; it is the
/// reference density for zero-centred storage and zero otherwise.
pub fn equilibrium_pdfs(rho: f64, u: [f64; 3], density_offset: f64) -> [f64; Q] {
    let stress = equilibrium_stress(rho, &u);
    let mut m = [0.0; Q];
    m[0] = rho - density_offset;
    m[1] = rho * u[0];
    m[2] = rho * u[1];
    m[3] = rho * u[2];
    m[4..10].copy_from_slice(&stress);
    backward(&m)
}

/// Momentum-flux (pressure) tensor from the moments of one site.
pub fn pressure_tensor(m: &[f64; Q], rho: f64) -> [[f64; 3]; 3] {
    let trace = m[4] + rho;
    let xx = (trace + m[5]) / 3.0;
    let yy = (trace - xx + m[6]) / 2.0;
    let zz = trace - xx - yy;
    [[xx, m[7], m[9]], [m[7], yy, m[8]], [m[9], m[8], zz]]
}
