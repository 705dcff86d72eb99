//! Counter-based random numbers (Philox-4x32-10).
//!
//! The generator has no state: the output is a pure function of the counter
//! `(time_step, x, y, z)` and the key `(mode, seed)`. Any site can therefore
//! draw its noise independently, from any thread or block, and a physical
//! site sees the same stream however the lattice is decomposed as long as
//! `x, y, z` are global coordinates.

use crate::lanes::Lanes;

const PHILOX_M0: u32 = 0xD251_1F53;
const PHILOX_M1: u32 = 0xCD9E_8D57;
const PHILOX_W0: u32 = 0x9E37_79B9;
const PHILOX_W1: u32 = 0xBB67_AE85;

const TWOPOW53_INV: f64 = 1.0 / 9_007_199_254_740_992.0;

/// Number of Philox key modes drawn per site and time step.
pub const MODES_PER_SITE: u32 = 8;

/// Number of uniform draws available per site and time step.
pub const DRAWS_PER_SITE: usize = 2 * MODES_PER_SITE as usize;

#[inline(always)]
fn mulhilo(a: u32, b: u32) -> (u32, u32) {
    let p = a as u64 * b as u64;
    ((p >> 32) as u32, p as u32)
}

#[inline(always)]
fn round(ctr: &mut [u32; 4], key: &[u32; 2]) {
    let (hi0, lo0) = mulhilo(PHILOX_M0, ctr[0]);
    let (hi1, lo1) = mulhilo(PHILOX_M1, ctr[2]);
    *ctr = [hi1 ^ ctr[1] ^ key[0], lo1, hi0 ^ ctr[3] ^ key[1], lo0];
}

/// Raw Philox-4x32 with 10 rounds.
pub fn philox4x32(mut ctr: [u32; 4], mut key: [u32; 2]) -> [u32; 4] {
    round(&mut ctr, &key);
    for _ in 1..10 {
        key[0] = key[0].wrapping_add(PHILOX_W0);
        key[1] = key[1].wrapping_add(PHILOX_W1);
        round(&mut ctr, &key);
    }
    ctr
}

/// 53-bit uniform double in (0, 1) from two 32-bit words.
#[inline(always)]
fn uniform_double(lo: u32, hi: u32) -> f64 {
    let z = lo as u64 ^ ((hi as u64) << (53 - 32));
    z as f64 * TWOPOW53_INV + TWOPOW53_INV / 2.0
}

/// Two independent uniform doubles for one site, mode and time step.
///
/// `mode` must be below [`MODES_PER_SITE`].
#[inline]
pub fn philox_double2(time_step: u32, x: u32, y: u32, z: u32, mode: u32, seed: u32) -> (f64, f64) {
    debug_assert!(mode < MODES_PER_SITE, "noise mode {mode} out of range");
    let r = philox4x32([time_step, x, y, z], [mode, seed]);
    (uniform_double(r[0], r[1]), uniform_double(r[2], r[3]))
}

/// All [`DRAWS_PER_SITE`] uniform draws for `L::WIDTH` consecutive sites
/// along x starting at global coordinate `(x, y, z)`.
///
/// Lane `l` holds exactly what [`philox_double2`] returns for site `x + l`.
pub fn site_draws<L: Lanes>(
    time_step: u32,
    x: u32,
    y: u32,
    z: u32,
    seed: u32,
) -> [L; DRAWS_PER_SITE] {
    let mut pairs = [[(0.0, 0.0); 8]; MODES_PER_SITE as usize];
    for (mode, row) in pairs.iter_mut().enumerate() {
        for (lane, pair) in row.iter_mut().take(L::WIDTH).enumerate() {
            *pair = philox_double2(time_step, x.wrapping_add(lane as u32), y, z, mode as u32, seed);
        }
    }
    std::array::from_fn(|d| {
        let row = &pairs[d / 2];
        L::from_fn(|lane| if d % 2 == 0 { row[lane].0 } else { row[lane].1 })
    })
}
