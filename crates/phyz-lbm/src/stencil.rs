//! D3Q19 velocity set.
//!
//! Nineteen velocity directions on the cubic lattice:
//! - 1 rest (0)
//! - 6 face-centered (N, S, W, E, T, B)
//! - 12 edge-centered (NW, NE, SW, SE, TN, TS, TW, TE, BN, BS, BW, BE)
//!
//! The ordering is fixed: checkpoints store populations in this order.

/// Number of discrete velocities.
pub const Q: usize = 19;

/// Lattice sound speed squared.
pub const C_S_SQ: f64 = 1.0 / 3.0;

/// Discrete velocities `[cx, cy, cz]`.
pub const C: [[i32; 3]; Q] = [
    [0, 0, 0], // C
    [0, 1, 0], // N
    [0, -1, 0], // S
    [-1, 0, 0], // W
    [1, 0, 0], // E
    [0, 0, 1], // T
    [0, 0, -1], // B
    [-1, 1, 0], // NW
    [1, 1, 0], // NE
    [-1, -1, 0], // SW
    [1, -1, 0], // SE
    [0, 1, 1], // TN
    [0, -1, 1], // TS
    [-1, 0, 1], // TW
    [1, 0, 1], // TE
    [0, 1, -1], // BN
    [0, -1, -1], // BS
    [-1, 0, -1], // BW
    [1, 0, -1], // BE
];

/// Lattice weights.
pub const W: [f64; Q] = [
    1.0 / 3.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 18.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
    1.0 / 36.0,
];

/// Opposite direction indices.
pub const OPP: [usize; Q] = [
    0, 2, 1, 4, 3, 6, 5, 10, 9, 8, 7, 16, 15, 18, 17, 12, 11, 14, 13,
];
