//! Fluctuating multi-relaxation-time collision.
//!
//! One call collides a pack of `L::WIDTH` sites:
//! 1. populations → moments
//! 2. ρ = density offset + m₀, u = (j + F/2) / ρ
//! 3. stress moments relax towards their equilibrium, ghost moments towards 0
//! 4. thermal noise on every non-conserved moment (kT > 0 only)
//! 5. Guo forcing on momentum and stress moments
//! 6. moments → populations

use crate::lanes::Lanes;
use crate::model::KernelParams;
use crate::moments::{self, equilibrium_stress};
use crate::rng::DRAWS_PER_SITE;
use crate::stencil::Q;

const BULK: usize = 4;
const SHEAR: usize = 5;
/// First non-conserved moment; noise draw `d` goes to moment `FIRST_RELAXED + d`.
const FIRST_RELAXED: usize = 4;
/// First ghost moment (equilibrium zero).
const FIRST_GHOST: usize = 10;

/// Collide one pack of sites.
///
/// `force` is the locally accumulated force density; the external force
/// density from `p` is added on top. `draws` holds the uniform random numbers
/// of each lane and must be present exactly when `p.thermalized` is set.
#[inline(always)]
pub fn collide<L: Lanes>(
    pdfs: &[L; Q],
    force: &[L; 3],
    draws: Option<&[L; DRAWS_PER_SITE]>,
    p: &KernelParams,
) -> [L; Q] {
    let m = moments::forward(pdfs);

    let rho = L::splat(p.density_offset) + m[0];
    let inv_rho = L::splat(1.0) / rho;
    let half = L::splat(0.5);
    let f: [L; 3] = std::array::from_fn(|d| force[d] + L::splat(p.ext_force[d]));
    let u: [L; 3] = std::array::from_fn(|d| (m[1 + d] + half * f[d]) * inv_rho);

    let mut post = m;
    let eq = equilibrium_stress(rho, &u);
    for k in FIRST_RELAXED..FIRST_GHOST {
        let e = eq[k - FIRST_RELAXED];
        post[k] = e + L::splat(p.gamma[k]) * (m[k] - e);
    }
    for k in FIRST_GHOST..Q {
        post[k] = L::splat(p.gamma[k]) * m[k];
    }

    if let Some(r) = draws {
        let sqrt_rho = rho.sqrt();
        for k in FIRST_RELAXED..Q {
            let centred = r[k - FIRST_RELAXED] - half;
            post[k] = post[k] + L::splat(p.noise_amplitude[k]) * sqrt_rho * centred;
        }
    }

    let gamma_shear = p.gamma[SHEAR];
    let gamma_bulk = p.gamma[BULK];
    let off_diag = L::splat(0.5 * (1.0 + gamma_shear));
    let diag = L::splat(1.0 + gamma_shear);
    let trace_shift = L::splat((gamma_bulk - gamma_shear) / 3.0);
    let uf = u[0] * f[0] + u[1] * f[1] + u[2] * f[2];
    let c_xx = diag * u[0] * f[0] + trace_shift * uf;
    let c_yy = diag * u[1] * f[1] + trace_shift * uf;
    let c_zz = diag * u[2] * f[2] + trace_shift * uf;
    let c_xy = off_diag * (u[0] * f[1] + u[1] * f[0]);
    let c_yz = off_diag * (u[1] * f[2] + u[2] * f[1]);
    let c_zx = off_diag * (u[2] * f[0] + u[0] * f[2]);

    post[1] = post[1] + f[0];
    post[2] = post[2] + f[1];
    post[3] = post[3] + f[2];
    post[4] = post[4] + c_xx + c_yy + c_zz;
    post[5] = post[5] + L::splat(2.0) * c_xx - c_yy - c_zz;
    post[6] = post[6] + c_yy - c_zz;
    post[7] = post[7] + c_xy;
    post[8] = post[8] + c_yz;
    post[9] = post[9] + c_zx;

    moments::backward(&post)
}
