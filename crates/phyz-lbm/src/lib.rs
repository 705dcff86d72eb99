//! Fluctuating lattice Boltzmann fluid on a D3Q19 lattice.
//!
//! The collision is a multi-relaxation-time operator in an orthogonal
//! moment space with thermal noise consistent with the fluctuation-
//! dissipation theorem. Noise comes from a counter-based generator keyed by
//! time step and global site, so results do not depend on how the lattice is
//! split into blocks or whether the kernels run one or four sites at a time.
//!
//! # Example
//!
//! ```
//! use phyz_lbm::{LbConfig, LbFluid};
//! use phyz_math::Vec3;
//!
//! let mut fluid = LbFluid::new(LbConfig {
//!     viscosity: 0.5,
//!     box_dimensions: [8.0, 8.0, 8.0],
//!     kt: 1e-4,
//!     seed: 7,
//!     ..LbConfig::default()
//! })
//! .unwrap();
//!
//! // Push the fluid at one point, then let it relax.
//! fluid.apply_force_at(&Vec3::new(4.0, 4.0, 4.0), &Vec3::new(0.01, 0.0, 0.0));
//! for _ in 0..10 {
//!     fluid.integrate();
//! }
//! let u = fluid.interpolated_velocity_at(&Vec3::new(4.0, 4.0, 4.0));
//! println!("velocity at the centre: {u:?}");
//! ```

pub mod block;
pub mod checkpoint;
pub mod collision;
pub mod config;
pub mod decomposition;
pub mod error;
pub mod field;
pub mod fluid;
pub mod halo;
pub mod lanes;
pub mod model;
pub mod moments;
pub mod rng;
pub mod stencil;
pub mod sweep;
pub mod system;
pub mod vtk;

pub use block::{Block, BlockOffset};
pub use checkpoint::{Checkpoint, CheckpointFormat};
pub use config::LbConfig;
pub use decomposition::Decomposition;
pub use error::{LbError, Result};
pub use field::{Field, Layout, PdfField, VectorField};
pub use fluid::LbFluid;
pub use halo::{HaloExchange, PeriodicHalo};
pub use lanes::{F64x4, Lanes};
pub use model::{KernelParams, LatticeModel, RelaxationRates};
pub use rng::philox_double2;
pub use stencil::{C_S_SQ, Q};
pub use sweep::{KernelVariant, Vectorization};
pub use system::LbSystem;
