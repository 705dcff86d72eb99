//! The fluid handle: lattice blocks, model and halo under one owner.
//!
//! Node accessors take global lattice indices and work in lattice units.
//! The particle-facing operations ([`LbFluid::apply_force_at`] and the
//! interpolation queries) take MD positions and convert units themselves.

use std::path::Path;

use phyz_math::{Index3, TrilinearStencil, Vec3};
use rayon::prelude::*;

use crate::block::Block;
use crate::checkpoint::{CHECKPOINT_VERSION, Checkpoint, CheckpointFormat};
use crate::config::LbConfig;
use crate::decomposition::Decomposition;
use crate::error::{LbError, Result};
use crate::field::Field;
use crate::halo::{HaloExchange, PeriodicHalo};
use crate::model::{LatticeModel, RelaxationRates, bulk_viscosity_from_omega};
use crate::moments::{self, equilibrium_pdfs};
use crate::stencil::{C, C_S_SQ, Q, W};

pub struct LbFluid {
    config: LbConfig,
    decomposition: Decomposition,
    halo: Box<dyn HaloExchange>,
    blocks: Vec<Block>,
    model: LatticeModel,
    /// Populations changed outside a step; ghosts need a refresh.
    ghosts_dirty: bool,
}

impl std::fmt::Debug for LbFluid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LbFluid")
            .field("grid", &self.decomposition.grid())
            .field("node_grid", &self.decomposition.node_grid())
            .field("time_step", &self.model.time_step())
            .finish_non_exhaustive()
    }
}

impl LbFluid {
    /// Fluid at rest with uniform density `config.density`.
    pub fn new(config: LbConfig) -> Result<Self> {
        config.validate()?;
        let grid = config.grid()?;
        let decomposition = Decomposition::new(grid, config.node_grid, config.ghost_layers)?;

        let mut model = LatticeModel::fluctuating(
            config.lattice_viscosity(),
            config.lattice_kt(),
            config.seed,
        )?;
        if let Some(bulk) = config.lattice_bulk_viscosity() {
            model.set_bulk_viscosity(bulk)?;
        }
        model.set_ext_force(config.lattice_force_density());
        let rho = config.lattice_density();
        if config.zero_centered_pdfs {
            model.set_density_offset(rho);
        }

        let rest = equilibrium_pdfs(rho, [0.0; 3], model.density_offset());
        let blocks = (0..decomposition.block_count())
            .map(|b| {
                let mut block = Block::new(
                    decomposition.block_offset(b),
                    decomposition.block_size(),
                    decomposition.ghost_layers(),
                    config.layout,
                );
                block.pdfs_mut().fill(&rest);
                block
            })
            .collect();

        log::info!(
            "LB fluid: grid {:?}, {} blocks of {:?}, {} ghost layers, {} kernel, {:?}, nu_lb = {}, kT_lb = {}",
            grid,
            decomposition.block_count(),
            decomposition.block_size(),
            decomposition.ghost_layers(),
            config.kernel.name(),
            config.vectorization,
            config.lattice_viscosity(),
            config.lattice_kt(),
        );

        Ok(Self {
            halo: Box::new(PeriodicHalo::new(&decomposition)),
            config,
            decomposition,
            blocks,
            model,
            ghosts_dirty: true,
        })
    }

    pub fn config(&self) -> &LbConfig {
        &self.config
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    pub fn model(&self) -> &LatticeModel {
        &self.model
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn grid(&self) -> [usize; 3] {
        self.decomposition.grid()
    }

    pub fn time_step(&self) -> u32 {
        self.model.time_step()
    }

    fn refresh_ghosts(&mut self) {
        if self.ghosts_dirty {
            self.halo.exchange(&mut self.blocks);
            self.ghosts_dirty = false;
        }
    }

    /// Advance the fluid by one lattice time step.
    pub fn integrate(&mut self) {
        self.refresh_ghosts();
        let params = *self.model.kernel_params();
        let variant = self.config.kernel;
        let vectorization = self.config.vectorization;
        self.blocks
            .par_iter_mut()
            .for_each(|block| block.step(variant, vectorization, &params));
        self.halo.exchange(&mut self.blocks);
        self.model.advance_time_step();
    }

    /// Run `steps` time steps.
    pub fn integrate_n(&mut self, steps: usize) {
        for _ in 0..steps {
            self.integrate();
        }
    }

    // ------------------------------------------------------------------
    // Unit conversion
    // ------------------------------------------------------------------

    fn to_lattice_position(&self, pos: &Vec3) -> Vec3 {
        pos.map(|p| p / self.config.agrid - 0.5)
    }

    /// Interpolation stencil of an MD position, folded into the periodic box.
    fn stencil_at(&self, pos: &Vec3) -> TrilinearStencil {
        TrilinearStencil::periodic(&self.to_lattice_position(pos), self.grid())
    }

    /// MD viscosity → lattice viscosity.
    fn viscosity_to_lattice(&self) -> f64 {
        self.config.tau / (self.config.agrid * self.config.agrid)
    }

    /// MD thermal energy → lattice thermal energy.
    fn kt_to_lattice(&self) -> f64 {
        let (a, tau) = (self.config.agrid, self.config.tau);
        tau * tau / (a * a)
    }

    /// MD force density → lattice force density.
    fn force_density_to_lattice(&self) -> f64 {
        let (a, tau) = (self.config.agrid, self.config.tau);
        a * a * tau * tau
    }

    fn velocity_to_md(&self) -> f64 {
        self.config.agrid / self.config.tau
    }

    fn force_to_lattice(&self) -> f64 {
        self.config.tau * self.config.tau / self.config.agrid
    }

    // ------------------------------------------------------------------
    // Node access (lattice units)
    // ------------------------------------------------------------------

    fn locate_node(&self, node: Index3) -> Result<(usize, [isize; 3])> {
        let grid = self.grid();
        if (0..3).any(|d| node[d] < 0 || node[d] >= grid[d] as i64) {
            return Err(LbError::NodeOutOfRange(node));
        }
        Ok(self.decomposition.locate(node))
    }

    fn stored_cell<const F: usize>(
        field: &Field<F>,
        [x, y, z]: [isize; 3],
    ) -> [f64; F] {
        field.get_cell(x, y, z)
    }

    /// Density, momentum density and total applied force at an owned site.
    fn site_moments(&self, block: usize, local: [isize; 3]) -> ([f64; Q], f64, [f64; 3]) {
        let b = &self.blocks[block];
        let m = moments::forward(&Self::stored_cell(b.pdfs(), local));
        let rho = self.model.density_offset() + m[0];
        let last = Self::stored_cell(b.last_applied_force(), local);
        let ext = self.model.ext_force();
        (m, rho, std::array::from_fn(|d| last[d] + ext[d]))
    }

    fn site_velocity(&self, block: usize, local: [isize; 3]) -> [f64; 3] {
        let (m, rho, force) = self.site_moments(block, local);
        std::array::from_fn(|d| (m[1 + d] + 0.5 * force[d]) / rho)
    }

    pub fn node_density(&self, node: Index3) -> Result<f64> {
        let (block, local) = self.locate_node(node)?;
        Ok(self.site_moments(block, local).1)
    }

    /// Fluid velocity including the half-force correction of the last step.
    pub fn node_velocity(&self, node: Index3) -> Result<Vec3> {
        let (block, local) = self.locate_node(node)?;
        Ok(Vec3::from(self.site_velocity(block, local)))
    }

    /// Populations `f_i`, independent of the storage offset.
    pub fn node_populations(&self, node: Index3) -> Result<[f64; Q]> {
        let (block, local) = self.locate_node(node)?;
        let stored = Self::stored_cell(self.blocks[block].pdfs(), local);
        let offset = self.model.density_offset();
        Ok(std::array::from_fn(|i| stored[i] + W[i] * offset))
    }

    /// Second moment `Σ_i f_i c_i c_i` of the populations.
    pub fn node_pressure_tensor(&self, node: Index3) -> Result<[[f64; 3]; 3]> {
        let (block, local) = self.locate_node(node)?;
        let (m, rho, _) = self.site_moments(block, local);
        Ok(moments::pressure_tensor(&m, rho))
    }

    /// Non-equilibrium part of the pressure tensor, `Π − ρ c_s² I − ρ u u`
    /// with `u` the reported node velocity.
    pub fn node_pressure_tensor_neq(&self, node: Index3) -> Result<[[f64; 3]; 3]> {
        let (block, local) = self.locate_node(node)?;
        let (m, rho, _) = self.site_moments(block, local);
        let u = self.site_velocity(block, local);
        let mut pi = moments::pressure_tensor(&m, rho);
        for a in 0..3 {
            for b in 0..3 {
                pi[a][b] -= rho * u[a] * u[b];
            }
            pi[a][a] -= rho * C_S_SQ;
        }
        Ok(pi)
    }

    /// All 19 moments of the node populations; moment 0 is the density.
    pub fn node_modes(&self, node: Index3) -> Result<[f64; Q]> {
        let (block, local) = self.locate_node(node)?;
        let (mut m, rho, _) = self.site_moments(block, local);
        m[0] = rho;
        Ok(m)
    }

    /// Local force density applied by the last step, external force excluded.
    pub fn node_last_applied_force(&self, node: Index3) -> Result<Vec3> {
        let (block, local) = self.locate_node(node)?;
        Ok(Vec3::from(Self::stored_cell(
            self.blocks[block].last_applied_force(),
            local,
        )))
    }

    pub fn set_node_populations(&mut self, node: Index3, pdfs: &[f64; Q]) -> Result<()> {
        let (block, [x, y, z]) = self.locate_node(node)?;
        let offset = self.model.density_offset();
        let stored: [f64; Q] = std::array::from_fn(|i| pdfs[i] - W[i] * offset);
        self.blocks[block].pdfs_mut().set_cell(x, y, z, &stored);
        self.ghosts_dirty = true;
        Ok(())
    }

    /// Reset a node to equilibrium at `rho`, keeping its velocity.
    pub fn set_node_density(&mut self, node: Index3, rho: f64) -> Result<()> {
        if !(rho.is_finite() && rho > 0.0) {
            return Err(LbError::InvalidParameter(format!("density must be positive, got {rho}")));
        }
        let (block, local) = self.locate_node(node)?;
        let u = self.site_velocity(block, local);
        self.set_site_equilibrium(block, local, rho, u);
        Ok(())
    }

    /// Reset a node to equilibrium with velocity `u`, keeping its density.
    /// The stored momentum is shifted so that [`node_velocity`](Self::node_velocity)
    /// reports `u` back.
    pub fn set_node_velocity(&mut self, node: Index3, u: &Vec3) -> Result<()> {
        let (block, local) = self.locate_node(node)?;
        let (_, rho, _) = self.site_moments(block, local);
        self.set_site_equilibrium(block, local, rho, [u.x, u.y, u.z]);
        Ok(())
    }

    fn set_site_equilibrium(&mut self, block: usize, local: [isize; 3], rho: f64, u: [f64; 3]) {
        let (_, _, force) = self.site_moments(block, local);
        let u_eq = std::array::from_fn(|d| u[d] - 0.5 * force[d] / rho);
        let pdfs = equilibrium_pdfs(rho, u_eq, self.model.density_offset());
        let [x, y, z] = local;
        self.blocks[block].pdfs_mut().set_cell(x, y, z, &pdfs);
        self.ghosts_dirty = true;
    }

    // ------------------------------------------------------------------
    // Particle coupling (MD units)
    // ------------------------------------------------------------------

    /// Spread a point force onto the eight surrounding nodes. The force acts
    /// during the next [`integrate`](Self::integrate).
    pub fn apply_force_at(&mut self, pos: &Vec3, force: &Vec3) {
        let f = force * self.force_to_lattice();
        let stencil = self.stencil_at(pos);
        for (node, w) in stencil.corners() {
            let (block, [x, y, z]) = self.decomposition.locate(node);
            let field = self.blocks[block].force_mut();
            for d in 0..3 {
                field.add(x, y, z, d, w * f[d]);
            }
        }
    }

    /// Trilinearly interpolated fluid velocity at an MD position. Positions
    /// outside the box are folded back in.
    pub fn interpolated_velocity_at(&self, pos: &Vec3) -> Vec3 {
        let stencil = self.stencil_at(pos);
        let mut u = Vec3::zeros();
        for (node, w) in stencil.corners() {
            let (block, local) = self.decomposition.locate(node);
            u += Vec3::from(self.site_velocity(block, local)) * w;
        }
        u * self.velocity_to_md()
    }

    /// Trilinearly interpolated density at an MD position, in MD units.
    pub fn interpolated_density_at(&self, pos: &Vec3) -> f64 {
        let stencil = self.stencil_at(pos);
        let rho: f64 = stencil
            .corners()
            .map(|(node, w)| {
                let (block, local) = self.decomposition.locate(node);
                w * self.site_moments(block, local).1
            })
            .sum();
        rho / self.config.agrid.powi(3)
    }

    /// Trilinearly interpolated force density applied by the last step,
    /// external force included, in MD units.
    pub fn interpolated_force_at(&self, pos: &Vec3) -> Vec3 {
        let stencil = self.stencil_at(pos);
        let mut f = Vec3::zeros();
        for (node, w) in stencil.corners() {
            let (block, local) = self.decomposition.locate(node);
            f += Vec3::from(self.site_moments(block, local).2) * w;
        }
        f / self.force_density_to_lattice()
    }

    // ------------------------------------------------------------------
    // Parameters (MD units unless stated)
    // ------------------------------------------------------------------

    pub fn viscosity(&self) -> f64 {
        self.model.viscosity() / self.viscosity_to_lattice()
    }

    /// Bulk viscosity implied by the bulk rate.
    pub fn bulk_viscosity(&self) -> f64 {
        bulk_viscosity_from_omega(self.model.rates().bulk) / self.viscosity_to_lattice()
    }

    /// Change the kinematic viscosity. Shear, bulk, odd and even rates are
    /// all recomputed from it.
    pub fn set_viscosity(&mut self, viscosity: f64) -> Result<()> {
        self.model.set_viscosity(viscosity * self.viscosity_to_lattice())?;
        self.config.viscosity = viscosity;
        self.config.bulk_viscosity = None;
        Ok(())
    }

    pub fn set_bulk_viscosity(&mut self, bulk_viscosity: f64) -> Result<()> {
        self.model.set_bulk_viscosity(bulk_viscosity * self.viscosity_to_lattice())?;
        self.config.bulk_viscosity = Some(bulk_viscosity);
        Ok(())
    }

    /// Lattice relaxation rate of the odd kinetic modes.
    pub fn set_odd_rate(&mut self, omega: f64) -> Result<()> {
        self.model.set_odd_rate(omega)
    }

    /// Lattice relaxation rate of the even kinetic modes.
    pub fn set_even_rate(&mut self, omega: f64) -> Result<()> {
        self.model.set_even_rate(omega)
    }

    pub fn relaxation_rates(&self) -> RelaxationRates {
        self.model.rates()
    }

    pub fn kt(&self) -> f64 {
        self.model.kt() / self.kt_to_lattice()
    }

    pub fn set_kt(&mut self, kt: f64) -> Result<()> {
        self.model.set_kt(kt * self.kt_to_lattice())?;
        self.config.kt = kt;
        Ok(())
    }

    pub fn seed(&self) -> u32 {
        self.model.seed()
    }

    pub fn set_seed(&mut self, seed: u32) {
        self.model.set_seed(seed);
        self.config.seed = seed;
    }

    pub fn ext_force_density(&self) -> [f64; 3] {
        let scale = self.force_density_to_lattice();
        self.model.ext_force().map(|f| f / scale)
    }

    pub fn set_ext_force_density(&mut self, force_density: [f64; 3]) -> Result<()> {
        if force_density.iter().any(|f| !f.is_finite()) {
            return Err(LbError::InvalidParameter(format!(
                "external force density {force_density:?} is not finite"
            )));
        }
        let scale = self.force_density_to_lattice();
        self.model.set_ext_force(force_density.map(|f| f * scale));
        self.config.ext_force_density = force_density;
        log::debug!("external force density set to {force_density:?}");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observables (lattice units)
    // ------------------------------------------------------------------

    fn owned_sites(&self) -> impl Iterator<Item = (usize, [isize; 3])> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(b, block)| block.pdfs().interior().map(move |cell| (b, cell)))
    }

    pub fn total_mass(&self) -> f64 {
        self.owned_sites()
            .map(|(b, cell)| self.site_moments(b, cell).1)
            .sum()
    }

    /// Sum of `j + F/2` over all sites.
    pub fn total_momentum(&self) -> Vec3 {
        self.owned_sites()
            .map(|(b, cell)| {
                let (m, _, force) = self.site_moments(b, cell);
                Vec3::new(
                    m[1] + 0.5 * force[0],
                    m[2] + 0.5 * force[1],
                    m[3] + 0.5 * force[2],
                )
            })
            .sum()
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.owned_sites()
            .map(|(b, cell)| {
                let rho = self.site_moments(b, cell).1;
                let u = self.site_velocity(b, cell);
                0.5 * rho * (u[0] * u[0] + u[1] * u[1] + u[2] * u[2])
            })
            .sum()
    }

    /// Smallest density and largest speed over all sites.
    pub fn density_and_speed_extrema(&self) -> (f64, f64) {
        self.owned_sites().fold((f64::INFINITY, 0.0_f64), |(min_rho, max_u), (b, cell)| {
            let rho = self.site_moments(b, cell).1;
            let u = self.site_velocity(b, cell);
            let speed = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt();
            (min_rho.min(rho), max_u.max(speed))
        })
    }

    /// Subtract the mean momentum density from every node so that
    /// [`total_momentum`](Self::total_momentum) vanishes. Only the momentum
    /// moments change.
    pub fn remove_total_momentum(&mut self) {
        let mean = self.total_momentum() / self.decomposition.site_count() as f64;
        let delta: [f64; Q] = std::array::from_fn(|i| {
            let cu: f64 = (0..3).map(|d| C[i][d] as f64 * mean[d]).sum();
            -W[i] * cu / C_S_SQ
        });
        for block in &mut self.blocks {
            let pdfs = block.pdfs_mut();
            for [x, y, z] in pdfs.interior() {
                let mut cell = pdfs.get_cell(x, y, z);
                for i in 0..Q {
                    cell[i] += delta[i];
                }
                pdfs.set_cell(x, y, z, &cell);
            }
        }
        self.ghosts_dirty = true;
        log::debug!("removed mean momentum density {:?}", [mean.x, mean.y, mean.z]);
    }

    // ------------------------------------------------------------------
    // Checkpoints
    // ------------------------------------------------------------------

    fn global_sites(&self) -> impl Iterator<Item = Index3> + use<> {
        let [nx, ny, nz] = self.grid().map(|n| n as i64);
        (0..nz).flat_map(move |z| (0..ny).flat_map(move |y| (0..nx).map(move |x| [x, y, z])))
    }

    fn gather<const F: usize>(&self, field: impl Fn(&Block) -> &Field<F>) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.decomposition.site_count() * F);
        for site in self.global_sites() {
            let (b, local) = self.decomposition.locate(site);
            out.extend_from_slice(&Self::stored_cell(field(&self.blocks[b]), local));
        }
        out
    }

    pub fn to_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            grid: self.grid(),
            viscosity: self.model.viscosity(),
            rates: self.model.rates(),
            kt: self.model.kt(),
            seed: self.model.seed(),
            time_step: self.model.time_step(),
            density_offset: self.model.density_offset(),
            ext_force: self.model.ext_force(),
            populations: self.gather(Block::pdfs),
            pending_force: self.gather(Block::force),
            last_applied_force: self.gather(Block::last_applied_force),
        }
    }

    /// Replace the fluid state with a checkpoint. Nothing changes on error.
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        checkpoint.validate_for(self.grid())?;
        let mut model = self.model.clone();
        model.set_rates(checkpoint.rates)?;
        model.set_kt(checkpoint.kt)?;
        model.set_seed(checkpoint.seed);
        model.set_time_step(checkpoint.time_step);
        model.set_density_offset(checkpoint.density_offset);
        model.set_ext_force(checkpoint.ext_force);

        let sites: Vec<Index3> = self.global_sites().collect();
        for (n, site) in sites.into_iter().enumerate() {
            let (b, [x, y, z]) = self.decomposition.locate(site);
            let block = &mut self.blocks[b];
            let pdfs: [f64; Q] = std::array::from_fn(|i| checkpoint.populations[n * Q + i]);
            block.pdfs_mut().set_cell(x, y, z, &pdfs);
            let pending: [f64; 3] = std::array::from_fn(|d| checkpoint.pending_force[n * 3 + d]);
            block.force_mut().set_cell(x, y, z, &pending);
            let last: [f64; 3] = std::array::from_fn(|d| checkpoint.last_applied_force[n * 3 + d]);
            block.last_applied_force_mut().set_cell(x, y, z, &last);
        }
        self.model = model;
        self.sync_config_with_model();
        self.ghosts_dirty = true;
        Ok(())
    }

    /// Write the model's parameters back into the MD-unit config.
    fn sync_config_with_model(&mut self) {
        let rates = self.model.rates();
        self.config.viscosity = self.viscosity();
        self.config.bulk_viscosity = (rates.bulk != rates.shear).then(|| self.bulk_viscosity());
        self.config.kt = self.kt();
        self.config.seed = self.model.seed();
        self.config.ext_force_density = self.ext_force_density();
    }

    pub fn save_checkpoint(&self, path: impl AsRef<Path>, format: CheckpointFormat) -> Result<()> {
        let path = path.as_ref();
        self.to_checkpoint().write(path, format)?;
        log::info!(
            "saved {format:?} checkpoint at time step {} to {}",
            self.time_step(),
            path.display()
        );
        Ok(())
    }

    pub fn load_checkpoint(
        &mut self,
        path: impl AsRef<Path>,
        format: CheckpointFormat,
    ) -> Result<()> {
        let path = path.as_ref();
        let checkpoint = Checkpoint::read(path, format)?;
        self.restore(&checkpoint)?;
        log::info!(
            "loaded {format:?} checkpoint at time step {} from {}",
            self.time_step(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fluid(grid: usize) -> LbFluid {
        LbFluid::new(LbConfig {
            box_dimensions: [grid as f64; 3],
            ..LbConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_starts_at_rest() {
        let f = fluid(4);
        assert_relative_eq!(f.total_mass(), 64.0, epsilon = 1e-12);
        assert_eq!(f.node_density([1, 2, 3]).unwrap(), 1.0);
        assert_eq!(f.node_velocity([0, 0, 0]).unwrap(), Vec3::zeros());
        assert!(matches!(f.node_density([4, 0, 0]), Err(LbError::NodeOutOfRange(_))));
    }

    #[test]
    fn test_set_node_velocity_reads_back() {
        let mut f = fluid(4);
        let u = Vec3::new(0.01, -0.02, 0.005);
        f.set_node_velocity([1, 1, 1], &u).unwrap();
        assert_relative_eq!(f.node_velocity([1, 1, 1]).unwrap(), u, epsilon = 1e-15);
        assert_relative_eq!(f.node_density([1, 1, 1]).unwrap(), 1.0, epsilon = 1e-15);
        f.set_node_density([1, 1, 1], 1.2).unwrap();
        assert_relative_eq!(f.node_density([1, 1, 1]).unwrap(), 1.2, epsilon = 1e-15);
        assert_relative_eq!(f.node_velocity([1, 1, 1]).unwrap(), u, epsilon = 1e-15);
    }

    #[test]
    fn test_populations_hide_storage_offset() {
        let mut f = fluid(2);
        let pdfs = f.node_populations([0, 1, 0]).unwrap();
        for i in 0..Q {
            assert_relative_eq!(pdfs[i], W[i], epsilon = 1e-16);
        }
        let mut moved = pdfs;
        moved[4] += 0.01;
        moved[3] -= 0.01;
        f.set_node_populations([0, 1, 0], &moved).unwrap();
        assert_relative_eq!(f.node_density([0, 1, 0]).unwrap(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(f.node_velocity([0, 1, 0]).unwrap().x, 0.02, epsilon = 1e-15);
    }

    #[test]
    fn test_force_spreading_is_exact() {
        let mut f = fluid(4);
        f.apply_force_at(&Vec3::new(3.9, 0.2, 1.25), &Vec3::new(1.0, -2.0, 0.5));
        let total: Vec3 = f
            .blocks()
            .iter()
            .flat_map(|b| {
                b.force()
                    .interior()
                    .map(|[x, y, z]| Vec3::from(b.force().get_cell(x, y, z)))
                    .collect::<Vec<_>>()
            })
            .sum();
        assert_relative_eq!(total, Vec3::new(1.0, -2.0, 0.5), epsilon = 1e-14);
    }

    #[test]
    fn test_interpolation_of_uniform_flow() {
        let mut f = fluid(4);
        let u = Vec3::new(0.01, 0.0, -0.01);
        for site in f.global_sites().collect::<Vec<_>>() {
            f.set_node_velocity(site, &u).unwrap();
        }
        let far = Vec3::new(-0.3, 7.7, 2.0);
        assert_relative_eq!(f.interpolated_velocity_at(&far), u, epsilon = 1e-14);
        let far = Vec3::new(1e300, -1e300, 0.0);
        assert_relative_eq!(f.interpolated_velocity_at(&far), u, epsilon = 1e-14);
        let inside = Vec3::new(1.1, 2.2, 3.3);
        assert_relative_eq!(f.interpolated_density_at(&inside), 1.0, epsilon = 1e-14);
    }

    #[test]
    fn test_interpolated_force_of_last_step() {
        let mut f = fluid(4);
        f.set_ext_force_density([0.0, 0.0, 1e-3]).unwrap();
        let on_node = Vec3::new(2.5, 1.5, 0.5);
        f.apply_force_at(&on_node, &Vec3::new(2e-3, 0.0, 0.0));
        assert_relative_eq!(
            f.interpolated_force_at(&on_node),
            Vec3::new(0.0, 0.0, 1e-3),
            epsilon = 1e-15
        );
        f.integrate();
        let expected = Vec3::new(2e-3, 0.0, 1e-3);
        assert_relative_eq!(f.interpolated_force_at(&on_node), expected, epsilon = 1e-15);
        let image = on_node + Vec3::new(400.0, -80.0, 4e6);
        assert_relative_eq!(f.interpolated_force_at(&image), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_node_modes() {
        let mut f = fluid(2);
        let m = f.node_modes([1, 1, 0]).unwrap();
        assert_eq!(m[0], 1.0);
        assert!(m[1..].iter().all(|&v| v == 0.0));
        f.set_node_velocity([1, 1, 0], &Vec3::new(0.01, 0.0, -0.02)).unwrap();
        let m = f.node_modes([1, 1, 0]).unwrap();
        assert_relative_eq!(m[0], 1.0, epsilon = 1e-15);
        assert_relative_eq!(m[1], 0.01, epsilon = 1e-15);
        assert_relative_eq!(m[3], -0.02, epsilon = 1e-15);
    }

    #[test]
    fn test_pressure_tensor_neq() {
        let mut f = fluid(2);
        f.set_node_velocity([0, 1, 1], &Vec3::new(0.02, -0.01, 0.03)).unwrap();
        let neq = f.node_pressure_tensor_neq([0, 1, 1]).unwrap();
        assert!(neq.iter().flatten().all(|v| v.abs() < 1e-15));

        // Shear the xy plane without moving mass or momentum.
        let mut pdfs = f.node_populations([1, 0, 0]).unwrap();
        let delta = 1e-3;
        pdfs[8] += delta;
        pdfs[9] += delta;
        pdfs[7] -= delta;
        pdfs[10] -= delta;
        f.set_node_populations([1, 0, 0], &pdfs).unwrap();
        let neq = f.node_pressure_tensor_neq([1, 0, 0]).unwrap();
        assert_relative_eq!(neq[0][1], 4.0 * delta, epsilon = 1e-15);
        assert_relative_eq!(neq[1][0], 4.0 * delta, epsilon = 1e-15);
        assert_relative_eq!(neq[0][0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(neq[2][2], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_remove_total_momentum() {
        let mut f = fluid(4);
        f.set_node_velocity([1, 2, 3], &Vec3::new(0.05, -0.02, 0.01)).unwrap();
        f.set_node_velocity([3, 0, 0], &Vec3::new(0.01, 0.01, 0.0)).unwrap();
        f.apply_force_at(&Vec3::new(1.0, 1.0, 1.0), &Vec3::new(0.0, 0.0, 1e-3));
        f.integrate_n(3);
        let mass = f.total_mass();
        assert!(f.total_momentum().norm() > 1e-3);
        f.remove_total_momentum();
        assert_relative_eq!(f.total_momentum(), Vec3::zeros(), epsilon = 1e-14);
        assert_relative_eq!(f.total_mass(), mass, epsilon = 1e-12);
        f.integrate();
        assert_relative_eq!(f.total_momentum(), Vec3::zeros(), epsilon = 1e-14);
    }

    #[test]
    fn test_pressure_tensor_at_rest() {
        let f = fluid(2);
        let pi = f.node_pressure_tensor([1, 0, 1]).unwrap();
        for a in 0..3 {
            for b in 0..3 {
                let expected = if a == b { 1.0 / 3.0 } else { 0.0 };
                assert_relative_eq!(pi[a][b], expected, epsilon = 1e-15);
            }
        }
    }
}
