use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use phyz_lbm::{CheckpointFormat, LbConfig, LbFluid, vtk};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Binary,
    Text,
}

impl From<Format> for CheckpointFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Binary => CheckpointFormat::Binary,
            Format::Text => CheckpointFormat::Text,
        }
    }
}

/// Run a periodic fluctuating lattice Boltzmann fluid.
#[derive(Parser)]
#[command(name = "lb-run")]
#[command(
    about = "Integrate a D3Q19 lattice Boltzmann fluid and report observables",
    long_about = None
)]
struct Cli {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of time steps
    #[arg(long, default_value_t = 100)]
    steps: usize,
    /// Log observables every N steps
    #[arg(long, default_value_t = 10)]
    report_every: usize,
    /// Resume from this checkpoint
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Write a checkpoint here after the run
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Binary)]
    format: Format,
    /// Directory for VTK velocity and density output after the run
    #[arg(long)]
    vtk_dir: Option<PathBuf>,
}

fn report(fluid: &LbFluid) {
    let (min_rho, max_u) = fluid.density_and_speed_extrema();
    let p = fluid.total_momentum();
    log::info!(
        "step {:>8}: mass {:.12e}, momentum [{:.3e}, {:.3e}, {:.3e}], E_kin {:.6e}, min rho {:.6}, max |u| {:.3e}",
        fluid.time_step(),
        fluid.total_mass(),
        p.x,
        p.y,
        p.z,
        fluid.kinetic_energy(),
        min_rho,
        max_u,
    );
}

fn main() -> phyz_lbm::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LbConfig::load(path)?,
        None => LbConfig::default(),
    };
    let mut fluid = LbFluid::new(config)?;
    if let Some(path) = &cli.resume {
        fluid.load_checkpoint(path, cli.format.into())?;
    }

    report(&fluid);
    let every = cli.report_every.max(1);
    for step in 1..=cli.steps {
        fluid.integrate();
        if step % every == 0 {
            report(&fluid);
        }
    }

    if let Some(path) = &cli.checkpoint {
        fluid.save_checkpoint(path, cli.format.into())?;
    }
    if let Some(dir) = &cli.vtk_dir {
        std::fs::create_dir_all(dir)?;
        vtk::write_velocity(&fluid, dir.join("velocity.vtk"))?;
        vtk::write_density(&fluid, dir.join("density.vtk"))?;
        log::info!("wrote VTK output to {}", dir.display());
    }
    Ok(())
}
