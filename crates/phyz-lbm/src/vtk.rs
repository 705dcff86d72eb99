//! Legacy ASCII VTK output of node data, in MD units.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::fluid::LbFluid;

fn write_header(out: &mut impl Write, fluid: &LbFluid) -> Result<()> {
    let [nx, ny, nz] = fluid.grid();
    let a = fluid.config().agrid;
    writeln!(out, "# vtk DataFile Version 2.0")?;
    writeln!(out, "lbfluid time step {}", fluid.time_step())?;
    writeln!(out, "ASCII")?;
    writeln!(out, "DATASET STRUCTURED_POINTS")?;
    writeln!(out, "DIMENSIONS {nx} {ny} {nz}")?;
    writeln!(out, "ORIGIN {} {} {}", 0.5 * a, 0.5 * a, 0.5 * a)?;
    writeln!(out, "SPACING {a} {a} {a}")?;
    writeln!(out, "POINT_DATA {}", nx * ny * nz)?;
    Ok(())
}

fn nodes(fluid: &LbFluid) -> impl Iterator<Item = [i64; 3]> + use<> {
    let [nx, ny, nz] = fluid.grid().map(|n| n as i64);
    (0..nz).flat_map(move |z| (0..ny).flat_map(move |y| (0..nx).map(move |x| [x, y, z])))
}

/// Node velocities as a `VECTORS` data set.
pub fn write_velocity(fluid: &LbFluid, path: impl AsRef<Path>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, fluid)?;
    writeln!(out, "VECTORS velocity float")?;
    let scale = fluid.config().agrid / fluid.config().tau;
    for node in nodes(fluid) {
        let u = fluid.node_velocity(node)? * scale;
        writeln!(out, "{} {} {}", u.x, u.y, u.z)?;
    }
    out.flush()?;
    Ok(())
}

/// Node densities as a `SCALARS` data set.
pub fn write_density(fluid: &LbFluid, path: impl AsRef<Path>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, fluid)?;
    writeln!(out, "SCALARS density float 1")?;
    writeln!(out, "LOOKUP_TABLE default")?;
    let scale = fluid.config().agrid.powi(3).recip();
    for node in nodes(fluid) {
        writeln!(out, "{}", fluid.node_density(node)? * scale)?;
    }
    out.flush()?;
    Ok(())
}
