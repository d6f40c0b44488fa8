pub mod inspect;
pub mod msd;
pub mod run;

use crate::error::{CliError, Result};
use hopkmc::core::io::traits::TabularFile;
use hopkmc::core::models::material::Material;
use hopkmc::workflows::analyze::MsdAnalysis;
use std::path::Path;
use tracing::info;

pub(crate) fn load_material(path: &Path) -> Result<Material> {
    info!("Loading material from {:?}", path);
    Material::load(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

pub(crate) fn write_msd(analysis: &MsdAnalysis, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    analysis
        .record
        .write_to_path(path)
        .map_err(|e| CliError::FileWriting {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

    println!(
        "✓ MSD ({} bins, {} samples) written to: {}",
        analysis.record.bins.len(),
        analysis.record.total_samples(),
        path.display()
    );
    match analysis.diffusion_coefficient {
        Some(d) => println!("  Diffusion coefficient estimate: {:.6e}", d),
        None => println!("  Too few populated bins for a diffusion coefficient estimate."),
    }
    Ok(())
}
