use hopkmc::core::models::ids::{Periodicity, SystemSize};
use hopkmc::engine::config as core_config;

pub struct RunConfig {
    pub simulation: core_config::SimulationConfig,
    /// Present when the configuration carries an `[msd]` section.
    pub msd: Option<core_config::MsdConfig>,
}

/// Supercell geometry and temperature, enough to inspect a material without running it.
pub struct GeometryConfig {
    pub system_size: SystemSize,
    pub periodicity: Periodicity,
    pub temperature: f64,
}
