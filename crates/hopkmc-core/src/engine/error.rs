use thiserror::Error;

use super::config::ConfigError;
use super::state::EngineState;
use super::utils::sampling::SamplingError;
use crate::core::models::lattice::LatticeError;
use crate::core::models::occupancy::OccupancyError;
use crate::core::neighbors::index::NeighborError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Lattice error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Neighbor index error: {source}")]
    Neighbor {
        #[from]
        source: NeighborError,
    },

    #[error("Occupancy error: {source}")]
    Occupancy {
        #[from]
        source: OccupancyError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Process selection failed at step {step}: {source}")]
    Sampling { step: usize, source: SamplingError },

    #[error("No hopping process available at step {step} ({carriers} carriers)")]
    NoAvailableProcess { step: usize, carriers: usize },

    #[error("Engine cannot run from state {state:?}")]
    InvalidState { state: EngineState },
}
