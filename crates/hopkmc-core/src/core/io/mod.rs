//! Provides input/output functionality for simulation result tables.
//!
//! Trajectories and MSD curves are written as CSV with a short `# key=value` header that
//! carries metadata (species, bin size) not representable in the columns themselves.

pub mod msd;
pub mod traits;
pub mod trajectory;
