//! Post-processing of sealed trajectories.
//!
//! - [`msd`] - Mean-squared displacement binned over elapsed time

pub mod msd;
