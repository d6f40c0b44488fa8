//! Utility functions for the engine module.
//!
//! Stochastic helpers of the KMC loop: process selection from a rate list and exponential
//! residence times.

pub mod sampling;
