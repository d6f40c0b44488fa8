//! # HopKMC Core Library
//!
//! A library for simulating charge-carrier (electron/hole polaron) hopping transport in
//! crystalline lattices with kinetic Monte Carlo driven by Marcus-theory hopping rates, and
//! for reducing the resulting trajectories to a mean-squared-displacement curve.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict layered architecture, with data flowing forward only.
//!
//! - **[`core`]: The Foundation.** Immutable lattice and neighbor models (`LatticeModel`,
//!   `NeighborIndex`), carrier occupancy, the charge configurator, Marcus/Coulomb potentials
//!   and table I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful kinetic Monte Carlo engine: process
//!   enumeration, rate evaluation, stochastic selection, waiting times and trajectory
//!   checkpointing, together with its configuration, errors and progress reporting.
//!
//! - **[`analysis`]: Post-processing.** Mean squared displacement binning over sealed
//!   trajectories.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into complete
//!   procedures such as running many independent trajectories in parallel.

pub mod analysis;
pub mod core;
pub mod engine;
pub mod workflows;
