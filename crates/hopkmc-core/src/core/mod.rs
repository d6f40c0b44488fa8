//! # Core Module
//!
//! Fundamental, mostly immutable building blocks of a hopping simulation.
//!
//! ## Architecture
//!
//! - **Lattice Representation** ([`models`]) - Materials, the supercell site table,
//!   quantum indices, carrier occupancy and trajectories
//! - **Neighbor Shells** ([`neighbors`]) - Cutoff-window neighbor lists per element-type pair
//! - **Physics** ([`physics`]) - Marcus rates, Coulomb potentials and the charge configurator
//! - **File I/O** ([`io`]) - CSV tables for trajectories and MSD curves
//!
//! A `LatticeModel` and its `NeighborIndex` are built once per (material, supercell size,
//! cutoff set) and shared by reference between any number of independent KMC runs.

pub mod io;
pub mod models;
pub mod neighbors;
pub mod physics;
