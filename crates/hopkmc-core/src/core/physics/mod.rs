//! Hopping physics: Marcus rates, site charges and electrostatic driving forces.
//!
//! - [`potentials`] - Marcus activation, hopping rate and Coulomb kernels
//! - [`charges`] - Per-site charge distributions derived from an occupancy
//! - [`electrostatics`] - Free-energy differences of hops over the `E` shell

pub mod charges;
pub mod electrostatics;
pub mod potentials;
