//! # Core Models Module
//!
//! Data structures describing the simulated crystal and the carriers moving through it.
//!
//! ## Key Components
//!
//! - [`material`] - Element types, unit-cell sites, lattice parameters, species and hopping
//!   parameters, loadable from TOML
//! - [`lattice`] - The supercell site table and the `QuantumIndex` ↔ SEI bijection
//! - [`ids`] - Quantum indices and supercell descriptors
//! - [`occupancy`] - Which sites currently carry which mobile species
//! - [`trajectory`] - Append-only checkpoints of simulated time and net displacement
//!
//! ```ignore
//! use hopkmc::core::models::{lattice::LatticeModel, material::Material};
//!
//! let material = Material::load(Path::new("hematite.toml"))?;
//! let lattice = LatticeModel::new(&material, [3, 3, 3], Periodicity::none())?;
//! let sei = lattice.quantum_index_to_sei(&QuantumIndex::new([1, 1, 1], 0, 3))?;
//! ```

pub mod ids;
pub mod lattice;
pub mod material;
pub mod occupancy;
pub mod trajectory;
