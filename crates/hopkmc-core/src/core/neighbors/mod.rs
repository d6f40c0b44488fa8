//! # Neighbor Module
//!
//! Precomputed neighbor shells of a lattice.
//!
//! A shell collects, for every center site, the sites of the neighbor type whose distance
//! falls inside a narrow window around a cutoff. Pair shells are computed for the centers of
//! one reference unit cell and replayed for other cells through stored unit-cell offsets; the
//! electrostatic shell `E` covers every site directly.
//!
//! - [`key`] - Parsing of `"A:B"` / `"E"` shell keys
//! - [`shell`] - Distance windows and the per-center neighbor lists
//! - [`index`] - All shells of a lattice, keyed by their textual key

pub mod index;
pub mod key;
pub mod shell;
