//! # Workflows Module
//!
//! High-level entry points that run a complete simulation or analysis from a loaded material
//! and a validated configuration.
//!
//! ## Overview
//!
//! Each workflow builds what it needs from its inputs, reports phases and tasks through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) and returns an owned
//! result that the caller can write out or inspect.
//!
//! ## Architecture
//!
//! - **Simulation Workflow** ([`simulate`]) - Builds the lattice, neighbor shells and hop
//!   catalog once, then runs independent, individually seeded trajectories in parallel.
//! - **MSD Workflow** ([`analyze`]) - Bins squared displacements over a set of trajectories
//!   and estimates a diffusion coefficient.

pub mod analyze;
pub mod simulate;
