//! # Engine Module
//!
//! The kinetic Monte Carlo engine that moves carriers across a prepared lattice.
//!
//! ## Overview
//!
//! A run starts from an initial occupancy and repeats a fixed number of atomic steps: list
//! every hop available to every carrier, weight each by its Marcus rate, pick one with a
//! uniform draw over the cumulative rates and advance the clock by an exponentially
//! distributed residence time. Every `step_interval` steps the elapsed time and the summed
//! carrier displacement are recorded as a checkpoint.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Simulation and MSD parameters with validating builders
//! - **Context** ([`context`]) - Shared lattice, neighbor index and hop catalog, plus initial
//!   placement of carriers
//! - **Processes** ([`process`]) - Rate classes and hop enumeration for an occupancy
//! - **KMC Loop** ([`kmc`]) - The `Idle → Running → Finished` engine
//! - **State Tracking** ([`state`]) - Engine lifecycle and per-run statistics
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod config;
pub mod context;
pub mod error;
pub mod kmc;
pub mod process;
pub mod progress;
pub mod state;
pub mod utils;
