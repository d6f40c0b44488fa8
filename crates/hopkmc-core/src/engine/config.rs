use crate::core::models::ids::{Periodicity, QuantumIndex, SystemSize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// A site given either directly by SEI or by quantum index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteSpec {
    Sei(usize),
    Quantum(QuantumIndex),
}

/// Where the carriers sit when a run starts.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialOccupancy {
    /// Explicit `(species, site)` placements.
    Sites(Vec<(String, SiteSpec)>),
    /// Number of carriers per species, drawn uniformly from the species' allowed sites.
    Random(BTreeMap<String, usize>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElectrostaticsConfig {
    pub dielectric_constant: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub system_size: SystemSize,
    pub periodicity: Periodicity,
    /// Temperature in K.
    pub temperature: f64,
    pub n_traj: usize,
    pub kmc_steps: usize,
    pub step_interval: usize,
    pub random_seed: u64,
    pub initial_occupancy: InitialOccupancy,
    pub electrostatics: Option<ElectrostaticsConfig>,
    /// Subtract the electronic coupling from the Marcus barrier.
    pub coupling_correction: bool,
}

impl SimulationConfig {
    /// Number of checkpoints each trajectory records.
    pub fn checkpoints_per_trajectory(&self) -> usize {
        self.kmc_steps / self.step_interval
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    system_size: Option<SystemSize>,
    periodicity: Option<Periodicity>,
    temperature: Option<f64>,
    n_traj: Option<usize>,
    kmc_steps: Option<usize>,
    step_interval: Option<usize>,
    random_seed: Option<u64>,
    initial_occupancy: Option<InitialOccupancy>,
    electrostatics: Option<ElectrostaticsConfig>,
    coupling_correction: bool,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_size(mut self, size: SystemSize) -> Self {
        self.system_size = Some(size);
        self
    }
    pub fn periodicity(mut self, periodicity: Periodicity) -> Self {
        self.periodicity = Some(periodicity);
        self
    }
    pub fn temperature(mut self, kelvin: f64) -> Self {
        self.temperature = Some(kelvin);
        self
    }
    pub fn n_traj(mut self, n: usize) -> Self {
        self.n_traj = Some(n);
        self
    }
    pub fn kmc_steps(mut self, steps: usize) -> Self {
        self.kmc_steps = Some(steps);
        self
    }
    pub fn step_interval(mut self, interval: usize) -> Self {
        self.step_interval = Some(interval);
        self
    }
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
    pub fn initial_occupancy(mut self, occupancy: InitialOccupancy) -> Self {
        self.initial_occupancy = Some(occupancy);
        self
    }
    pub fn electrostatics(mut self, electrostatics: Option<ElectrostaticsConfig>) -> Self {
        self.electrostatics = electrostatics;
        self
    }
    pub fn coupling_correction(mut self, enabled: bool) -> Self {
        self.coupling_correction = enabled;
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let config = SimulationConfig {
            system_size: self
                .system_size
                .ok_or(ConfigError::MissingParameter("system_size"))?,
            periodicity: self.periodicity.unwrap_or_default(),
            temperature: self
                .temperature
                .ok_or(ConfigError::MissingParameter("temperature"))?,
            n_traj: self.n_traj.ok_or(ConfigError::MissingParameter("n_traj"))?,
            kmc_steps: self
                .kmc_steps
                .ok_or(ConfigError::MissingParameter("kmc_steps"))?,
            step_interval: self
                .step_interval
                .ok_or(ConfigError::MissingParameter("step_interval"))?,
            random_seed: self
                .random_seed
                .ok_or(ConfigError::MissingParameter("random_seed"))?,
            initial_occupancy: self
                .initial_occupancy
                .ok_or(ConfigError::MissingParameter("initial_occupancy"))?,
            electrostatics: self.electrostatics,
            coupling_correction: self.coupling_correction,
        };
        validate_simulation(&config)?;
        Ok(config)
    }
}

fn validate_simulation(config: &SimulationConfig) -> Result<(), ConfigError> {
    if config.system_size.iter().any(|&n| n == 0) {
        return Err(ConfigError::InvalidParameter {
            name: "system_size",
            reason: format!("{:?} has a zero dimension", config.system_size),
        });
    }
    if !(config.temperature.is_finite() && config.temperature > 0.0) {
        return Err(ConfigError::InvalidParameter {
            name: "temperature",
            reason: format!("{} K is not a positive temperature", config.temperature),
        });
    }
    if config.n_traj == 0 {
        return Err(ConfigError::InvalidParameter {
            name: "n_traj",
            reason: "at least one trajectory is required".to_string(),
        });
    }
    if config.step_interval == 0 || config.step_interval > config.kmc_steps {
        return Err(ConfigError::InvalidParameter {
            name: "step_interval",
            reason: format!(
                "{} must lie in [1, kmc_steps = {}]",
                config.step_interval, config.kmc_steps
            ),
        });
    }
    if let Some(electrostatics) = &config.electrostatics {
        if electrostatics.dielectric_constant <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "dielectric_constant",
                reason: format!("{} is not positive", electrostatics.dielectric_constant),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsdConfig {
    /// Largest checkpoint lag.
    pub n_steps: usize,
    /// Number of starting checkpoints per trajectory.
    pub n_disp: usize,
    pub bin_size: f64,
    /// Factor applied to times before binning, e.g. `1e9` for seconds to nanoseconds.
    pub time_scale: f64,
    /// Factor applied to displacements before squaring.
    pub distance_scale: f64,
}

#[derive(Default)]
pub struct MsdConfigBuilder {
    n_steps: Option<usize>,
    n_disp: Option<usize>,
    bin_size: Option<f64>,
    time_scale: Option<f64>,
    distance_scale: Option<f64>,
}

impl MsdConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_steps(mut self, n: usize) -> Self {
        self.n_steps = Some(n);
        self
    }
    pub fn n_disp(mut self, n: usize) -> Self {
        self.n_disp = Some(n);
        self
    }
    pub fn bin_size(mut self, size: f64) -> Self {
        self.bin_size = Some(size);
        self
    }
    pub fn time_scale(mut self, scale: f64) -> Self {
        self.time_scale = Some(scale);
        self
    }
    pub fn distance_scale(mut self, scale: f64) -> Self {
        self.distance_scale = Some(scale);
        self
    }

    pub fn build(self) -> Result<MsdConfig, ConfigError> {
        let config = MsdConfig {
            n_steps: self.n_steps.ok_or(ConfigError::MissingParameter("n_steps"))?,
            n_disp: self.n_disp.ok_or(ConfigError::MissingParameter("n_disp"))?,
            bin_size: self
                .bin_size
                .ok_or(ConfigError::MissingParameter("bin_size"))?,
            time_scale: self.time_scale.unwrap_or(1.0),
            distance_scale: self.distance_scale.unwrap_or(1.0),
        };
        if config.n_steps == 0 || config.n_disp == 0 {
            return Err(ConfigError::InvalidParameter {
                name: if config.n_steps == 0 { "n_steps" } else { "n_disp" },
                reason: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("bin_size", config.bin_size),
            ("time_scale", config.time_scale),
            ("distance_scale", config.distance_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name,
                    reason: format!("{value} is not a positive number"),
                });
            }
        }
        Ok(config)
    }
}
