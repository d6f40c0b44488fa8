use crate::core::models::trajectory::Trajectory;
use crate::engine::config::MsdConfig;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MsdError {
    #[error(
        "Trajectory {index} has {len} checkpoints but n_disp + n_steps = {required} are required"
    )]
    TrajectoryTooShort {
        index: usize,
        len: usize,
        required: usize,
    },
    #[error("Invalid MSD parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("No trajectories to analyze")]
    NoTrajectories,
}

/// One time bin of an MSD curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MsdBin {
    /// Bin center, `(bin + 0.5) · bin_size`, in scaled time units.
    pub time: f64,
    /// Mean squared displacement, `None` when no sample fell into the bin.
    pub msd: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MsdRecord {
    pub bins: Vec<MsdBin>,
    /// Carrier species the trajectories followed, sorted and deduplicated.
    pub species: Vec<String>,
    pub bin_size: f64,
}

impl MsdRecord {
    pub fn nonempty(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins
            .iter()
            .filter_map(|bin| bin.msd.map(|msd| (bin.time, msd)))
    }

    pub fn total_samples(&self) -> usize {
        self.bins.iter().map(|b| b.samples).sum()
    }

    /// Diffusion coefficient from a least-squares line through the nonempty bins,
    /// `D = slope / 6`, in scaled distance² per scaled time.
    pub fn diffusion_coefficient(&self) -> Option<f64> {
        let points: Vec<(f64, f64)> = self.nonempty().collect();
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_t = points.iter().map(|(t, _)| t).sum::<f64>() / n;
        let mean_m = points.iter().map(|(_, m)| m).sum::<f64>() / n;
        let covariance: f64 = points
            .iter()
            .map(|(t, m)| (t - mean_t) * (m - mean_m))
            .sum();
        let variance: f64 = points.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();
        if variance <= f64::EPSILON {
            return None;
        }
        Some(covariance / variance / 6.0)
    }
}

/// `(dt, sd)` samples of one trajectory for every lag in `1..=n_steps` and every start in
/// `0..n_disp`, after scaling.
pub fn squared_displacements(
    trajectory: &Trajectory,
    index: usize,
    config: &MsdConfig,
) -> Result<Vec<(f64, f64)>, MsdError> {
    let required = config.n_disp + config.n_steps;
    if trajectory.len() < required {
        return Err(MsdError::TrajectoryTooShort {
            index,
            len: trajectory.len(),
            required,
        });
    }
    let checkpoints = trajectory.checkpoints();
    let mut samples = Vec::with_capacity(config.n_disp * config.n_steps);
    for lag in 1..=config.n_steps {
        for start in 0..config.n_disp {
            let (a, b) = (&checkpoints[start], &checkpoints[start + lag]);
            let dt = (b.time - a.time) * config.time_scale;
            let sd = ((b.displacement - a.displacement) * config.distance_scale).norm_squared();
            samples.push((dt, sd));
        }
    }
    Ok(samples)
}

/// Pools the squared displacements of all trajectories and bins them by elapsed time.
#[instrument(skip_all, name = "msd_analysis", fields(trajectories = trajectories.len()))]
pub fn analyze(trajectories: &[Trajectory], config: &MsdConfig) -> Result<MsdRecord, MsdError> {
    validate(config)?;
    if trajectories.is_empty() {
        return Err(MsdError::NoTrajectories);
    }

    #[cfg(not(feature = "parallel"))]
    let iterator = trajectories.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = trajectories.par_iter().enumerate();

    let per_trajectory: Vec<Vec<(f64, f64)>> = iterator
        .map(|(index, trajectory)| squared_displacements(trajectory, index, config))
        .collect::<Result<_, _>>()?;

    let mut sums: Vec<f64> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for (dt, sd) in per_trajectory.into_iter().flatten() {
        let bin = (dt / config.bin_size).floor().max(0.0) as usize;
        if bin >= sums.len() {
            sums.resize(bin + 1, 0.0);
            counts.resize(bin + 1, 0);
        }
        sums[bin] += sd;
        counts[bin] += 1;
    }

    let bins: Vec<MsdBin> = sums
        .iter()
        .zip(&counts)
        .enumerate()
        .map(|(bin, (&sum, &samples))| MsdBin {
            time: (bin as f64 + 0.5) * config.bin_size,
            msd: (samples > 0).then(|| sum / samples as f64),
            samples,
        })
        .collect();

    let species = trajectories
        .iter()
        .flat_map(|t| t.species().iter().cloned())
        .sorted()
        .dedup()
        .collect();

    debug!(bins = bins.len(), "Binned squared displacements.");
    Ok(MsdRecord {
        bins,
        species,
        bin_size: config.bin_size,
    })
}

fn validate(config: &MsdConfig) -> Result<(), MsdError> {
    if !(config.bin_size.is_finite() && config.bin_size > 0.0) {
        return Err(MsdError::InvalidParameter {
            name: "bin_size",
            reason: format!("{} is not positive", config.bin_size),
        });
    }
    if config.n_steps == 0 || config.n_disp == 0 {
        return Err(MsdError::InvalidParameter {
            name: if config.n_steps == 0 { "n_steps" } else { "n_disp" },
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}
