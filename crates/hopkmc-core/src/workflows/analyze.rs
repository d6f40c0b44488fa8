use crate::analysis::msd::{self, MsdError, MsdRecord};
use crate::core::models::trajectory::Trajectory;
use crate::engine::config::MsdConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct MsdAnalysis {
    pub record: MsdRecord,
    /// Least-squares estimate `D = slope / 6`, absent when fewer than two bins hold samples.
    pub diffusion_coefficient: Option<f64>,
}

#[instrument(skip_all, name = "msd_workflow")]
pub fn run(
    trajectories: &[Trajectory],
    config: &MsdConfig,
    reporter: &ProgressReporter,
) -> Result<MsdAnalysis, MsdError> {
    reporter.report(Progress::PhaseStart {
        name: "MSD Analysis",
    });
    info!(
        trajectories = trajectories.len(),
        n_steps = config.n_steps,
        n_disp = config.n_disp,
        bin_size = config.bin_size,
        "Computing mean squared displacement."
    );

    let record = msd::analyze(trajectories, config)?;
    let diffusion_coefficient = record.diffusion_coefficient();

    reporter.report(Progress::StatusUpdate {
        text: format!(
            "{} samples in {} bins",
            record.total_samples(),
            record.bins.len()
        ),
    });
    reporter.report(Progress::PhaseFinish);

    info!(
        bins = record.bins.len(),
        samples = record.total_samples(),
        diffusion = ?diffusion_coefficient,
        "MSD workflow complete."
    );
    Ok(MsdAnalysis {
        record,
        diffusion_coefficient,
    })
}
