use super::{load_material, write_msd};
use crate::cli::RunArgs;
use crate::config::build_run_config;
use crate::error::{CliError, Result};
use crate::ui::{UiEvent, UiProgressSink};
use hopkmc::core::io::trajectory::write_directory;
use hopkmc::workflows::{analyze, simulate};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(args: RunArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let material = load_material(&args.material)?;

    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_run_config(&args, &material)?;
    let simulation = &app_config.simulation;

    let sink = UiProgressSink::new(ui_sender);
    let reporter = sink.reporter();

    println!(
        "Starting {} KMC trajectories of {} steps on a {}x{}x{} '{}' supercell...",
        simulation.n_traj,
        simulation.kmc_steps,
        simulation.system_size[0],
        simulation.system_size[1],
        simulation.system_size[2],
        material.name
    );
    info!("Invoking the core simulation workflow...");

    let result =
        tokio::task::block_in_place(|| simulate::run(&material, simulation, &reporter))?;

    for (index, error) in &result.failures {
        warn!("Trajectory {} failed: {}", index, error);
    }
    if result.runs.is_empty() {
        return Err(CliError::AllTrajectoriesFailed(result.failures.len()));
    }

    let paths = write_directory(
        &args.output,
        result.runs.iter().map(|run| (run.index, &run.trajectory)),
    )
    .map_err(|e| CliError::FileWriting {
        path: args.output.clone(),
        source: e.into(),
    })?;
    println!(
        "✓ {} trajectories written to: {}",
        paths.len(),
        args.output.display()
    );
    if !result.failures.is_empty() {
        println!(
            "Warning: {} of {} trajectories failed and were not written.",
            result.failures.len(),
            simulation.n_traj
        );
    }

    let statistics = result.combined_statistics();
    info!(
        "Accepted {} hops over {} steps.",
        statistics.total_hops(),
        statistics.steps
    );
    for ((channel, class), count) in &statistics.hops_per_class {
        sink.log(format!("  {:<12} {:<16} {:>10} hops", channel, class, count));
    }

    if let Some(msd_config) = app_config.msd {
        info!("Configuration has an [msd] section, analyzing trajectories...");
        let trajectories = result.trajectories();
        let analysis = tokio::task::block_in_place(|| {
            analyze::run(&trajectories, &msd_config, &reporter)
        })?;
        write_msd(&analysis, &args.output.join("msd.csv"))?;
    }

    Ok(())
}
