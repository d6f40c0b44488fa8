use super::write_msd;
use crate::cli::MsdArgs;
use crate::config::build_msd_config;
use crate::error::{CliError, Result};
use crate::ui::{UiEvent, UiProgressSink};
use hopkmc::core::io::trajectory::read_directory;
use hopkmc::workflows::analyze;
use tokio::sync::mpsc;
use tracing::info;

pub async fn run(args: MsdArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Merging MSD configuration from file and CLI arguments...");
    let msd_config = build_msd_config(&args)?;

    info!("Reading trajectories from {:?}", &args.input);
    let trajectories = read_directory(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    if trajectories.is_empty() {
        return Err(CliError::Argument(format!(
            "No trajectory files (traj_*.csv) found in {}",
            args.input.display()
        )));
    }
    println!(
        "Analyzing {} trajectories from {}...",
        trajectories.len(),
        args.input.display()
    );

    let reporter = UiProgressSink::new(ui_sender).reporter();
    let analysis =
        tokio::task::block_in_place(|| analyze::run(&trajectories, &msd_config, &reporter))?;

    write_msd(&analysis, &args.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopkmc::analysis::msd::{MsdError, MsdRecord};
    use hopkmc::core::io::traits::TabularFile;
    use hopkmc::core::io::trajectory::write_directory;
    use hopkmc::core::models::trajectory::{Checkpoint, Trajectory};
    use std::path::Path;
    use tempfile::tempdir;

    fn unit_steps(n: usize) -> Trajectory {
        let checkpoints = (1..=n)
            .map(|i| Checkpoint {
                time: i as f64,
                displacement: [i as f64, 0.0, 0.0].into(),
            })
            .collect();
        Trajectory::from_checkpoints(checkpoints, vec!["hole".to_string()])
    }

    fn msd_args(input: &Path, output: &Path) -> MsdArgs {
        MsdArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            config: None,
            n_steps: Some(2),
            n_disp: Some(2),
            bin_size: Some(1.0),
            time_scale: None,
            distance_scale: None,
            set_values: vec![],
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_msd_table_for_trajectory_directory() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("run");
        let trajectories = [unit_steps(5), unit_steps(5)];
        write_directory(&input, trajectories.iter().enumerate()).unwrap();
        let output = dir.path().join("analysis").join("msd.csv");
        let (sender, _receiver) = mpsc::channel(1024);

        run(msd_args(&input, &output), sender).await.unwrap();

        let record = MsdRecord::read_from_path(&output).unwrap();
        assert_eq!(record.species, vec!["hole".to_string()]);
        assert_eq!(record.total_samples(), 8);
        let populated: Vec<(f64, f64)> = record.nonempty().collect();
        assert_eq!(populated, vec![(1.5, 1.0), (2.5, 4.0)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_directory_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let (sender, _receiver) = mpsc::channel(1024);
        let result = run(msd_args(dir.path(), &dir.path().join("msd.csv")), sender).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn short_trajectories_surface_msd_errors() {
        let dir = tempdir().unwrap();
        write_directory(dir.path(), [(0, &unit_steps(3))]).unwrap();
        let (sender, _receiver) = mpsc::channel(1024);
        let result = run(msd_args(dir.path(), &dir.path().join("msd.csv")), sender).await;
        assert!(matches!(
            result,
            Err(CliError::Msd(MsdError::TrajectoryTooShort { .. }))
        ));
    }
}
