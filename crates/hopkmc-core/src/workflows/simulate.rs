use crate::core::models::material::Material;
use crate::core::models::trajectory::Trajectory;
use crate::engine::config::SimulationConfig;
use crate::engine::context::{SimulationContext, SimulationSystem};
use crate::engine::error::EngineError;
use crate::engine::kmc::{KmcEngine, KmcOutcome};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::RunStatistics;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct TrajectoryRun {
    pub index: usize,
    pub trajectory: Trajectory,
    pub statistics: RunStatistics,
}

#[derive(Debug)]
pub struct SimulationResult {
    /// Completed trajectories in index order.
    pub runs: Vec<TrajectoryRun>,
    /// Trajectories that stopped with an error, with their index.
    pub failures: Vec<(usize, EngineError)>,
}

impl SimulationResult {
    pub fn trajectories(&self) -> Vec<Trajectory> {
        self.runs.iter().map(|run| run.trajectory.clone()).collect()
    }

    pub fn combined_statistics(&self) -> RunStatistics {
        let mut total = RunStatistics::default();
        for run in &self.runs {
            total.merge(&run.statistics);
        }
        total
    }
}

/// Seed of trajectory `index`: the configured seed offset by the index.
pub fn trajectory_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

#[instrument(skip_all, name = "simulation_workflow")]
pub fn run(
    material: &Material,
    config: &SimulationConfig,
    reporter: &ProgressReporter,
) -> Result<SimulationResult, EngineError> {
    // === Phase 1: Lattice, neighbor shells and hop catalog ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        material = %material.name,
        size = ?config.system_size,
        "Building lattice and neighbor shells."
    );
    material
        .validate()
        .map_err(|e| EngineError::Initialization(format!("invalid material: {e}")))?;
    let system = SimulationSystem::build(material, config)?;
    let context = SimulationContext::new(material, &system, config, reporter);

    // Placement errors that do not depend on the seed abort before any trajectory runs.
    context.initial_occupancy(&mut StdRng::seed_from_u64(config.random_seed))?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Independent trajectories ===
    reporter.report(Progress::PhaseStart {
        name: "KMC Trajectories",
    });
    reporter.report(Progress::TaskStart {
        total_steps: config.n_traj as u64,
    });
    info!(
        trajectories = config.n_traj,
        steps = config.kmc_steps,
        "Running KMC trajectories."
    );

    #[cfg(not(feature = "parallel"))]
    let iterator = (0..config.n_traj).into_iter();

    #[cfg(feature = "parallel")]
    let iterator = (0..config.n_traj).into_par_iter();

    let outcomes: Vec<(usize, Result<KmcOutcome, EngineError>)> = iterator
        .map(|index| {
            let outcome = run_trajectory(context, index);
            context.reporter.report(Progress::TaskIncrement);
            (index, outcome)
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let mut runs = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, outcome) in outcomes {
        match outcome {
            Ok(outcome) => runs.push(TrajectoryRun {
                index,
                trajectory: outcome.trajectory,
                statistics: outcome.statistics,
            }),
            Err(e) => {
                warn!(trajectory = index, error = %e, "Trajectory failed.");
                reporter.report(Progress::TrajectoryFailed {
                    index,
                    reason: e.to_string(),
                });
                failures.push((index, e));
            }
        }
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        completed = runs.len(),
        failed = failures.len(),
        "Simulation workflow complete."
    );
    Ok(SimulationResult { runs, failures })
}

fn run_trajectory(context: SimulationContext<'_>, index: usize) -> Result<KmcOutcome, EngineError> {
    let mut rng = StdRng::seed_from_u64(trajectory_seed(context.config.random_seed, index));
    let occupancy = context.initial_occupancy(&mut rng)?;
    KmcEngine::new(context).run(occupancy, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::material::test_materials;
    use crate::engine::config::{InitialOccupancy, SimulationConfigBuilder, SiteSpec};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dimer_config(initial: InitialOccupancy, n_traj: usize) -> SimulationConfig {
        SimulationConfigBuilder::new()
            .system_size([1, 1, 1])
            .temperature(300.0)
            .n_traj(n_traj)
            .kmc_steps(50)
            .step_interval(5)
            .random_seed(100)
            .initial_occupancy(initial)
            .build()
            .unwrap()
    }

    #[test]
    fn runs_every_trajectory_with_its_own_seed() {
        let material = test_materials::dimer();
        let config = dimer_config(
            InitialOccupancy::Sites(vec![("electron".to_string(), SiteSpec::Sei(0))]),
            4,
        );
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let result = run(&material, &config, &reporter).unwrap();
        assert!(result.failures.is_empty());
        assert_eq!(
            result.runs.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert!(result.runs.iter().all(|r| r.trajectory.len() == 10));
        assert_ne!(
            result.runs[0].trajectory.final_time(),
            result.runs[1].trajectory.final_time()
        );
        assert_eq!(result.combined_statistics().total_hops(), 200);
        drop(reporter);
        assert_eq!(increments.into_inner(), 4);
    }

    #[test]
    fn blocked_trajectories_are_reported_as_failures() {
        let material = test_materials::dimer();
        let config = dimer_config(
            InitialOccupancy::Random(BTreeMap::from([("electron".to_string(), 2)])),
            3,
        );
        let result = run(&material, &config, &ProgressReporter::new()).unwrap();
        assert!(result.runs.is_empty());
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures.iter().all(|(_, e)| matches!(
            e,
            EngineError::NoAvailableProcess { step: 0, .. }
        )));
    }

    #[test]
    fn placement_errors_abort_before_any_trajectory() {
        let material = test_materials::dimer();
        let config = dimer_config(
            InitialOccupancy::Sites(vec![("electron".to_string(), SiteSpec::Sei(7))]),
            2,
        );
        assert!(matches!(
            run(&material, &config, &ProgressReporter::new()),
            Err(EngineError::Occupancy { .. })
        ));
    }

    #[test]
    fn trajectory_seeds_are_offset_by_index() {
        assert_eq!(trajectory_seed(10, 3), 13);
        assert_eq!(trajectory_seed(u64::MAX, 1), 0);
    }
}
