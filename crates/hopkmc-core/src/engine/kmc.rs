use super::context::SimulationContext;
use super::error::EngineError;
use super::process::HoppingProcess;
use super::state::{EngineState, RunStatistics};
use super::utils::sampling::sample_event;
use crate::core::models::occupancy::Occupancy;
use crate::core::models::trajectory::{Trajectory, TrajectoryBuilder};
use crate::core::physics::charges::{ChargeConfig, ChargeConfigurator};
use crate::core::physics::electrostatics::Electrostatics;
use crate::core::physics::potentials::{marcus_activation, marcus_rate};
use nalgebra::Vector3;
use rand::Rng;
use tracing::{debug, trace};

/// Result of one completed KMC run.
#[derive(Debug, Clone)]
pub struct KmcOutcome {
    pub trajectory: Trajectory,
    pub statistics: RunStatistics,
    pub final_occupancy: Occupancy,
}

/// Electrostatic state carried through a run when ΔG0 is enabled.
struct ChargeTracker<'a> {
    configurator: ChargeConfigurator<'a>,
    electrostatics: Electrostatics<'a>,
    charges: ChargeConfig,
}

/// Discrete-event Monte Carlo over carrier hops.
///
/// An engine performs a single run; create a new engine for each trajectory.
pub struct KmcEngine<'a> {
    context: SimulationContext<'a>,
    state: EngineState,
    class_rates: Vec<f64>,
}

impl<'a> KmcEngine<'a> {
    pub fn new(context: SimulationContext<'a>) -> Self {
        let config = context.config;
        let vn = context.material.hopping.attempt_frequency;
        let class_rates = context
            .system
            .catalog
            .classes()
            .iter()
            .map(|class| {
                let vab = config.coupling_correction.then_some(class.vab);
                marcus_rate(
                    vn,
                    marcus_activation(class.lambda, 0.0, vab),
                    config.temperature,
                )
            })
            .collect();
        Self {
            context,
            state: EngineState::Idle,
            class_rates,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Zero-driving-force rate of each rate class, in catalog order.
    pub fn class_rates(&self) -> &[f64] {
        &self.class_rates
    }

    /// Runs `kmc_steps` hops starting from `occupancy`.
    ///
    /// The engine ends up `Finished` whether the run succeeds or fails.
    pub fn run(
        &mut self,
        occupancy: Occupancy,
        rng: &mut impl Rng,
    ) -> Result<KmcOutcome, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::InvalidState { state: self.state });
        }
        self.state = EngineState::Running;
        let result = self.execute(occupancy, rng);
        self.state = EngineState::Finished;
        result
    }

    fn execute(
        &self,
        mut occupancy: Occupancy,
        rng: &mut impl Rng,
    ) -> Result<KmcOutcome, EngineError> {
        let ctx = &self.context;
        let config = ctx.config;
        let lattice = &ctx.system.lattice;
        let catalog = &ctx.system.catalog;

        let mut tracker = self.charge_tracker(&occupancy)?;
        let species: Vec<String> = occupancy
            .species()
            .iter()
            .enumerate()
            .filter(|(index, _)| occupancy.sites_of(*index).next().is_some())
            .map(|(_, s)| s.name.clone())
            .collect();

        let mut builder = TrajectoryBuilder::with_capacity(config.checkpoints_per_trajectory());
        let mut statistics = RunStatistics::default();
        let mut processes: Vec<HoppingProcess> = Vec::new();
        let mut rates: Vec<f64> = Vec::new();
        let mut interval_time = 0.0;
        let mut interval_displacement = Vector3::zeros();

        for step in 0..config.kmc_steps {
            catalog.enumerate(lattice, &occupancy, &mut processes);
            if processes.is_empty() {
                return Err(EngineError::NoAvailableProcess {
                    step,
                    carriers: occupancy.carrier_count(),
                });
            }
            statistics.max_processes = statistics.max_processes.max(processes.len());

            rates.clear();
            rates.extend(processes.iter().map(|p| self.rate(p, tracker.as_ref())));
            let (selected, dt) =
                sample_event(&rates, rng).map_err(|source| EngineError::Sampling { step, source })?;
            let process = processes[selected];

            occupancy.move_carrier(process.origin, process.destination)?;
            if let Some(tracker) = tracker.as_mut() {
                tracker.charges = tracker.configurator.configure(&occupancy)?;
            }

            let class = &catalog.classes()[process.class];
            statistics.record_hop(&class.channel, &class.name);
            trace!(
                step,
                origin = process.origin,
                destination = process.destination,
                class = %class.name,
                dt,
                "Hop accepted."
            );

            interval_time += dt;
            interval_displacement += process.displacement;
            if (step + 1) % config.step_interval == 0 {
                builder.push_interval(interval_time, interval_displacement);
                statistics.total_time += interval_time;
                interval_time = 0.0;
                interval_displacement = Vector3::zeros();
            }
        }
        statistics.steps = config.kmc_steps;

        let trajectory = builder.seal(species);
        debug!(
            checkpoints = trajectory.len(),
            hops = statistics.total_hops(),
            time = statistics.total_time,
            "KMC run finished."
        );
        Ok(KmcOutcome {
            trajectory,
            statistics,
            final_occupancy: occupancy,
        })
    }

    fn charge_tracker(&self, occupancy: &Occupancy) -> Result<Option<ChargeTracker<'a>>, EngineError> {
        let Some(settings) = self.context.config.electrostatics else {
            return Ok(None);
        };
        let system = self.context.system;
        let material = self.context.material;
        let electrostatics = Electrostatics::new(&system.neighbors, settings.dielectric_constant)
            .ok_or_else(|| {
                EngineError::Initialization(
                    "electrostatics require an 'E' neighbor cutoff in the material".to_string(),
                )
            })?;
        let configurator = ChargeConfigurator::new(
            &system.lattice,
            &system.neighbors,
            &material.shell_charges,
        )?;
        let charges = configurator.configure(occupancy)?;
        Ok(Some(ChargeTracker {
            configurator,
            electrostatics,
            charges,
        }))
    }

    #[inline]
    fn rate(&self, process: &HoppingProcess, tracker: Option<&ChargeTracker<'_>>) -> f64 {
        let Some(tracker) = tracker else {
            return self.class_rates[process.class];
        };
        let config = self.context.config;
        let class = &self.context.system.catalog.classes()[process.class];
        let delta_g0 = tracker.electrostatics.delta_g0(
            &tracker.charges,
            process.carrier_charge,
            process.origin,
            process.destination,
        );
        let vab = config.coupling_correction.then_some(class.vab);
        marcus_rate(
            self.context.material.hopping.attempt_frequency,
            marcus_activation(class.lambda, delta_g0, vab),
            config.temperature,
        )
    }
}
