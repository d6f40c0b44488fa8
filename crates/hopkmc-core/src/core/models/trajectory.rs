use nalgebra::Vector3;

/// Cumulative state of a trajectory at one recording point.
///
/// `time` is the total elapsed simulated time in seconds and `displacement` the summed vector
/// displacement of all carriers, both measured from the start of the trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub time: f64,
    pub displacement: Vector3<f64>,
}

/// A sealed sequence of checkpoints produced by one KMC run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trajectory {
    checkpoints: Vec<Checkpoint>,
    species: Vec<String>,
}

impl Trajectory {
    pub fn from_checkpoints(checkpoints: Vec<Checkpoint>, species: Vec<String>) -> Self {
        Self {
            checkpoints,
            species,
        }
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    /// Names of the carrier species that moved during the run.
    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn final_time(&self) -> Option<f64> {
        self.checkpoints.last().map(|c| c.time)
    }
}

/// Accumulates interval sums into running totals while a run is in progress.
#[derive(Debug, Default)]
pub(crate) struct TrajectoryBuilder {
    checkpoints: Vec<Checkpoint>,
    time: f64,
    displacement: Vector3<f64>,
}

impl TrajectoryBuilder {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            checkpoints: Vec::with_capacity(capacity),
            time: 0.0,
            displacement: Vector3::zeros(),
        }
    }

    pub(crate) fn push_interval(&mut self, time: f64, displacement: Vector3<f64>) {
        self.time += time;
        self.displacement += displacement;
        self.checkpoints.push(Checkpoint {
            time: self.time,
            displacement: self.displacement,
        });
    }

    pub(crate) fn seal(self, species: Vec<String>) -> Trajectory {
        Trajectory::from_checkpoints(self.checkpoints, species)
    }
}
