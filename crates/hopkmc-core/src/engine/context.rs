use super::config::{InitialOccupancy, SimulationConfig, SiteSpec};
use super::error::EngineError;
use super::process::ProcessCatalog;
use super::progress::ProgressReporter;
use crate::core::models::lattice::LatticeModel;
use crate::core::models::material::Material;
use crate::core::models::occupancy::Occupancy;
use crate::core::neighbors::index::NeighborIndex;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

/// Read-only structures shared by every trajectory of a simulation.
#[derive(Debug)]
pub struct SimulationSystem {
    pub lattice: LatticeModel,
    pub neighbors: NeighborIndex,
    pub catalog: ProcessCatalog,
}

impl SimulationSystem {
    pub fn build(material: &Material, config: &SimulationConfig) -> Result<Self, EngineError> {
        let lattice = LatticeModel::new(material, config.system_size, config.periodicity)?;
        let neighbors = NeighborIndex::build(
            &lattice,
            &material.neighbors,
            &material.element_type_delimiter,
        )?;
        let catalog = ProcessCatalog::build(material, &lattice, &neighbors)?;
        info!(
            sites = lattice.total_sites(),
            cells = lattice.num_cells(),
            rate_classes = catalog.classes().len(),
            "Lattice and neighbor shells ready."
        );
        Ok(Self {
            lattice,
            neighbors,
            catalog,
        })
    }
}

#[derive(Clone, Copy)]
pub struct SimulationContext<'a> {
    pub material: &'a Material,
    pub system: &'a SimulationSystem,
    pub config: &'a SimulationConfig,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(
        material: &'a Material,
        system: &'a SimulationSystem,
        config: &'a SimulationConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            material,
            system,
            config,
            reporter,
        }
    }

    /// Builds the starting occupancy of one run, drawing random placements from `rng`.
    pub fn initial_occupancy(&self, rng: &mut impl Rng) -> Result<Occupancy, EngineError> {
        let lattice = &self.system.lattice;
        let mut occupancy = Occupancy::new(self.material, lattice)?;
        match &self.config.initial_occupancy {
            InitialOccupancy::Sites(placements) => {
                for (name, site) in placements {
                    let species = occupancy.species_index(name)?;
                    let sei = match site {
                        SiteSpec::Sei(sei) => *sei,
                        SiteSpec::Quantum(index) => lattice.quantum_index_to_sei(index)?,
                    };
                    occupancy.insert(lattice, species, sei)?;
                }
            }
            InitialOccupancy::Random(counts) => {
                for (name, &count) in counts {
                    let species = occupancy.species_index(name)?;
                    let allowed = &occupancy.species()[species].allowed_types;
                    let free: Vec<usize> = lattice
                        .sites()
                        .iter()
                        .filter(|site| allowed.contains(&site.element_type()))
                        .map(|site| site.sei)
                        .filter(|&sei| !occupancy.is_occupied(sei))
                        .collect();
                    if count > free.len() {
                        return Err(EngineError::Initialization(format!(
                            "cannot place {count} '{name}' carriers on {} free sites",
                            free.len()
                        )));
                    }
                    let chosen: Vec<usize> = free.choose_multiple(rng, count).copied().collect();
                    for sei in chosen {
                        occupancy.insert(lattice, species, sei)?;
                    }
                }
            }
        }
        if occupancy.is_empty() {
            return Err(EngineError::Initialization(
                "initial occupancy places no carriers".to_string(),
            ));
        }
        Ok(occupancy)
    }
}
