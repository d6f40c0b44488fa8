use crate::core::models::lattice::LatticeModel;
use crate::core::models::material::Material;
use crate::core::models::occupancy::Occupancy;
use crate::core::neighbors::index::{NeighborError, NeighborIndex};
use nalgebra::Vector3;
use tracing::debug;

/// One geometric hop type: a shell of a hopping channel with its Marcus parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RateClass {
    pub channel: String,
    pub name: String,
    pub shell: usize,
    pub lambda: f64,
    pub vab: f64,
}

/// A potential hop out of a site, valid whenever the destination is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopCandidate {
    pub destination: usize,
    pub displacement: Vector3<f64>,
    pub class: usize,
}

/// A hop available in the current occupancy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoppingProcess {
    pub origin: usize,
    pub destination: usize,
    pub class: usize,
    pub displacement: Vector3<f64>,
    /// Charge of the hopping carrier, in e.
    pub carrier_charge: f64,
}

/// Every hop candidate of every site, resolved once from the channel shells.
#[derive(Debug, Clone)]
pub struct ProcessCatalog {
    classes: Vec<RateClass>,
    per_site: Vec<Vec<HopCandidate>>,
}

impl ProcessCatalog {
    pub fn build(
        material: &Material,
        lattice: &LatticeModel,
        neighbors: &NeighborIndex,
    ) -> Result<Self, NeighborError> {
        let mut classes = Vec::new();
        let mut per_site = vec![Vec::new(); lattice.total_sites()];

        for channel in &material.hopping.channels {
            for (shell_index, params) in channel.classes.iter().enumerate() {
                let shell = neighbors.shell(&channel.key, shell_index)?;
                let center_type = shell
                    .key
                    .center_type()
                    .ok_or_else(|| NeighborError::UnknownElementType(channel.key.clone()))?;
                let class = classes.len();
                classes.push(RateClass {
                    channel: channel.key.clone(),
                    name: params.name.clone(),
                    shell: shell_index,
                    lambda: params.lambda,
                    vab: params.vab,
                });
                for site in lattice.sites_of_type(center_type) {
                    for neighbor in shell.neighbors_of(lattice, site.sei)? {
                        per_site[site.sei].push(HopCandidate {
                            destination: neighbor.sei,
                            displacement: neighbor.displacement,
                            class,
                        });
                    }
                }
            }
        }

        debug!(
            classes = classes.len(),
            candidates = per_site.iter().map(Vec::len).sum::<usize>(),
            "Built hop catalog."
        );
        Ok(Self { classes, per_site })
    }

    pub fn classes(&self) -> &[RateClass] {
        &self.classes
    }

    pub fn candidates(&self, sei: usize) -> &[HopCandidate] {
        self.per_site.get(sei).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fills `out` with the hops available in `occupancy`, in carrier order (species, then
    /// ascending SEI) and catalog order within a carrier.
    pub fn enumerate(
        &self,
        lattice: &LatticeModel,
        occupancy: &Occupancy,
        out: &mut Vec<HoppingProcess>,
    ) {
        out.clear();
        for (origin, species) in occupancy.iter() {
            for candidate in self.candidates(origin) {
                if occupancy.is_occupied(candidate.destination) {
                    continue;
                }
                let allowed = lattice
                    .site(candidate.destination)
                    .is_some_and(|site| species.allowed_types.contains(&site.element_type()));
                if !allowed {
                    continue;
                }
                out.push(HoppingProcess {
                    origin,
                    destination: candidate.destination,
                    class: candidate.class,
                    displacement: candidate.displacement,
                    carrier_charge: species.charge,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::{Periodicity, QuantumIndex};
    use crate::core::models::material::test_materials;

    fn setup() -> (Material, LatticeModel, ProcessCatalog) {
        setup_with([3, 3, 3], Periodicity::none())
    }

    fn setup_with(
        size: [usize; 3],
        periodicity: Periodicity,
    ) -> (Material, LatticeModel, ProcessCatalog) {
        let material = test_materials::binary_cubic();
        let lattice = LatticeModel::new(&material, size, periodicity).unwrap();
        let neighbors = NeighborIndex::build(&lattice, &material.neighbors, ":").unwrap();
        let catalog = ProcessCatalog::build(&material, &lattice, &neighbors).unwrap();
        (material, lattice, catalog)
    }

    #[test]
    fn catalog_has_one_class_per_channel_shell() {
        let (_, _, catalog) = setup();
        let names: Vec<&str> = catalog.classes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c-direction", "basal"]);
        assert_eq!(catalog.classes()[1].shell, 1);
    }

    #[test]
    fn central_carrier_sees_every_empty_neighbor() {
        let (material, lattice, catalog) = setup();
        let center = lattice
            .quantum_index_to_sei(&QuantumIndex::new([1, 1, 1], 0, 0))
            .unwrap();
        let mut occupancy = Occupancy::new(&material, &lattice).unwrap();
        occupancy.insert(&lattice, 0, center).unwrap();

        let mut processes = Vec::new();
        catalog.enumerate(&lattice, &occupancy, &mut processes);
        assert_eq!(processes.len(), 8);
        assert_eq!(processes.iter().filter(|p| p.class == 0).count(), 2);
        assert!(processes.iter().all(|p| p.origin == center));
        assert!(processes.iter().all(|p| p.carrier_charge == -1.0));

        let blocked = processes[0].destination;
        occupancy.insert(&lattice, 0, blocked).unwrap();
        catalog.enumerate(&lattice, &occupancy, &mut processes);
        assert!(processes.iter().all(|p| p.destination != blocked));
        assert!(processes.iter().all(|p| p.destination != center));
    }

    #[test]
    fn species_without_channel_has_no_processes() {
        let (material, lattice, catalog) = setup();
        let mut occupancy = Occupancy::new(&material, &lattice).unwrap();
        let hole = occupancy.species_index("hole").unwrap();
        occupancy.insert(&lattice, hole, 2).unwrap();
        let mut processes = vec![];
        catalog.enumerate(&lattice, &occupancy, &mut processes);
        assert!(processes.is_empty());
    }

    #[test]
    fn periodic_two_cell_lattice_offers_opposite_hops() {
        let (material, lattice, catalog) = setup_with([2, 2, 2], Periodicity::all());
        let carrier = lattice
            .quantum_index_to_sei(&QuantumIndex::new([0, 0, 0], 0, 0))
            .unwrap();
        let mut occupancy = Occupancy::new(&material, &lattice).unwrap();
        occupancy.insert(&lattice, 0, carrier).unwrap();

        let mut processes = Vec::new();
        catalog.enumerate(&lattice, &occupancy, &mut processes);
        assert_eq!(processes.len(), 8);
        assert_eq!(processes.iter().filter(|p| p.class == 0).count(), 2);
        let drift: Vector3<f64> = processes.iter().map(|p| p.displacement).sum();
        assert!(drift.norm() < 1e-9);
        for process in &processes {
            assert!(processes.iter().any(|other| {
                (other.displacement + process.displacement).norm() < 1e-9
            }));
        }
    }

    #[test]
    fn open_two_cell_lattice_enumerates_hops_for_every_center() {
        let (material, lattice, catalog) = setup_with([2, 2, 2], Periodicity::none());
        for site in lattice.sites_of_type(0) {
            let mut occupancy = Occupancy::new(&material, &lattice).unwrap();
            occupancy.insert(&lattice, 0, site.sei).unwrap();
            let mut processes = Vec::new();
            catalog.enumerate(&lattice, &occupancy, &mut processes);
            let stacked = lattice
                .sites_of_type(0)
                .filter(|other| ((other.position - site.position).norm() - 2.0).abs() < 0.01)
                .count();
            assert!(stacked >= 1);
            assert_eq!(processes.iter().filter(|p| p.class == 0).count(), stacked);
            // One basal partner along each axis.
            assert_eq!(processes.iter().filter(|p| p.class == 1).count(), 3);
        }
    }
}
