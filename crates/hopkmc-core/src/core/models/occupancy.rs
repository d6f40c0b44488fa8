use super::lattice::LatticeModel;
use super::material::Material;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OccupancyError {
    #[error("Site {sei} is already occupied by a '{species}' carrier")]
    SiteOccupied { sei: usize, species: String },
    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("Site {sei} is outside the lattice ({total} sites)")]
    SiteOutOfRange { sei: usize, total: usize },
    #[error("Site {0} holds no carrier")]
    SiteNotOccupied(usize),
    #[error("Species '{species}' cannot occupy site {sei} of element type '{element}'")]
    IncompatibleSite {
        species: String,
        sei: usize,
        element: String,
    },
}

/// A carrier species resolved against a concrete lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub charge: f64,
    /// Element-type indices the species may occupy.
    pub allowed_types: BTreeSet<usize>,
}

/// Which sites hold which carrier species.
///
/// Every site holds at most one carrier. Carriers are tracked per species as sorted SEI sets
/// so iteration order is deterministic for a given history.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupancy {
    species: Vec<Species>,
    carriers: Vec<BTreeSet<usize>>,
    owners: HashMap<usize, usize>,
    total_sites: usize,
}

impl Occupancy {
    pub fn new(material: &Material, lattice: &LatticeModel) -> Result<Self, OccupancyError> {
        let species = material
            .species
            .iter()
            .map(|def| {
                let allowed_types = def
                    .elements
                    .iter()
                    .map(|name| {
                        lattice
                            .element_type_index(name)
                            .map_err(|_| OccupancyError::UnknownSpecies(def.name.clone()))
                    })
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(Species {
                    name: def.name.clone(),
                    charge: def.charge,
                    allowed_types,
                })
            })
            .collect::<Result<Vec<_>, OccupancyError>>()?;
        Ok(Self::with_species(species, lattice.total_sites()))
    }

    pub fn with_species(species: Vec<Species>, total_sites: usize) -> Self {
        let carriers = vec![BTreeSet::new(); species.len()];
        Self {
            species,
            carriers,
            owners: HashMap::new(),
            total_sites,
        }
    }

    pub fn species_index(&self, name: &str) -> Result<usize, OccupancyError> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| OccupancyError::UnknownSpecies(name.to_string()))
    }

    /// Places a carrier of species `species` on site `sei`.
    pub fn insert(
        &mut self,
        lattice: &LatticeModel,
        species: usize,
        sei: usize,
    ) -> Result<(), OccupancyError> {
        let site = lattice.site(sei).ok_or(OccupancyError::SiteOutOfRange {
            sei,
            total: self.total_sites,
        })?;
        let def = self
            .species
            .get(species)
            .ok_or_else(|| OccupancyError::UnknownSpecies(species.to_string()))?;
        if !def.allowed_types.contains(&site.element_type()) {
            return Err(OccupancyError::IncompatibleSite {
                species: def.name.clone(),
                sei,
                element: lattice.element_types()[site.element_type()].name.clone(),
            });
        }
        if let Some(&owner) = self.owners.get(&sei) {
            return Err(OccupancyError::SiteOccupied {
                sei,
                species: self.species[owner].name.clone(),
            });
        }
        self.carriers[species].insert(sei);
        self.owners.insert(sei, species);
        Ok(())
    }

    /// Moves the carrier at `from` to the empty site `to`, returning its species index.
    pub fn move_carrier(&mut self, from: usize, to: usize) -> Result<usize, OccupancyError> {
        if to >= self.total_sites {
            return Err(OccupancyError::SiteOutOfRange {
                sei: to,
                total: self.total_sites,
            });
        }
        if let Some(&owner) = self.owners.get(&to) {
            return Err(OccupancyError::SiteOccupied {
                sei: to,
                species: self.species[owner].name.clone(),
            });
        }
        let species = self
            .owners
            .remove(&from)
            .ok_or(OccupancyError::SiteNotOccupied(from))?;
        self.carriers[species].remove(&from);
        self.carriers[species].insert(to);
        self.owners.insert(to, species);
        Ok(species)
    }

    #[inline]
    pub fn is_occupied(&self, sei: usize) -> bool {
        self.owners.contains_key(&sei)
    }

    pub fn species_at(&self, sei: usize) -> Option<&Species> {
        self.owners.get(&sei).map(|&index| &self.species[index])
    }

    pub fn sites_of(&self, species: usize) -> impl Iterator<Item = usize> + '_ {
        self.carriers
            .get(species)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All occupied sites in species order, then ascending SEI.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Species)> + '_ {
        self.carriers
            .iter()
            .zip(self.species.iter())
            .flat_map(|(set, species)| set.iter().map(move |&sei| (sei, species)))
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn carrier_count(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn total_sites(&self) -> usize {
        self.total_sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::Periodicity;
    use crate::core::models::material::test_materials;

    fn setup() -> (LatticeModel, Occupancy) {
        let material = test_materials::binary_cubic();
        let lattice = LatticeModel::new(&material, [2, 2, 2], Periodicity::none()).unwrap();
        let occupancy = Occupancy::new(&material, &lattice).unwrap();
        (lattice, occupancy)
    }

    #[test]
    fn insert_places_carrier_on_compatible_site() {
        let (lattice, mut occupancy) = setup();
        let electron = occupancy.species_index("electron").unwrap();
        occupancy.insert(&lattice, electron, 0).unwrap();
        assert!(occupancy.is_occupied(0));
        assert_eq!(occupancy.species_at(0).unwrap().name, "electron");
        assert_eq!(occupancy.sites_of(electron).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn insert_rejects_double_occupation() {
        let (lattice, mut occupancy) = setup();
        occupancy.insert(&lattice, 0, 1).unwrap();
        assert_eq!(
            occupancy.insert(&lattice, 0, 1),
            Err(OccupancyError::SiteOccupied {
                sei: 1,
                species: "electron".to_string()
            })
        );
    }

    #[test]
    fn insert_rejects_incompatible_element_type() {
        let (lattice, mut occupancy) = setup();
        let hole = occupancy.species_index("hole").unwrap();
        assert!(matches!(
            occupancy.insert(&lattice, hole, 0),
            Err(OccupancyError::IncompatibleSite { .. })
        ));
        occupancy.insert(&lattice, hole, 2).unwrap();
    }

    #[test]
    fn insert_rejects_out_of_range_site() {
        let (lattice, mut occupancy) = setup();
        assert_eq!(
            occupancy.insert(&lattice, 0, 32),
            Err(OccupancyError::SiteOutOfRange { sei: 32, total: 32 })
        );
    }

    #[test]
    fn move_carrier_updates_both_sites() {
        let (lattice, mut occupancy) = setup();
        occupancy.insert(&lattice, 0, 0).unwrap();
        assert_eq!(occupancy.move_carrier(0, 1), Ok(0));
        assert!(!occupancy.is_occupied(0));
        assert!(occupancy.is_occupied(1));
        assert_eq!(occupancy.carrier_count(), 1);
    }

    #[test]
    fn move_carrier_rejects_occupied_destination_and_empty_origin() {
        let (lattice, mut occupancy) = setup();
        occupancy.insert(&lattice, 0, 0).unwrap();
        occupancy.insert(&lattice, 0, 1).unwrap();
        assert!(matches!(
            occupancy.move_carrier(0, 1),
            Err(OccupancyError::SiteOccupied { .. })
        ));
        assert_eq!(
            occupancy.move_carrier(4, 5),
            Err(OccupancyError::SiteNotOccupied(4))
        );
    }

    #[test]
    fn iter_is_ordered_by_species_then_site() {
        let (lattice, mut occupancy) = setup();
        occupancy.insert(&lattice, 1, 6).unwrap();
        occupancy.insert(&lattice, 0, 5).unwrap();
        occupancy.insert(&lattice, 0, 0).unwrap();
        let order: Vec<(usize, &str)> = occupancy
            .iter()
            .map(|(sei, s)| (sei, s.name.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "electron"), (5, "electron"), (6, "hole")]);
    }
}
