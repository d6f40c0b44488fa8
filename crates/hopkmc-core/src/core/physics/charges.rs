use crate::core::models::lattice::LatticeModel;
use crate::core::models::occupancy::Occupancy;
use crate::core::neighbors::index::{NeighborError, NeighborIndex};
use crate::core::neighbors::shell::NeighborShell;
use std::collections::{BTreeMap, HashMap};
use std::ops::Index;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{trace, warn};

/// Dense per-site charges in units of e, indexed by SEI.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChargeConfig(Vec<f64>);

impl ChargeConfig {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, sei: usize) -> Option<f64> {
        self.0.get(sei).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl From<Vec<f64>> for ChargeConfig {
    fn from(charges: Vec<f64>) -> Self {
        Self(charges)
    }
}

impl Index<usize> for ChargeConfig {
    type Output = f64;

    fn index(&self, sei: usize) -> &f64 {
        &self.0[sei]
    }
}

#[derive(Debug)]
struct ShellChargeRule<'a> {
    key: &'a str,
    center_type: usize,
    overrides: Vec<(&'a NeighborShell, f64)>,
}

/// Derives a [`ChargeConfig`] from an occupancy.
///
/// Starting from the bare-lattice charges, each shell-charge rule `"A:B" = [q1, q2, ...]`
/// sets every B site within shell *k* of an occupied A site to `qk`, and each occupied site
/// then carries its carrier's charge on top of its own.
#[derive(Debug)]
pub struct ChargeConfigurator<'a> {
    lattice: &'a LatticeModel,
    base: ChargeConfig,
    rules: Vec<ShellChargeRule<'a>>,
    conflict_reported: AtomicBool,
}

impl<'a> ChargeConfigurator<'a> {
    pub fn new(
        lattice: &'a LatticeModel,
        neighbors: &'a NeighborIndex,
        shell_charges: &'a BTreeMap<String, Vec<f64>>,
    ) -> Result<Self, NeighborError> {
        let mut rules = Vec::with_capacity(shell_charges.len());
        for (key, charges) in shell_charges {
            let overrides = charges
                .iter()
                .enumerate()
                .map(|(shell, &charge)| Ok((neighbors.shell(key, shell)?, charge)))
                .collect::<Result<Vec<_>, NeighborError>>()?;
            let Some(center_type) = overrides.first().and_then(|(s, _)| s.key.center_type())
            else {
                warn!(key = %key, "Shell-charge rule has no pair shell to act on; ignoring it.");
                continue;
            };
            rules.push(ShellChargeRule {
                key,
                center_type,
                overrides,
            });
        }
        Ok(Self {
            lattice,
            base: lattice.base_charges(),
            rules,
            conflict_reported: AtomicBool::new(false),
        })
    }

    pub fn configure(&self, occupancy: &Occupancy) -> Result<ChargeConfig, NeighborError> {
        let mut charges = self.base.0.clone();
        let mut assigned: HashMap<usize, f64> = HashMap::new();
        let mut conflicts = 0usize;

        for rule in &self.rules {
            for (sei, _) in occupancy.iter() {
                let site = self
                    .lattice
                    .site(sei)
                    .ok_or(NeighborError::InvalidSite(sei))?;
                if site.element_type() != rule.center_type {
                    continue;
                }
                for &(shell, charge) in &rule.overrides {
                    for neighbor in shell.neighbors_of(self.lattice, sei)? {
                        if let Some(previous) = assigned.insert(neighbor.sei, charge) {
                            if previous != charge {
                                conflicts += 1;
                                trace!(
                                    rule = rule.key,
                                    sei = neighbor.sei,
                                    previous,
                                    charge,
                                    "Conflicting shell-charge override."
                                );
                            }
                        }
                        charges[neighbor.sei] = charge;
                    }
                }
            }
        }

        for (sei, species) in occupancy.iter() {
            charges[sei] += species.charge;
        }

        if conflicts > 0 && !self.conflict_reported.swap(true, Ordering::Relaxed) {
            warn!(
                conflicts,
                "Sites received different shell-charge overrides; the last rule applied wins."
            );
        }
        Ok(ChargeConfig(charges))
    }

    pub fn base_charges(&self) -> &ChargeConfig {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::{Periodicity, QuantumIndex};
    use crate::core::models::material::{Material, test_materials};

    fn setup(size: [usize; 3]) -> (Material, LatticeModel, NeighborIndex) {
        let material = test_materials::binary_cubic();
        let lattice = LatticeModel::new(&material, size, Periodicity::none()).unwrap();
        let neighbors = NeighborIndex::build(&lattice, &material.neighbors, ":").unwrap();
        (material, lattice, neighbors)
    }

    #[test]
    fn empty_occupancy_yields_base_charges() {
        let (material, lattice, neighbors) = setup([2, 2, 2]);
        let configurator =
            ChargeConfigurator::new(&lattice, &neighbors, &material.shell_charges).unwrap();
        let occupancy = Occupancy::new(&material, &lattice).unwrap();
        assert_eq!(
            configurator.configure(&occupancy).unwrap(),
            lattice.base_charges()
        );
    }

    #[test]
    fn occupied_center_overrides_its_shell_and_carries_species_charge() {
        let (material, lattice, neighbors) = setup([3, 3, 3]);
        let configurator =
            ChargeConfigurator::new(&lattice, &neighbors, &material.shell_charges).unwrap();
        let mut occupancy = Occupancy::new(&material, &lattice).unwrap();
        let center = lattice
            .quantum_index_to_sei(&QuantumIndex::new([1, 1, 1], 0, 0))
            .unwrap();
        occupancy.insert(&lattice, 0, center).unwrap();

        let charges = configurator.configure(&occupancy).unwrap();
        let shell = neighbors.shells("M:X").unwrap()[0].center(center).unwrap();
        assert_eq!(shell.neighbors.len(), 2);
        for neighbor in &shell.neighbors {
            assert_eq!(charges[neighbor.sei], -1.5);
        }
        assert_eq!(charges[center], 2.0 - 1.0);

        let changed = charges
            .as_slice()
            .iter()
            .zip(lattice.base_charges().as_slice())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(changed, 3);
    }

    #[test]
    fn configure_is_idempotent_and_independent_of_insertion_order() {
        let (material, lattice, neighbors) = setup([3, 3, 3]);
        let configurator =
            ChargeConfigurator::new(&lattice, &neighbors, &material.shell_charges).unwrap();
        let sites = [0usize, 4, 13, 40, 41];

        let mut forward = Occupancy::new(&material, &lattice).unwrap();
        for &sei in &sites {
            forward.insert(&lattice, 0, sei).unwrap();
        }
        let mut backward = Occupancy::new(&material, &lattice).unwrap();
        for &sei in sites.iter().rev() {
            backward.insert(&lattice, 0, sei).unwrap();
        }

        let first = configurator.configure(&forward).unwrap();
        let second = configurator.configure(&forward).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, configurator.configure(&backward).unwrap());
    }

    #[test]
    fn rule_referencing_missing_shell_is_rejected() {
        let (_, lattice, neighbors) = setup([1, 1, 1]);
        let rules = BTreeMap::from([("X:X".to_string(), vec![-1.0])]);
        assert!(matches!(
            ChargeConfigurator::new(&lattice, &neighbors, &rules),
            Err(NeighborError::UnknownShell { .. })
        ));
    }
}
