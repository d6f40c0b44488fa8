use super::charges::ChargeConfig;
use super::potentials::coulomb;
use crate::core::neighbors::index::NeighborIndex;
use crate::core::neighbors::shell::NeighborShell;

/// Electrostatic free-energy differences of hops, evaluated over the `E` neighbor shell.
#[derive(Debug, Clone, Copy)]
pub struct Electrostatics<'a> {
    shell: &'a NeighborShell,
    dielectric: f64,
}

impl<'a> Electrostatics<'a> {
    /// Returns `None` when the index has no electrostatic shell.
    pub fn new(neighbors: &'a NeighborIndex, dielectric: f64) -> Option<Self> {
        neighbors
            .electrostatic()
            .map(|shell| Self { shell, dielectric })
    }

    /// Potential (energy per unit test charge, in eV/e) at `sei` due to the charges of its
    /// electrostatic neighbors, skipping the sites in `exclude`.
    pub fn site_potential(&self, charges: &ChargeConfig, sei: usize, exclude: &[usize]) -> f64 {
        self.shell.center(sei).map_or(0.0, |center| {
            center
                .neighbors
                .iter()
                .filter(|n| !exclude.contains(&n.sei))
                .map(|n| coulomb(n.distance, 1.0, charges[n.sei], self.dielectric))
                .sum()
        })
    }

    /// `ΔG0` of moving a carrier of charge `carrier_charge` from `origin` to `destination`.
    pub fn delta_g0(
        &self,
        charges: &ChargeConfig,
        carrier_charge: f64,
        origin: usize,
        destination: usize,
    ) -> f64 {
        let exclude = [origin, destination];
        carrier_charge
            * (self.site_potential(charges, destination, &exclude)
                - self.site_potential(charges, origin, &exclude))
    }
}
