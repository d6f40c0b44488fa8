use super::index::NeighborError;
use super::key::ShellKey;
use crate::core::models::ids::QuantumIndex;
use crate::core::models::lattice::{LatticeModel, Site};
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One neighbor of a center site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub sei: usize,
    pub element_type: usize,
    pub element: usize,
    /// Neighbor unit cell minus center unit cell, for the periodic image actually used.
    pub cell_offset: [i64; 3],
    /// Cartesian vector from the center to the neighbor, in Ångström.
    pub displacement: Vector3<f64>,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CenterNeighbors {
    pub center: usize,
    pub neighbors: Vec<Neighbor>,
}

/// Which pair distances a shell accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceWindow {
    /// `(cutoff - tolerance, cutoff + tolerance]`
    Band { cutoff: f64, tolerance: f64 },
    /// `(0, cutoff]`
    Sphere { cutoff: f64 },
}

impl DistanceWindow {
    #[inline]
    pub fn contains(&self, distance: f64) -> bool {
        match *self {
            Self::Band { cutoff, tolerance } => {
                distance > cutoff - tolerance && distance <= cutoff + tolerance
            }
            Self::Sphere { cutoff } => distance > 0.0 && distance <= cutoff,
        }
    }

    pub fn cutoff(&self) -> f64 {
        match *self {
            Self::Band { cutoff, .. } | Self::Sphere { cutoff } => cutoff,
        }
    }

    /// Largest distance the window accepts.
    pub fn reach(&self) -> f64 {
        match *self {
            Self::Band { cutoff, tolerance } => cutoff + tolerance,
            Self::Sphere { cutoff } => cutoff,
        }
    }
}

/// Neighbor lists of one shell, computed once for a fixed set of center sites.
#[derive(Debug, Clone)]
pub struct NeighborShell {
    pub key: ShellKey,
    pub window: DistanceWindow,
    /// Unit cell the centers were taken from. `None` when every center-type site was scanned,
    /// either because the key is electrostatic or because no cell of the supercell sees the
    /// whole shell without crossing an open boundary.
    pub reference_cell: Option<[usize; 3]>,
    centers: Vec<CenterNeighbors>,
    lookup: HashMap<usize, usize>,
}

impl NeighborShell {
    pub(crate) fn compute(lattice: &LatticeModel, key: ShellKey, window: DistanceWindow) -> Self {
        let (center_sites, reference_cell): (Vec<&Site>, Option<[usize; 3]>) = match key {
            ShellKey::Pair { center, .. } => match template_cell(lattice, &window) {
                Some(cell) => (
                    lattice
                        .sites_of_type(center)
                        .filter(|site| site.quantum_index.cell == cell)
                        .collect(),
                    Some(cell),
                ),
                None => {
                    debug!(
                        shell = %key,
                        size = ?lattice.size(),
                        "Supercell too small for a reference cell; scanning every center."
                    );
                    (lattice.sites_of_type(center).collect(), None)
                }
            },
            ShellKey::Electrostatic => (lattice.sites().iter().collect(), None),
        };
        let candidates: Vec<&Site> = match key.neighbor_type() {
            Some(neighbor) => lattice.sites_of_type(neighbor).collect(),
            None => lattice.sites().iter().collect(),
        };

        #[cfg(not(feature = "parallel"))]
        let iterator = center_sites.iter();

        #[cfg(feature = "parallel")]
        let iterator = center_sites.par_iter();

        let centers: Vec<CenterNeighbors> = iterator
            .map(|center| CenterNeighbors {
                center: center.sei,
                neighbors: scan_center(lattice, center, &candidates, &window),
            })
            .collect();

        trace!(
            shell = %key,
            cutoff = window.cutoff(),
            centers = centers.len(),
            "Computed neighbor shell."
        );

        let lookup = centers
            .iter()
            .enumerate()
            .map(|(i, c)| (c.center, i))
            .collect();
        Self {
            key,
            window,
            reference_cell,
            centers,
            lookup,
        }
    }

    pub fn centers(&self) -> &[CenterNeighbors] {
        &self.centers
    }

    /// Neighbor list of a center site, if `sei` is one of this shell's centers.
    pub fn center(&self, sei: usize) -> Option<&CenterNeighbors> {
        self.lookup.get(&sei).map(|&i| &self.centers[i])
    }

    /// Neighbors of any site, rebuilt from the reference-cell list by unit-cell offsets.
    ///
    /// Sites whose type is not this shell's center type have no neighbors. Offsets that leave
    /// the supercell along a non-periodic axis are dropped. Without a reference cell the
    /// scanned list of the site itself is returned.
    pub fn neighbors_of(
        &self,
        lattice: &LatticeModel,
        sei: usize,
    ) -> Result<Vec<Neighbor>, NeighborError> {
        let site = lattice.site(sei).ok_or(NeighborError::InvalidSite(sei))?;
        let reference_cell = match self.reference_cell {
            Some(cell) => cell,
            None => {
                return Ok(self
                    .center(sei)
                    .map(|c| c.neighbors.clone())
                    .unwrap_or_default());
            }
        };
        if self.key.center_type() != Some(site.element_type()) {
            return Ok(Vec::new());
        }

        let reference = QuantumIndex {
            cell: reference_cell,
            ..site.quantum_index
        };
        let reference_sei = lattice.quantum_index_to_sei(&reference)?;
        let Some(template) = self.center(reference_sei) else {
            return Ok(Vec::new());
        };

        let cell = site.quantum_index.cell;
        Ok(template
            .neighbors
            .iter()
            .filter_map(|n| {
                lattice
                    .translate(cell, n.cell_offset, n.element_type, n.element)
                    .map(|target| Neighbor { sei: target, ..*n })
            })
            .collect())
    }

    pub fn cutoff(&self) -> f64 {
        self.window.cutoff()
    }

    pub fn total_pairs(&self) -> usize {
        self.centers.iter().map(|c| c.neighbors.len()).sum()
    }
}

/// Cell whose centers see every neighbor of the shell without leaving the supercell along an
/// open axis, so that their lists can be replayed onto any other cell.
fn template_cell(lattice: &LatticeModel, window: &DistanceWindow) -> Option<[usize; 3]> {
    let preferred = lattice.reference_cell();
    let span = lattice.max_cell_offset(window.reach());
    let size = lattice.size();
    let mut cell = preferred;
    for axis in 0..3 {
        if lattice.periodicity().is_periodic(axis) {
            continue;
        }
        let c = preferred[axis].max(span[axis]);
        if c + span[axis] >= size[axis] {
            return None;
        }
        cell[axis] = c;
    }
    Some(cell)
}

/// Every neighbor of `center` among `candidates`, one entry per periodic image in the window.
///
/// On a periodic axis shorter than twice the cutoff a candidate can appear more than once,
/// each time with its own displacement and cell offset.
fn scan_center(
    lattice: &LatticeModel,
    center: &Site,
    candidates: &[&Site],
    window: &DistanceWindow,
) -> Vec<Neighbor> {
    let center_cell = center.quantum_index.cell;
    candidates
        .iter()
        .filter(|candidate| candidate.sei != center.sei)
        .flat_map(|candidate| {
            let raw = candidate.position - center.position;
            let cell = candidate.quantum_index.cell;
            lattice
                .periodic_images(&raw, window.reach())
                .into_iter()
                .filter_map(move |(displacement, shift)| {
                    let distance = displacement.norm();
                    if !window.contains(distance) {
                        return None;
                    }
                    let cell_offset: [i64; 3] = std::array::from_fn(|axis| {
                        cell[axis] as i64 - center_cell[axis] as i64 + shift[axis]
                    });
                    Some(Neighbor {
                        sei: candidate.sei,
                        element_type: candidate.element_type(),
                        element: candidate.quantum_index.element,
                        cell_offset,
                        displacement,
                        distance,
                    })
                })
        })
        .collect()
}
