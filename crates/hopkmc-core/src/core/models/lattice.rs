use super::ids::{Periodicity, QuantumIndex, SystemSize};
use super::material::{LatticeParameters, Material};
use crate::core::physics::charges::ChargeConfig;
use itertools::iproduct;
use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

/// Fractional margin, in cells, that keeps boundary images from being lost to rounding.
const IMAGE_SLACK: f64 = 1e-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LatticeError {
    #[error("Invalid system size {size:?}: every dimension must be greater than zero")]
    InvalidSize { size: SystemSize },
    #[error("Lattice parameters do not span a three-dimensional cell: {0}")]
    InvalidLatticeParameters(String),
    #[error("Unknown element type: '{0}'")]
    UnknownElementType(String),
    #[error("Quantum index {index} is outside the supercell")]
    InvalidQuantumIndex { index: QuantumIndex },
    #[error("Unit cell has no sites")]
    EmptyUnitCell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementType {
    pub name: String,
    pub index: usize,
    pub base_charge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCellSite {
    pub element_type: usize,
    pub fractional: Vector3<f64>,
}

/// A site of the supercell. Its position in [`LatticeModel::sites`] equals its SEI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub sei: usize,
    pub quantum_index: QuantumIndex,
    pub position: Point3<f64>,
}

impl Site {
    #[inline]
    pub fn element_type(&self) -> usize {
        self.quantum_index.element_type
    }
}

/// The authoritative, immutable site table of one supercell.
#[derive(Debug, Clone)]
pub struct LatticeModel {
    element_types: Vec<ElementType>,
    unit_cell: Vec<UnitCellSite>,
    n_elements: Vec<usize>,
    type_offsets: Vec<usize>,
    /// Lattice vectors as columns.
    basis: Matrix3<f64>,
    inverse_basis: Matrix3<f64>,
    size: SystemSize,
    periodicity: Periodicity,
    sites: Vec<Site>,
}

impl LatticeModel {
    pub fn new(
        material: &Material,
        size: SystemSize,
        periodicity: Periodicity,
    ) -> Result<Self, LatticeError> {
        let element_types = material
            .element_types
            .iter()
            .enumerate()
            .map(|(index, e)| ElementType {
                name: e.name.clone(),
                index,
                base_charge: e.charge,
            })
            .collect::<Vec<_>>();

        let unit_cell = material
            .unit_cell
            .iter()
            .map(|site| {
                let element_type = element_types
                    .iter()
                    .position(|e| e.name == site.element)
                    .ok_or_else(|| LatticeError::UnknownElementType(site.element.clone()))?;
                Ok(UnitCellSite {
                    element_type,
                    fractional: Vector3::from(site.position),
                })
            })
            .collect::<Result<Vec<_>, LatticeError>>()?;

        Self::from_unit_cell(element_types, unit_cell, &material.lattice, size, periodicity)
    }

    pub fn from_unit_cell(
        element_types: Vec<ElementType>,
        mut unit_cell: Vec<UnitCellSite>,
        parameters: &LatticeParameters,
        size: SystemSize,
        periodicity: Periodicity,
    ) -> Result<Self, LatticeError> {
        if size.iter().any(|&n| n == 0) {
            return Err(LatticeError::InvalidSize { size });
        }
        if unit_cell.is_empty() {
            return Err(LatticeError::EmptyUnitCell);
        }
        if let Some(site) = unit_cell
            .iter()
            .find(|site| site.element_type >= element_types.len())
        {
            return Err(LatticeError::UnknownElementType(format!(
                "#{}",
                site.element_type
            )));
        }

        // Grouped by type, z-sorted within a type. The sort is stable so sites sharing a z
        // coordinate keep their declaration order.
        unit_cell.sort_by(|a, b| {
            a.element_type.cmp(&b.element_type).then(
                a.fractional
                    .z
                    .partial_cmp(&b.fractional.z)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        let mut n_elements = vec![0usize; element_types.len()];
        for site in &unit_cell {
            n_elements[site.element_type] += 1;
        }
        let type_offsets = n_elements
            .iter()
            .scan(0usize, |acc, &n| {
                let offset = *acc;
                *acc += n;
                Some(offset)
            })
            .collect::<Vec<_>>();

        let basis = lattice_basis(parameters)?;
        let inverse_basis = basis.try_inverse().ok_or_else(|| {
            LatticeError::InvalidLatticeParameters("lattice vectors are linearly dependent".into())
        })?;

        let mut model = Self {
            element_types,
            unit_cell,
            n_elements,
            type_offsets,
            basis,
            inverse_basis,
            size,
            periodicity,
            sites: Vec::new(),
        };
        model.sites = model.generate_sites();
        Ok(model)
    }

    fn generate_sites(&self) -> Vec<Site> {
        let per_cell = self.unit_cell.len();
        let mut sites = Vec::with_capacity(self.num_cells() * per_cell);
        for (x, y, z) in iproduct!(0..self.size[0], 0..self.size[1], 0..self.size[2]) {
            let mut element_counter = vec![0usize; self.element_types.len()];
            for site in &self.unit_cell {
                let element = element_counter[site.element_type];
                element_counter[site.element_type] += 1;
                let cell = Vector3::new(x as f64, y as f64, z as f64);
                sites.push(Site {
                    sei: sites.len(),
                    quantum_index: QuantumIndex::new([x, y, z], site.element_type, element),
                    position: Point3::from(self.basis * (site.fractional + cell)),
                });
            }
        }
        sites
    }

    /// Maps a quantum index to its system element index in O(1).
    pub fn quantum_index_to_sei(&self, index: &QuantumIndex) -> Result<usize, LatticeError> {
        let in_range = index.cell.iter().zip(self.size.iter()).all(|(c, n)| c < n)
            && index.element_type < self.n_elements.len()
            && index.element < self.n_elements[index.element_type];
        if !in_range {
            return Err(LatticeError::InvalidQuantumIndex { index: *index });
        }
        Ok(self.sei_unchecked(index.cell, index.element_type, index.element))
    }

    #[inline]
    fn sei_unchecked(&self, cell: [usize; 3], element_type: usize, element: usize) -> usize {
        let linear_cell = cell[2] + cell[1] * self.size[2] + cell[0] * self.size[1] * self.size[2];
        element + self.type_offsets[element_type] + self.elements_per_cell() * linear_cell
    }

    pub fn quantum_index(&self, sei: usize) -> Option<&QuantumIndex> {
        self.sites.get(sei).map(|site| &site.quantum_index)
    }

    /// Resolves the site reached from unit cell `cell` by `offset` cells.
    ///
    /// Periodic axes wrap around the supercell; on a non-periodic axis leaving the supercell
    /// yields `None`.
    pub fn translate(
        &self,
        cell: [usize; 3],
        offset: [i64; 3],
        element_type: usize,
        element: usize,
    ) -> Option<usize> {
        let mut target = [0usize; 3];
        for axis in 0..3 {
            let n = self.size[axis] as i64;
            let raw = cell[axis] as i64 + offset[axis];
            target[axis] = if self.periodicity.is_periodic(axis) {
                raw.rem_euclid(n) as usize
            } else if (0..n).contains(&raw) {
                raw as usize
            } else {
                return None;
            };
        }
        if element_type >= self.n_elements.len() || element >= self.n_elements[element_type] {
            return None;
        }
        Some(self.sei_unchecked(target, element_type, element))
    }

    /// Same as [`Self::translate`], starting from the unit cell of site `sei`.
    pub fn neighbor_site(
        &self,
        sei: usize,
        offset: [i64; 3],
        element_type: usize,
        element: usize,
    ) -> Option<usize> {
        let cell = self.sites.get(sei)?.quantum_index.cell;
        self.translate(cell, offset, element_type, element)
    }

    /// Fractional reach of a Cartesian distance: per axis, the largest number of unit cells a
    /// vector no longer than `distance` can span.
    pub fn cell_reach(&self, distance: f64) -> [f64; 3] {
        std::array::from_fn(|axis| self.inverse_basis.row(axis).norm() * distance)
    }

    /// Largest unit-cell offset, per axis, between two sites at most `distance` apart.
    pub fn max_cell_offset(&self, distance: f64) -> [usize; 3] {
        let reach = self.cell_reach(distance);
        std::array::from_fn(|axis| {
            let (low, high) = self
                .unit_cell
                .iter()
                .map(|site| site.fractional[axis])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), f| {
                    (lo.min(f), hi.max(f))
                });
            (reach[axis] + (high - low) + IMAGE_SLACK).floor() as usize
        })
    }

    /// Every periodic image of `displacement` that may lie within `distance`.
    ///
    /// Images are taken along periodic axes only. Each image comes with the cell shift, per
    /// axis, that was added to the raw displacement to produce it. Callers still filter by
    /// the exact distance.
    pub fn periodic_images(
        &self,
        displacement: &Vector3<f64>,
        distance: f64,
    ) -> Vec<(Vector3<f64>, [i64; 3])> {
        let fractional = self.inverse_basis * displacement;
        let reach = self.cell_reach(distance);
        let shifts: [Vec<i64>; 3] = std::array::from_fn(|axis| {
            if !self.periodicity.is_periodic(axis) {
                return vec![0];
            }
            let n = self.size[axis] as f64;
            let low = ((-reach[axis] - IMAGE_SLACK - fractional[axis]) / n).ceil() as i64;
            let high = ((reach[axis] + IMAGE_SLACK - fractional[axis]) / n).floor() as i64;
            (low..=high).map(|k| k * self.size[axis] as i64).collect()
        });
        iproduct!(&shifts[0], &shifts[1], &shifts[2])
            .map(|(&x, &y, &z)| {
                let image = fractional + Vector3::new(x as f64, y as f64, z as f64);
                (self.basis * image, [x, y, z])
            })
            .collect()
    }

    pub fn element_type_index(&self, name: &str) -> Result<usize, LatticeError> {
        self.element_types
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| LatticeError::UnknownElementType(name.to_string()))
    }

    /// Per-site charges of the bare lattice.
    pub fn base_charges(&self) -> ChargeConfig {
        ChargeConfig::from(
            self.sites
                .iter()
                .map(|site| self.element_types[site.element_type()].base_charge)
                .collect::<Vec<_>>(),
        )
    }

    pub fn sites_of_type(&self, element_type: usize) -> impl Iterator<Item = &Site> + '_ {
        self.sites
            .iter()
            .filter(move |site| site.element_type() == element_type)
    }

    /// Preferred unit cell for neighbor-list centers: `(1, 1, 1)` clamped to the supercell.
    /// Shells move it inward along open axes when their cutoff needs more room.
    pub fn reference_cell(&self) -> [usize; 3] {
        [
            1.min(self.size[0] - 1),
            1.min(self.size[1] - 1),
            1.min(self.size[2] - 1),
        ]
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, sei: usize) -> Option<&Site> {
        self.sites.get(sei)
    }

    pub fn total_sites(&self) -> usize {
        self.sites.len()
    }

    pub fn element_types(&self) -> &[ElementType] {
        &self.element_types
    }

    pub fn n_elements(&self) -> &[usize] {
        &self.n_elements
    }

    pub fn elements_per_cell(&self) -> usize {
        self.unit_cell.len()
    }

    pub fn num_cells(&self) -> usize {
        self.size.iter().product()
    }

    pub fn size(&self) -> SystemSize {
        self.size
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Lattice vectors as matrix columns.
    pub fn basis(&self) -> &Matrix3<f64> {
        &self.basis
    }
}

/// Builds the lattice vectors (as columns) from the six lattice parameters.
///
/// `a` lies along x and `b` in the xy plane.
pub fn lattice_basis(p: &LatticeParameters) -> Result<Matrix3<f64>, LatticeError> {
    if p.a <= 0.0 || p.b <= 0.0 || p.c <= 0.0 {
        return Err(LatticeError::InvalidLatticeParameters(format!(
            "lattice constants must be positive (a = {}, b = {}, c = {})",
            p.a, p.b, p.c
        )));
    }
    let (alpha, beta, gamma) = (
        p.alpha.to_radians(),
        p.beta.to_radians(),
        p.gamma.to_radians(),
    );
    if gamma.sin().abs() < 1e-12 {
        return Err(LatticeError::InvalidLatticeParameters(format!(
            "gamma = {} degrees collapses a and b",
            p.gamma
        )));
    }
    let a = Vector3::new(p.a, 0.0, 0.0);
    let b = Vector3::new(p.b * gamma.cos(), p.b * gamma.sin(), 0.0);
    let cx = p.c * beta.cos();
    let cy = p.c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
    let cz_squared = p.c * p.c - cx * cx - cy * cy;
    if cz_squared <= 1e-12 {
        return Err(LatticeError::InvalidLatticeParameters(format!(
            "angles ({}, {}, {}) do not form a three-dimensional cell",
            p.alpha, p.beta, p.gamma
        )));
    }
    let c = Vector3::new(cx, cy, cz_squared.sqrt());
    Ok(Matrix3::from_columns(&[a, b, c]))
}
