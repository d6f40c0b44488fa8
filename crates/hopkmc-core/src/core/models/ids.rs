use serde::{Deserialize, Serialize};
use std::fmt;

/// Supercell size in unit cells along each lattice vector.
pub type SystemSize = [usize; 3];

/// Identifies a lattice site by its unit cell and its position within the unit cell.
///
/// The element index counts sites of one element type inside a single unit cell, in the
/// z-sorted order established by the lattice model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuantumIndex {
    pub cell: [usize; 3],
    pub element_type: usize,
    pub element: usize,
}

impl QuantumIndex {
    pub fn new(cell: [usize; 3], element_type: usize, element: usize) -> Self {
        Self {
            cell,
            element_type,
            element,
        }
    }
}

impl fmt::Display for QuantumIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}]",
            self.cell[0], self.cell[1], self.cell[2], self.element_type, self.element
        )
    }
}

/// Per-axis periodic boundary flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Periodicity(pub [bool; 3]);

impl Periodicity {
    pub fn none() -> Self {
        Self([false; 3])
    }

    pub fn all() -> Self {
        Self([true; 3])
    }

    #[inline]
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.0[axis]
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|&p| p)
    }
}

impl From<bool> for Periodicity {
    fn from(pbc: bool) -> Self {
        Self([pbc; 3])
    }
}
