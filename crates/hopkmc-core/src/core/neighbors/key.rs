use super::index::NeighborError;
use crate::core::models::lattice::LatticeModel;
use crate::core::models::material::ELECTROSTATIC_SHELL_KEY;
use std::fmt;

/// Identifies a family of neighbor shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShellKey {
    /// Neighbors of type `neighbor` around centers of type `center`.
    Pair { center: usize, neighbor: usize },
    /// Every site around every site, for electrostatic interactions.
    Electrostatic,
}

impl ShellKey {
    /// Parses `"A:B"` (with the given delimiter) or the electrostatic key `"E"`.
    pub fn parse(key: &str, delimiter: &str, lattice: &LatticeModel) -> Result<Self, NeighborError> {
        if key == ELECTROSTATIC_SHELL_KEY {
            return Ok(Self::Electrostatic);
        }
        let mut parts = key.split(delimiter);
        let (center, neighbor) = match (parts.next(), parts.next(), parts.next()) {
            (Some(center), Some(neighbor), None) if !center.is_empty() && !neighbor.is_empty() => {
                (center.trim(), neighbor.trim())
            }
            _ => return Err(NeighborError::UnknownElementType(key.to_string())),
        };
        let resolve = |name: &str| {
            lattice
                .element_type_index(name)
                .map_err(|_| NeighborError::UnknownElementType(name.to_string()))
        };
        Ok(Self::Pair {
            center: resolve(center)?,
            neighbor: resolve(neighbor)?,
        })
    }

    pub fn center_type(&self) -> Option<usize> {
        match self {
            Self::Pair { center, .. } => Some(*center),
            Self::Electrostatic => None,
        }
    }

    pub fn neighbor_type(&self) -> Option<usize> {
        match self {
            Self::Pair { neighbor, .. } => Some(*neighbor),
            Self::Electrostatic => None,
        }
    }

    pub fn is_electrostatic(&self) -> bool {
        matches!(self, Self::Electrostatic)
    }
}

impl fmt::Display for ShellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { center, neighbor } => write!(f, "{center}->{neighbor}"),
            Self::Electrostatic => write!(f, "{ELECTROSTATIC_SHELL_KEY}"),
        }
    }
}
