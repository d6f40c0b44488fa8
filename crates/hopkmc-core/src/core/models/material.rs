use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_ELEMENT_TYPE_DELIMITER: &str = ":";
pub const ELECTROSTATIC_SHELL_KEY: &str = "E";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElementTypeDef {
    pub name: String,
    /// Base lattice charge of every site of this type, in units of e.
    pub charge: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UnitCellSiteDef {
    pub element: String,
    /// Fractional coordinates with respect to the lattice vectors.
    pub position: [f64; 3],
}

/// Lattice constants in Ångström and inter-axial angles in degrees.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LatticeParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpeciesDef {
    pub name: String,
    /// Element types whose sites this species may occupy.
    pub elements: Vec<String>,
    /// Carrier charge in units of e, used by the electrostatic free-energy term.
    #[serde(default)]
    pub charge: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateClassParams {
    pub name: String,
    /// Reorganization energy in eV.
    pub lambda: f64,
    /// Electronic coupling matrix element in eV.
    pub vab: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HoppingChannel {
    /// Element-type pair key of the neighbor shells the carriers hop along, e.g. `Fe:Fe`.
    pub key: String,
    /// One rate class per cutoff of the matching neighbor key, in the same order.
    pub classes: Vec<RateClassParams>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct HoppingParams {
    /// Attempt frequency for nuclear motion, in 1/s.
    pub attempt_frequency: f64,
    pub channels: Vec<HoppingChannel>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NeighborParams {
    pub tolerance: f64,
    /// Cutoff distances per shell key, in Ångström.
    pub cutoffs: BTreeMap<String, Vec<f64>>,
}

/// Complete description of a material: its unit cell and everything the hopping model
/// needs to know about it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Material {
    pub name: String,
    #[serde(default = "default_delimiter")]
    pub element_type_delimiter: String,
    pub element_types: Vec<ElementTypeDef>,
    pub unit_cell: Vec<UnitCellSiteDef>,
    pub lattice: LatticeParameters,
    pub species: Vec<SpeciesDef>,
    pub neighbors: NeighborParams,
    pub hopping: HoppingParams,
    /// Charge overrides for neighbor sites of occupied centers, one value per shell.
    #[serde(default)]
    pub shell_charges: BTreeMap<String, Vec<f64>>,
}

fn default_delimiter() -> String {
    DEFAULT_ELEMENT_TYPE_DELIMITER.to_string()
}

#[derive(Debug, Error, PartialEq)]
pub enum MaterialError {
    #[error("Material defines no element types")]
    NoElementTypes,
    #[error("Duplicate element type '{0}'")]
    DuplicateElementType(String),
    #[error("Unit cell has no sites")]
    EmptyUnitCell,
    #[error("'{context}' references undefined element type '{name}'")]
    UnknownElementType { context: String, name: String },
    #[error("Duplicate species '{0}'")]
    DuplicateSpecies(String),
    #[error("Hopping channel '{key}' has {classes} rate classes but {shells} cutoff shells")]
    ClassShellMismatch {
        key: String,
        classes: usize,
        shells: usize,
    },
    #[error("Hopping channel '{0}' has no matching neighbor cutoffs")]
    MissingCutoffs(String),
    #[error("Shell charges '{key}' list {charges} values but only {shells} cutoff shells exist")]
    ShellChargeMismatch {
        key: String,
        charges: usize,
        shells: usize,
    },
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid material definition in '{path}': {source}")]
    Invalid { path: String, source: MaterialError },
}

impl Material {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let material: Material = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        material.validate().map_err(|e| ParamLoadError::Invalid {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(material)
    }

    pub fn element_type_index(&self, name: &str) -> Option<usize> {
        self.element_types.iter().position(|e| e.name == name)
    }

    pub fn species(&self, name: &str) -> Option<&SpeciesDef> {
        self.species.iter().find(|s| s.name == name)
    }

    /// Checks cross references between the tables of the definition.
    ///
    /// Element names inside shell keys are resolved later, when the neighbor index is built
    /// against a concrete lattice.
    pub fn validate(&self) -> Result<(), MaterialError> {
        if self.element_types.is_empty() {
            return Err(MaterialError::NoElementTypes);
        }
        let mut seen = HashSet::new();
        for element in &self.element_types {
            if !seen.insert(element.name.as_str()) {
                return Err(MaterialError::DuplicateElementType(element.name.clone()));
            }
        }
        if self.unit_cell.is_empty() {
            return Err(MaterialError::EmptyUnitCell);
        }
        for site in &self.unit_cell {
            if self.element_type_index(&site.element).is_none() {
                return Err(MaterialError::UnknownElementType {
                    context: "unit-cell".to_string(),
                    name: site.element.clone(),
                });
            }
        }

        let mut seen_species = HashSet::new();
        for species in &self.species {
            if !seen_species.insert(species.name.as_str()) {
                return Err(MaterialError::DuplicateSpecies(species.name.clone()));
            }
            for element in &species.elements {
                if self.element_type_index(element).is_none() {
                    return Err(MaterialError::UnknownElementType {
                        context: format!("species.{}", species.name),
                        name: element.clone(),
                    });
                }
            }
        }

        if self.neighbors.tolerance < 0.0 {
            return Err(MaterialError::InvalidValue {
                field: "neighbors.tolerance",
                value: self.neighbors.tolerance,
            });
        }
        if self.hopping.attempt_frequency <= 0.0 {
            return Err(MaterialError::InvalidValue {
                field: "hopping.attempt-frequency",
                value: self.hopping.attempt_frequency,
            });
        }

        for channel in &self.hopping.channels {
            let shells = self
                .neighbors
                .cutoffs
                .get(&channel.key)
                .ok_or_else(|| MaterialError::MissingCutoffs(channel.key.clone()))?
                .len();
            if shells != channel.classes.len() {
                return Err(MaterialError::ClassShellMismatch {
                    key: channel.key.clone(),
                    classes: channel.classes.len(),
                    shells,
                });
            }
            for class in &channel.classes {
                if class.lambda <= 0.0 {
                    return Err(MaterialError::InvalidValue {
                        field: "hopping.channels.classes.lambda",
                        value: class.lambda,
                    });
                }
            }
        }

        for (key, charges) in &self.shell_charges {
            let shells = self
                .neighbors
                .cutoffs
                .get(key)
                .map_or(0, |cutoffs| cutoffs.len());
            if charges.len() > shells {
                return Err(MaterialError::ShellChargeMismatch {
                    key: key.clone(),
                    charges: charges.len(),
                    shells,
                });
            }
        }
        Ok(())
    }
}
