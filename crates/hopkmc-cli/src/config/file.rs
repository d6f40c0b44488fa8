use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Periodic boundaries given as one flag for all axes or one flag per axis.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum FilePeriodicity {
    All(bool),
    PerAxis([bool; 3]),
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSystemConfig {
    pub size: Option<[usize; 3]>,
    pub periodic: Option<FilePeriodicity>,
    pub temperature: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileKmcConfig {
    pub n_traj: Option<usize>,
    pub kmc_steps: Option<usize>,
    pub step_interval: Option<usize>,
    pub random_seed: Option<u64>,
    pub coupling_correction: Option<bool>,
}

/// One explicit carrier placement, by SEI or by quantum index.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSitePlacement {
    pub species: String,
    pub sei: Option<usize>,
    pub cell: Option<[usize; 3]>,
    pub element_type: Option<String>,
    pub element: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum FileInitialOccupancy {
    Sites { sites: Vec<FileSitePlacement> },
    Random { counts: BTreeMap<String, usize> },
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileElectrostaticsConfig {
    pub dielectric_constant: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMsdConfig {
    pub n_steps: Option<usize>,
    pub n_disp: Option<usize>,
    pub bin_size: Option<f64>,
    pub time_scale: Option<f64>,
    pub distance_scale: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub system: Option<FileSystemConfig>,
    pub kmc: Option<FileKmcConfig>,
    pub initial_occupancy: Option<FileInitialOccupancy>,
    pub electrostatics: Option<FileElectrostaticsConfig>,
    pub msd: Option<FileMsdConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_parses_with_kebab_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("simulation.toml");
        fs::write(
            &path,
            r#"
[system]
size = [4, 4, 2]
periodic = [true, true, false]
temperature = 450.0

[kmc]
n-traj = 8
kmc-steps = 10000
step-interval = 100
random-seed = 7
coupling-correction = true

[initial-occupancy]
type = "sites"
sites = [
    { species = "electron", sei = 3 },
    { species = "electron", cell = [1, 1, 0], element-type = "Fe", element = 2 },
]

[electrostatics]
dielectric-constant = 12.5

[msd]
n-steps = 20
n-disp = 30
bin-size = 1e-10
"#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let system = config.system.unwrap();
        assert_eq!(system.size, Some([4, 4, 2]));
        assert_eq!(
            system.periodic,
            Some(FilePeriodicity::PerAxis([true, true, false]))
        );
        assert_eq!(config.kmc.unwrap().coupling_correction, Some(true));
        match config.initial_occupancy.unwrap() {
            FileInitialOccupancy::Sites { sites } => {
                assert_eq!(sites.len(), 2);
                assert_eq!(sites[0].sei, Some(3));
                assert_eq!(sites[1].element_type.as_deref(), Some("Fe"));
            }
            other => panic!("unexpected occupancy {other:?}"),
        }
        assert_eq!(
            config.electrostatics.unwrap().dielectric_constant,
            Some(12.5)
        );
        assert_eq!(config.msd.unwrap().bin_size, Some(1e-10));
    }

    #[test]
    fn random_occupancy_and_scalar_periodicity_parse() {
        let config: FileConfig = toml::from_str(
            r#"
[system]
periodic = true

[initial-occupancy]
type = "random"
counts = { electron = 2, hole = 1 }
"#,
        )
        .unwrap();
        assert_eq!(
            config.system.unwrap().periodic,
            Some(FilePeriodicity::All(true))
        );
        assert_eq!(
            config.initial_occupancy,
            Some(FileInitialOccupancy::Random {
                counts: BTreeMap::from([("electron".to_string(), 2), ("hole".to_string(), 1)])
            })
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[kmc]\nn-trajectories = 3\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("missing.toml")),
            Err(CliError::Io(_))
        ));
        assert!(FileConfig::from_optional_file(None).unwrap().kmc.is_none());
    }
}
