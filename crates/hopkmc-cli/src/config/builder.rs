use super::defaults::DefaultsConfig;
use super::file::{
    FileConfig, FileInitialOccupancy, FileMsdConfig, FilePeriodicity, FileSitePlacement,
    FileSystemConfig,
};
use super::models::{GeometryConfig, RunConfig};
use crate::cli::{InspectArgs, MsdArgs, RunArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use hopkmc::core::models::ids::{Periodicity, QuantumIndex, SystemSize};
use hopkmc::core::models::material::Material;
use hopkmc::engine::config as core_config;
use std::collections::BTreeMap;
use tracing::debug;

/// Command-line overrides of the `[msd]` section.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsdOverrides {
    pub n_steps: Option<usize>,
    pub n_disp: Option<usize>,
    pub bin_size: Option<f64>,
    pub time_scale: Option<f64>,
    pub distance_scale: Option<f64>,
}

impl From<&MsdArgs> for MsdOverrides {
    fn from(args: &MsdArgs) -> Self {
        Self {
            n_steps: args.n_steps,
            n_disp: args.n_disp,
            bin_size: args.bin_size,
            time_scale: args.time_scale,
            distance_scale: args.distance_scale,
        }
    }
}

pub fn build_run_config(args: &RunArgs, material: &Material) -> Result<RunConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_optional_file(args.config.as_deref())?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let geometry = merge_geometry(
        args.size.as_deref(),
        args.temperature,
        file_config.system.take().unwrap_or_default(),
        &defaults,
    )?;

    let kmc_file = file_config.kmc.take().unwrap_or_default();
    let coupling_correction = args.coupling_correction
        || kmc_file
            .coupling_correction
            .unwrap_or(defaults.coupling_correction);

    let electrostatics = if args.no_electrostatics {
        None
    } else {
        file_config
            .electrostatics
            .take()
            .map(|e| {
                e.dielectric_constant
                    .map(|dielectric_constant| core_config::ElectrostaticsConfig {
                        dielectric_constant,
                    })
                    .ok_or_else(|| {
                        CliError::Config(
                            "`electrostatics` requires `dielectric-constant`".to_string(),
                        )
                    })
            })
            .transpose()?
    };

    let initial_occupancy = merge_initial_occupancy(file_config.initial_occupancy.take(), material)?;

    let simulation = core_config::SimulationConfigBuilder::new()
        .system_size(geometry.system_size)
        .periodicity(geometry.periodicity)
        .temperature(geometry.temperature)
        .n_traj(args.n_traj.or(kmc_file.n_traj).unwrap_or(defaults.n_traj))
        .kmc_steps(
            args.kmc_steps
                .or(kmc_file.kmc_steps)
                .unwrap_or(defaults.kmc_steps),
        )
        .step_interval(
            args.step_interval
                .or(kmc_file.step_interval)
                .unwrap_or(defaults.step_interval),
        )
        .random_seed(args.seed.or(kmc_file.random_seed).unwrap_or(defaults.random_seed))
        .initial_occupancy(initial_occupancy)
        .electrostatics(electrostatics)
        .coupling_correction(coupling_correction)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let msd = match file_config.msd.take() {
        Some(section) => Some(merge_msd(MsdOverrides::default(), section, &defaults)?),
        None => None,
    };

    debug!(?simulation, ?msd, "Merged run configuration.");
    Ok(RunConfig { simulation, msd })
}

pub fn build_msd_config(args: &MsdArgs) -> Result<core_config::MsdConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_optional_file(args.config.as_deref())?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    merge_msd(
        MsdOverrides::from(args),
        file_config.msd.take().unwrap_or_default(),
        &defaults,
    )
}

pub fn build_geometry_config(args: &InspectArgs) -> Result<GeometryConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::from_optional_file(args.config.as_deref())?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    merge_geometry(
        args.size.as_deref(),
        args.temperature,
        file_config.system.take().unwrap_or_default(),
        &defaults,
    )
}

fn merge_geometry(
    cli_size: Option<&[usize]>,
    cli_temperature: Option<f64>,
    file_val: FileSystemConfig,
    defaults: &DefaultsConfig,
) -> Result<GeometryConfig> {
    let cli_size = cli_size
        .map(|size| {
            SystemSize::try_from(size).map_err(|_| {
                CliError::Argument(format!("--size expects three values, got {:?}", size))
            })
        })
        .transpose()?;
    let system_size = cli_size.or(file_val.size).ok_or_else(|| {
        CliError::Config(
            "`system.size` is required either in the config file or via --size.".to_string(),
        )
    })?;
    let periodicity = match file_val.periodic {
        Some(FilePeriodicity::All(flag)) => Periodicity::from(flag),
        Some(FilePeriodicity::PerAxis(flags)) => Periodicity(flags),
        None => Periodicity::from(defaults.periodic),
    };
    Ok(GeometryConfig {
        system_size,
        periodicity,
        temperature: cli_temperature
            .or(file_val.temperature)
            .unwrap_or(defaults.temperature),
    })
}

fn merge_initial_occupancy(
    file_val: Option<FileInitialOccupancy>,
    material: &Material,
) -> Result<core_config::InitialOccupancy> {
    match file_val {
        None => Err(CliError::Config(
            "`initial-occupancy` section is required.".to_string(),
        )),
        Some(FileInitialOccupancy::Random { counts }) => {
            Ok(core_config::InitialOccupancy::Random(counts))
        }
        Some(FileInitialOccupancy::Sites { sites }) => sites
            .into_iter()
            .map(|placement| {
                let site = resolve_site(&placement, material)?;
                Ok((placement.species, site))
            })
            .collect::<Result<Vec<_>>>()
            .map(core_config::InitialOccupancy::Sites),
    }
}

fn resolve_site(
    placement: &FileSitePlacement,
    material: &Material,
) -> Result<core_config::SiteSpec> {
    match (
        placement.sei,
        placement.cell,
        placement.element_type.as_deref(),
        placement.element,
    ) {
        (Some(sei), None, None, None) => Ok(core_config::SiteSpec::Sei(sei)),
        (None, Some(cell), Some(type_name), Some(element)) => {
            let element_type = material.element_type_index(type_name).ok_or_else(|| {
                CliError::Config(format!(
                    "Placement of '{}' names unknown element type '{}'",
                    placement.species, type_name
                ))
            })?;
            Ok(core_config::SiteSpec::Quantum(QuantumIndex::new(
                cell,
                element_type,
                element,
            )))
        }
        _ => Err(CliError::Config(format!(
            "Placement of '{}' needs either `sei` or all of `cell`, `element-type` and `element`",
            placement.species
        ))),
    }
}

fn merge_msd(
    cli: MsdOverrides,
    file_val: FileMsdConfig,
    defaults: &DefaultsConfig,
) -> Result<core_config::MsdConfig> {
    let mut builder = core_config::MsdConfigBuilder::new()
        .time_scale(
            cli.time_scale
                .or(file_val.time_scale)
                .unwrap_or(defaults.time_scale),
        )
        .distance_scale(
            cli.distance_scale
                .or(file_val.distance_scale)
                .unwrap_or(defaults.distance_scale),
        );
    if let Some(n_steps) = cli.n_steps.or(file_val.n_steps) {
        builder = builder.n_steps(n_steps);
    }
    if let Some(n_disp) = cli.n_disp.or(file_val.n_disp) {
        builder = builder.n_disp(n_disp);
    }
    if let Some(bin_size) = cli.bin_size.or(file_val.bin_size) {
        builder = builder.bin_size(bin_size);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        apply_set_value(&mut config, kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
    }
    Ok(config)
}

fn apply_set_value(config: &mut FileConfig, kv_pair: &str) -> std::result::Result<(), SetError> {
    let (key, value) = parser::parse_key_value(kv_pair)?;

    if let Some(species) = key.strip_prefix("initial-occupancy.counts.") {
        let count = parser::parse_value(key, value)?;
        match config
            .initial_occupancy
            .get_or_insert_with(|| FileInitialOccupancy::Random {
                counts: BTreeMap::new(),
            }) {
            FileInitialOccupancy::Random { counts } => {
                counts.insert(species.to_string(), count);
                return Ok(());
            }
            FileInitialOccupancy::Sites { .. } => {
                return Err(SetError::Conflict(
                    "cannot set random counts on an explicit site occupancy".to_string(),
                ));
            }
        }
    }

    match key {
        "system.size" => {
            config.system.get_or_insert_with(Default::default).size = Some(parser::parse_triplet(key, value)?);
        }
        "system.periodic" => {
            let periodicity = parser::parse_periodicity(key, value)?;
            config.system.get_or_insert_with(Default::default).periodic =
                Some(FilePeriodicity::PerAxis(periodicity.0));
        }
        "system.temperature" => {
            config.system.get_or_insert_with(Default::default).temperature =
                Some(parser::parse_value(key, value)?);
        }
        "kmc.n-traj" => {
            config.kmc.get_or_insert_with(Default::default).n_traj =
                Some(parser::parse_value(key, value)?);
        }
        "kmc.kmc-steps" => {
            config.kmc.get_or_insert_with(Default::default).kmc_steps =
                Some(parser::parse_value(key, value)?);
        }
        "kmc.step-interval" => {
            config.kmc.get_or_insert_with(Default::default).step_interval =
                Some(parser::parse_value(key, value)?);
        }
        "kmc.random-seed" => {
            config.kmc.get_or_insert_with(Default::default).random_seed =
                Some(parser::parse_value(key, value)?);
        }
        "kmc.coupling-correction" => {
            config
                .kmc
                .get_or_insert_with(Default::default)
                .coupling_correction = Some(parser::parse_value(key, value)?);
        }
        "electrostatics.dielectric-constant" => {
            config
                .electrostatics
                .get_or_insert_with(Default::default)
                .dielectric_constant = Some(parser::parse_value(key, value)?);
        }
        "msd.n-steps" => {
            config.msd.get_or_insert_with(Default::default).n_steps =
                Some(parser::parse_value(key, value)?);
        }
        "msd.n-disp" => {
            config.msd.get_or_insert_with(Default::default).n_disp =
                Some(parser::parse_value(key, value)?);
        }
        "msd.bin-size" => {
            config.msd.get_or_insert_with(Default::default).bin_size =
                Some(parser::parse_value(key, value)?);
        }
        "msd.time-scale" => {
            config.msd.get_or_insert_with(Default::default).time_scale =
                Some(parser::parse_value(key, value)?);
        }
        "msd.distance-scale" => {
            config.msd.get_or_insert_with(Default::default).distance_scale =
                Some(parser::parse_value(key, value)?);
        }
        _ => return Err(SetError::UnsupportedKey(key.to_string())),
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum SetError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Unsupported configuration key for --set: '{0}'")]
    UnsupportedKey(String),
    #[error("Conflicting --set value: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_run_args(config: Option<PathBuf>) -> RunArgs {
        RunArgs {
            material: PathBuf::from("material.toml"),
            config,
            output: PathBuf::from("out"),
            size: None,
            temperature: None,
            n_traj: None,
            kmc_steps: None,
            step_interval: None,
            seed: None,
            coupling_correction: false,
            no_electrostatics: false,
            set_values: vec![],
        }
    }

    fn base_msd_args(config: Option<PathBuf>) -> MsdArgs {
        MsdArgs {
            input: PathBuf::from("out"),
            output: PathBuf::from("msd.csv"),
            config,
            n_steps: None,
            n_disp: None,
            bin_size: None,
            time_scale: None,
            distance_scale: None,
            set_values: vec![],
        }
    }

    fn write_config(dir: &std::path::Path, content: &str) -> PathBuf {
        let path = dir.join("simulation.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn file_values_fill_in_and_defaults_cover_the_rest() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[system]
size = [2, 1, 1]
periodic = true

[kmc]
kmc-steps = 500
step-interval = 50

[initial-occupancy]
type = "random"
counts = { electron = 1 }
"#,
        );
        let material = fixtures::dimer_material();

        let config = build_run_config(&base_run_args(Some(path)), &material).unwrap();
        let sim = config.simulation;
        let defaults = DefaultsConfig::default();

        assert_eq!(sim.system_size, [2, 1, 1]);
        assert_eq!(sim.periodicity, Periodicity::all());
        assert_eq!(sim.temperature, defaults.temperature);
        assert_eq!(sim.n_traj, defaults.n_traj);
        assert_eq!(sim.kmc_steps, 500);
        assert_eq!(sim.step_interval, 50);
        assert_eq!(sim.random_seed, defaults.random_seed);
        assert!(sim.electrostatics.is_none());
        assert!(!sim.coupling_correction);
        assert!(config.msd.is_none());
    }

    #[test]
    fn cli_overrides_set_values_which_override_file() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[system]
size = [1, 1, 1]
temperature = 250.0

[kmc]
n-traj = 2
random-seed = 5

[initial-occupancy]
type = "random"
counts = { electron = 1 }

[electrostatics]
dielectric-constant = 10.0
"#,
        );
        let mut args = base_run_args(Some(path));
        args.set_values = vec![
            "kmc.n-traj=6".to_string(),
            "kmc.random-seed=9".to_string(),
            "system.temperature=400".to_string(),
        ];
        args.seed = Some(11);
        args.size = Some(vec![3, 2, 1]);
        args.no_electrostatics = true;

        let sim = build_run_config(&args, &fixtures::dimer_material())
            .unwrap()
            .simulation;
        assert_eq!(sim.n_traj, 6);
        assert_eq!(sim.random_seed, 11);
        assert_eq!(sim.temperature, 400.0);
        assert_eq!(sim.system_size, [3, 2, 1]);
        assert!(sim.electrostatics.is_none());
    }

    #[test]
    fn site_placements_resolve_by_sei_or_quantum_index() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[system]
size = [2, 1, 1]

[initial-occupancy]
type = "sites"
sites = [
    { species = "electron", sei = 1 },
    { species = "electron", cell = [1, 0, 0], element-type = "A", element = 1 },
]
"#,
        );
        let sim = build_run_config(&base_run_args(Some(path)), &fixtures::dimer_material())
            .unwrap()
            .simulation;
        assert_eq!(
            sim.initial_occupancy,
            core_config::InitialOccupancy::Sites(vec![
                ("electron".to_string(), core_config::SiteSpec::Sei(1)),
                (
                    "electron".to_string(),
                    core_config::SiteSpec::Quantum(QuantumIndex::new([1, 0, 0], 0, 1))
                ),
            ])
        );
    }

    #[test]
    fn incomplete_or_unknown_placements_are_rejected() {
        let material = fixtures::dimer_material();
        let partial = FileSitePlacement {
            species: "electron".to_string(),
            sei: None,
            cell: Some([0, 0, 0]),
            element_type: None,
            element: Some(0),
        };
        assert!(matches!(
            resolve_site(&partial, &material),
            Err(CliError::Config(_))
        ));

        let unknown = FileSitePlacement {
            element_type: Some("Zz".to_string()),
            ..partial
        };
        assert!(matches!(
            resolve_site(&unknown, &material),
            Err(CliError::Config(msg)) if msg.contains("Zz")
        ));
    }

    #[test]
    fn missing_size_and_occupancy_are_config_errors() {
        let material = fixtures::dimer_material();
        let no_size = build_run_config(&base_run_args(None), &material);
        assert!(matches!(no_size, Err(CliError::Config(msg)) if msg.contains("system.size")));

        let mut args = base_run_args(None);
        args.size = Some(vec![1, 1, 1]);
        let no_occupancy = build_run_config(&args, &material);
        assert!(
            matches!(no_occupancy, Err(CliError::Config(msg)) if msg.contains("initial-occupancy"))
        );
    }

    #[test]
    fn random_counts_can_be_set_from_the_command_line() {
        let mut args = base_run_args(None);
        args.size = Some(vec![1, 1, 1]);
        args.set_values = vec!["initial-occupancy.counts.electron=1".to_string()];
        let sim = build_run_config(&args, &fixtures::dimer_material())
            .unwrap()
            .simulation;
        assert_eq!(
            sim.initial_occupancy,
            core_config::InitialOccupancy::Random(BTreeMap::from([("electron".to_string(), 1)]))
        );
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["kmc.n-traj", "kmc.n-traj=abc", "system.size=1,2", "nope.key=1"] {
            let result = apply_set_values(FileConfig::default(), &[bad.to_string()]);
            assert!(matches!(result, Err(CliError::Config(_))), "accepted '{bad}'");
        }
    }

    #[test]
    fn core_validation_errors_surface_as_config_errors() {
        let mut args = base_run_args(None);
        args.size = Some(vec![1, 1, 1]);
        args.kmc_steps = Some(10);
        args.step_interval = Some(20);
        args.set_values = vec!["initial-occupancy.counts.electron=1".to_string()];
        assert!(matches!(
            build_run_config(&args, &fixtures::dimer_material()),
            Err(CliError::Config(msg)) if msg.contains("step_interval")
        ));
    }

    #[test]
    fn msd_section_merges_with_cli_overrides() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[msd]\nn-steps = 10\nn-disp = 20\nbin-size = 0.5\ntime-scale = 1e9\n",
        );
        let mut args = base_msd_args(Some(path));
        args.n_disp = Some(4);
        args.set_values = vec!["msd.distance-scale=0.1".to_string()];

        let msd = build_msd_config(&args).unwrap();
        assert_eq!(msd.n_steps, 10);
        assert_eq!(msd.n_disp, 4);
        assert_eq!(msd.bin_size, 0.5);
        assert_eq!(msd.time_scale, 1e9);
        assert_eq!(msd.distance_scale, 0.1);
    }

    #[test]
    fn msd_without_bin_size_fails() {
        let mut args = base_msd_args(None);
        args.n_steps = Some(3);
        args.n_disp = Some(3);
        assert!(matches!(
            build_msd_config(&args),
            Err(CliError::Config(msg)) if msg.contains("bin_size")
        ));
    }

    #[test]
    fn geometry_uses_defaults_for_periodicity_and_temperature() {
        let args = InspectArgs {
            material: PathBuf::from("material.toml"),
            config: None,
            size: Some(vec![2, 2, 2]),
            temperature: None,
            set_values: vec!["system.periodic=true,false,true".to_string()],
        };
        let geometry = build_geometry_config(&args).unwrap();
        assert_eq!(geometry.system_size, [2, 2, 2]);
        assert_eq!(geometry.periodicity, Periodicity([true, false, true]));
        assert_eq!(geometry.temperature, DefaultsConfig::default().temperature);
    }
}
